// Test harness module
// Randomized operation simulator for the map manager

pub mod simulator;

pub use simulator::*;

/// Harness for running the simulator across multiple seeds.
pub struct TestHarness;

impl TestHarness {
    /// Run the simulator over a range of seeds; passes only if every seed
    /// finishes without a violation.
    pub async fn run_seed_sweep(seeds: u64, operations: u64) -> SweepReport {
        let mut total_violations = 0;
        let mut all_passed = true;

        for seed in 0..seeds {
            let config = SimulatorConfig {
                seed,
                total_operations: operations,
                ..Default::default()
            };
            let report = run_simulator(config).await;
            if !report.passed() {
                all_passed = false;
            }
            total_violations += report.violations.len();
        }

        SweepReport {
            passed: all_passed && total_violations == 0,
            total_violations,
            seeds_tested: seeds,
        }
    }
}

/// Report from a multi-seed sweep.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub passed: bool,
    pub total_violations: usize,
    pub seeds_tested: u64,
}
