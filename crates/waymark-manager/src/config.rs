use std::time::Duration;

/// Manager configuration.
///
/// The delays model the latency window of a start/stop/save operation
/// (300 ms mode toggle, 1 s save by default).
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub transition_delay: Duration,
    pub save_delay: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            transition_delay: Duration::from_millis(300),
            save_delay: Duration::from_millis(1000),
        }
    }
}

impl ManagerConfig {
    /// Zero-latency configuration for tests and the simulator.
    pub fn immediate() -> Self {
        Self {
            transition_delay: Duration::ZERO,
            save_delay: Duration::ZERO,
        }
    }
}
