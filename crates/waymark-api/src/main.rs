use clap::{value_parser, Arg, ArgAction, Command};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use waymark_api::{MapFacade, Method};
use waymark_core::MapStore;
use waymark_manager::test_harness::TestHarness;
use waymark_manager::{run_simulator, ManagerConfig, MapManager, SimulatorConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Command::new("waymark")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Waymark map and waypoint state engine")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("simulate")
                .about("Run the randomized operation simulator")
                .arg(
                    Arg::new("ops")
                        .long("ops")
                        .default_value("10000")
                        .value_parser(value_parser!(u64))
                        .help("Number of operations to simulate"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Stop simulation on first violation"),
                ),
        )
        .subcommand(
            Command::new("sweep")
                .about("Run the simulator across a range of seeds")
                .arg(
                    Arg::new("seeds")
                        .long("seeds")
                        .default_value("20")
                        .value_parser(value_parser!(u64))
                        .help("Number of seeds to test"),
                )
                .arg(
                    Arg::new("ops")
                        .long("ops")
                        .default_value("2000")
                        .value_parser(value_parser!(u64))
                        .help("Operations per seed"),
                ),
        )
        .subcommand(Command::new("demo").about("Run a scripted session against sample data"));

    match cli.get_matches().subcommand() {
        Some(("simulate", args)) => {
            let ops = *args.get_one::<u64>("ops").unwrap();
            let seed = *args.get_one::<u64>("seed").unwrap();
            let stop_on_violation = args.get_flag("stop-on-violation");

            let config = SimulatorConfig {
                seed,
                total_operations: ops,
                stop_on_first_violation: stop_on_violation,
                ..Default::default()
            };

            let report = run_simulator(config).await;
            println!("{}", report.generate_text());
            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Some(("sweep", args)) => {
            let seeds = *args.get_one::<u64>("seeds").unwrap();
            let ops = *args.get_one::<u64>("ops").unwrap();

            let report = TestHarness::run_seed_sweep(seeds, ops).await;
            println!("Seed Sweep Report:");
            println!("  Seeds Tested: {}", report.seeds_tested);
            println!("  Total Violations: {}", report.total_violations);
            println!(
                "  Status: {}",
                if report.passed { "PASSED" } else { "FAILED" }
            );
            std::process::exit(if report.passed { 0 } else { 1 });
        }
        Some(("demo", _)) => run_demo().await,
        _ => Ok(()),
    }
}

/// A scripted session over the sample fixture: browse, load, edit, record.
async fn run_demo() -> anyhow::Result<()> {
    let store = Arc::new(MapStore::with_sample_data());
    let manager = Arc::new(MapManager::new(store, ManagerConfig::default()));
    let facade = MapFacade::new(Arc::clone(&manager));

    let print = |title: &str, resp: waymark_api::ApiResponse| {
        println!("--- {title} [{}]", resp.status);
        if let Some(body) = resp.body {
            println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
        }
    };

    print("GET /maps", facade.dispatch(Method::Get, "/maps", None));
    print("GET /status", facade.dispatch(Method::Get, "/status", None));

    let maps = manager.store().list_maps(false);
    let depot = maps.first().expect("sample data seeds a map");
    let wp = serde_json::json!({
        "name": "Charging Bay",
        "mapId": depot.id,
        "x": 12.5,
        "y": -4.0,
    });
    print(
        "POST /waypoints",
        facade.dispatch(Method::Post, "/waypoints", Some(&wp)),
    );

    print(
        "POST /mapping/start",
        facade.dispatch(Method::Post, "/mapping/start", None),
    );
    manager.wait_idle().await;

    let save = serde_json::json!({ "mapName": "Demo Survey" });
    print(
        "POST /mapping/save",
        facade.dispatch(Method::Post, "/mapping/save", Some(&save)),
    );
    manager.wait_idle().await;

    print("GET /status", facade.dispatch(Method::Get, "/status", None));
    print(
        "GET /maps?includeArchived=true",
        facade.dispatch(Method::Get, "/maps?includeArchived=true", None),
    );
    Ok(())
}
