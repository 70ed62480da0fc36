//! Waymark Manager - operational state machine and service object
//!
//! Owns the process-wide operational status (ACTIVE / MAPPING, current map,
//! transition flag), runs two-phase timed mode transitions, and gates the
//! entity store's mutation surface behind the ACTIVE mode.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use waymark_core::MapStore;
//! use waymark_manager::{ManagerConfig, MapManager};
//!
//! let store = Arc::new(MapStore::with_sample_data());
//! let manager = MapManager::new(store, ManagerConfig::default());
//! manager.start_mapping()?;
//! manager.wait_idle().await;
//! let receipt = manager.save_mapping("Depot North")?;
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod state_machine;
pub mod test_harness;

pub use config::ManagerConfig;
pub use error::ManagerError;
pub use manager::{MapManager, OperationalStatus, SaveReceipt, TransitionReceipt};
pub use state_machine::{allowed_transitions, validate_transition, MapMode};
pub use test_harness::{run_simulator, SimulatorConfig, SimulatorReport, TestHarness};
