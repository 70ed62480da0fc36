//! Randomized operation simulator for the map manager.
//!
//! Drives a manager with a seeded stream of valid and invalid operations and
//! checks the engine invariants after every step: at most one active map,
//! every waypoint resolves to an existing map, the current map id resolves,
//! and the viewport zoom stays within bounds.

use crate::config::ManagerConfig;
use crate::error::ManagerError;
use crate::manager::MapManager;
use crate::state_machine::MapMode;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use waymark_core::{
    MapId, MapPatch, MapStore, NewMap, NewWaypoint, Viewport, ViewportPoint, WaypointId,
    MAX_ZOOM, MIN_ZOOM,
};

/// Simulator configuration.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility.
    pub seed: u64,
    /// Total operations to execute.
    pub total_operations: u64,
    /// Fraction of deliberately invalid operations.
    pub invalid_ops: f64,
    /// Stop on the first violation instead of collecting all of them.
    pub stop_on_first_violation: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            total_operations: 10_000,
            invalid_ops: 0.15,
            stop_on_first_violation: true,
        }
    }
}

/// All operations the simulator can generate.
#[derive(Debug, Clone)]
pub enum SimulatedOperation {
    // Map operations
    CreateMap(String),
    LoadMap(MapId),
    LoadUnknownMap,
    RenameMap(MapId, String),
    DeleteMap(MapId),

    // Waypoint operations
    CreateWaypoint(MapId, f64, f64),
    CreateOrphanWaypoint,
    DragWaypoint(WaypointId, f64, f64),
    DeleteWaypoint(WaypointId),

    // Mode transitions
    StartMapping,
    StopMapping,
    SaveMapping(String),

    // Viewport operations
    ZoomIn,
    ZoomOut,
    ResetView,
}

impl SimulatedOperation {
    fn type_name(&self) -> &'static str {
        match self {
            Self::CreateMap(_) => "CreateMap",
            Self::LoadMap(_) => "LoadMap",
            Self::LoadUnknownMap => "LoadUnknownMap",
            Self::RenameMap(..) => "RenameMap",
            Self::DeleteMap(_) => "DeleteMap",
            Self::CreateWaypoint(..) => "CreateWaypoint",
            Self::CreateOrphanWaypoint => "CreateOrphanWaypoint",
            Self::DragWaypoint(..) => "DragWaypoint",
            Self::DeleteWaypoint(_) => "DeleteWaypoint",
            Self::StartMapping => "StartMapping",
            Self::StopMapping => "StopMapping",
            Self::SaveMapping(_) => "SaveMapping",
            Self::ZoomIn => "ZoomIn",
            Self::ZoomOut => "ZoomOut",
            Self::ResetView => "ResetView",
        }
    }
}

/// Expected result classification for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedResult {
    ShouldSucceed,
    ShouldFail,
}

/// A violation detected during simulation.
#[derive(Debug, Clone)]
pub enum Violation {
    /// Operation outcome didn't match the classification.
    UnexpectedOutcome {
        operation_index: u64,
        operation: SimulatedOperation,
        expected: ExpectedResult,
        actual: Result<String, String>,
    },
    /// Engine invariant was violated.
    Invariant(InvariantViolation),
}

#[derive(Debug, Clone)]
pub struct InvariantViolation {
    pub check: InvariantCheck,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantCheck {
    AtMostOneActiveMap,
    WaypointsReferenceExistingMaps,
    CurrentMapResolves,
    ZoomWithinBounds,
}

/// Statistics collected during simulation.
#[derive(Debug, Clone, Default)]
pub struct OperationStats {
    pub total_operations: u64,
    pub successful_operations: u64,
    pub failed_operations: u64,
    pub operations_by_type: HashMap<&'static str, u64>,
}

impl OperationStats {
    fn record(&mut self, operation: &SimulatedOperation, result: &Result<String, String>) {
        self.total_operations += 1;
        *self
            .operations_by_type
            .entry(operation.type_name())
            .or_insert(0) += 1;
        match result {
            Ok(_) => self.successful_operations += 1,
            Err(_) => self.failed_operations += 1,
        }
    }
}

/// Final report from the simulator.
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    pub config: SimulatorConfig,
    pub stats: OperationStats,
    pub violations: Vec<Violation>,
    pub final_map_count: usize,
    pub final_waypoint_count: usize,
}

impl SimulatorReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Waymark Simulator Report ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.config.seed));
        report.push_str(&format!("Total Operations: {}\n", self.stats.total_operations));
        report.push_str(&format!("Successful: {}\n", self.stats.successful_operations));
        report.push_str(&format!("Failed: {}\n", self.stats.failed_operations));
        report.push_str(&format!("Violations: {}\n", self.violations.len()));
        report.push_str(&format!("Final Maps: {}\n", self.final_map_count));
        report.push_str(&format!("Final Waypoints: {}\n", self.final_waypoint_count));

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                report.push_str(&format!("{}. {:?}\n", i + 1, v));
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));

        report
    }
}

/// Run the simulator. Transitions use zero-latency config and the simulator
/// awaits completion after each one, so expectations are deterministic.
pub async fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let store = Arc::new(MapStore::with_sample_data());
    let manager = MapManager::new(store, ManagerConfig::immediate());
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut stats = OperationStats::default();
    let mut violations = Vec::new();
    let mut viewport = Viewport::new();

    // Tracked entity ids, kept in sync with the store.
    let mut maps: Vec<MapId> = manager.store().list_maps(true).iter().map(|m| m.id).collect();
    let mut waypoints: Vec<WaypointId> = manager
        .store()
        .list_waypoints(None)
        .iter()
        .map(|wp| wp.id)
        .collect();

    for i in 0..config.total_operations {
        let operation = generate_operation(&mut rng, &config, &maps, &waypoints);
        let mode = manager.status().state;
        let expected = classify_expected(&operation, mode);

        let actual = execute_operation(
            &manager,
            &operation,
            &mut viewport,
            &mut maps,
            &mut waypoints,
        );
        // Settle any two-phase transition before classifying further steps.
        manager.wait_idle().await;

        let outcome_matches = matches!(
            (expected, &actual),
            (ExpectedResult::ShouldSucceed, Ok(_)) | (ExpectedResult::ShouldFail, Err(_))
        );
        if !outcome_matches {
            violations.push(Violation::UnexpectedOutcome {
                operation_index: i,
                operation: operation.clone(),
                expected,
                actual: actual.clone(),
            });
            if config.stop_on_first_violation {
                break;
            }
        }

        for violation in check_invariants(&manager, &viewport) {
            violations.push(Violation::Invariant(violation));
            if config.stop_on_first_violation {
                break;
            }
        }
        if config.stop_on_first_violation && !violations.is_empty() {
            break;
        }

        stats.record(&operation, &actual);
    }

    let final_map_count = manager.store().list_maps(true).len();
    let final_waypoint_count = manager.store().list_waypoints(None).len();
    SimulatorReport {
        config,
        stats,
        violations,
        final_map_count,
        final_waypoint_count,
    }
}

fn generate_operation(
    rng: &mut StdRng,
    config: &SimulatorConfig,
    maps: &[MapId],
    waypoints: &[WaypointId],
) -> SimulatedOperation {
    if rng.gen::<f64>() < config.invalid_ops {
        return match rng.gen_range(0..3) {
            0 => SimulatedOperation::LoadUnknownMap,
            1 => SimulatedOperation::CreateOrphanWaypoint,
            // A transition that may or may not be legal in the current mode.
            _ => {
                if rng.gen_bool(0.5) {
                    SimulatedOperation::StartMapping
                } else {
                    SimulatedOperation::StopMapping
                }
            }
        };
    }

    let pick_map = |rng: &mut StdRng| maps[rng.gen_range(0..maps.len())];
    let pick_waypoint = |rng: &mut StdRng| waypoints[rng.gen_range(0..waypoints.len())];

    match rng.gen_range(0..10) {
        0 => SimulatedOperation::CreateMap(format!("Survey {}", rng.gen_range(0..1000))),
        1 if !maps.is_empty() => SimulatedOperation::LoadMap(pick_map(rng)),
        2 if !maps.is_empty() => SimulatedOperation::RenameMap(
            pick_map(rng),
            format!("Renamed {}", rng.gen_range(0..1000)),
        ),
        3 if maps.len() > 1 => SimulatedOperation::DeleteMap(pick_map(rng)),
        4 if !maps.is_empty() => SimulatedOperation::CreateWaypoint(
            pick_map(rng),
            rng.gen_range(-500.0..500.0),
            rng.gen_range(-500.0..500.0),
        ),
        5 if !waypoints.is_empty() => SimulatedOperation::DragWaypoint(
            pick_waypoint(rng),
            rng.gen_range(-500.0..500.0),
            rng.gen_range(-500.0..500.0),
        ),
        6 if !waypoints.is_empty() => SimulatedOperation::DeleteWaypoint(pick_waypoint(rng)),
        7 => match rng.gen_range(0..3) {
            0 => SimulatedOperation::StartMapping,
            1 => SimulatedOperation::StopMapping,
            _ => SimulatedOperation::SaveMapping(format!("Recorded {}", rng.gen_range(0..1000))),
        },
        8 => {
            if rng.gen_bool(0.5) {
                SimulatedOperation::ZoomIn
            } else {
                SimulatedOperation::ZoomOut
            }
        }
        _ => SimulatedOperation::ResetView,
    }
}

/// Classify the expected outcome given the settled mode. Transitions are
/// zero-latency and awaited, so the mode alone determines legality.
fn classify_expected(operation: &SimulatedOperation, mode: MapMode) -> ExpectedResult {
    use ExpectedResult::*;
    let active = mode == MapMode::Active;
    match operation {
        SimulatedOperation::CreateMap(_)
        | SimulatedOperation::ZoomIn
        | SimulatedOperation::ZoomOut
        | SimulatedOperation::ResetView => ShouldSucceed,

        SimulatedOperation::LoadUnknownMap | SimulatedOperation::CreateOrphanWaypoint => ShouldFail,

        SimulatedOperation::LoadMap(_)
        | SimulatedOperation::RenameMap(..)
        | SimulatedOperation::DeleteMap(_)
        | SimulatedOperation::CreateWaypoint(..)
        | SimulatedOperation::DragWaypoint(..)
        | SimulatedOperation::DeleteWaypoint(_)
        | SimulatedOperation::StartMapping => {
            if active {
                ShouldSucceed
            } else {
                ShouldFail
            }
        }

        SimulatedOperation::StopMapping | SimulatedOperation::SaveMapping(_) => {
            if active {
                ShouldFail
            } else {
                ShouldSucceed
            }
        }
    }
}

fn execute_operation(
    manager: &MapManager,
    operation: &SimulatedOperation,
    viewport: &mut Viewport,
    maps: &mut Vec<MapId>,
    waypoints: &mut Vec<WaypointId>,
) -> Result<String, String> {
    let describe = |e: &ManagerError| e.to_string();
    match operation {
        SimulatedOperation::CreateMap(label) => manager
            .create_map(NewMap::from_label(label.clone()))
            .map(|m| {
                maps.push(m.id);
                format!("map {}", m.id)
            })
            .map_err(|e| describe(&e)),
        SimulatedOperation::LoadMap(id) => manager
            .load_map(*id)
            .map(|m| format!("loaded {}", m.id))
            .map_err(|e| describe(&e)),
        SimulatedOperation::LoadUnknownMap => manager
            .load_map(MapId::new())
            .map(|m| format!("loaded {}", m.id))
            .map_err(|e| describe(&e)),
        SimulatedOperation::RenameMap(id, label) => manager
            .update_map(
                *id,
                MapPatch {
                    label: Some(label.clone()),
                    ..MapPatch::default()
                },
            )
            .map(|m| format!("renamed {}", m.id))
            .map_err(|e| describe(&e)),
        SimulatedOperation::DeleteMap(id) => match manager.delete_map(*id) {
            Ok(existed) => {
                if existed {
                    maps.retain(|m| m != id);
                    // Cascade: drop tracked waypoints that no longer resolve.
                    let remaining = manager.store().list_waypoints(None);
                    waypoints.retain(|wp| remaining.iter().any(|r| r.id == *wp));
                }
                Ok(format!("deleted={existed}"))
            }
            Err(e) => Err(describe(&e)),
        },
        SimulatedOperation::CreateWaypoint(map_id, x, y) => manager
            .create_waypoint(NewWaypoint {
                name: "Simulated".to_string(),
                map_id: *map_id,
                x: *x,
                y: *y,
                frame_id: String::new(),
                tags: Vec::new(),
            })
            .map(|wp| {
                waypoints.push(wp.id);
                format!("waypoint {}", wp.id)
            })
            .map_err(|e| describe(&e)),
        SimulatedOperation::CreateOrphanWaypoint => manager
            .create_waypoint(NewWaypoint {
                name: "Orphan".to_string(),
                map_id: MapId::new(),
                x: 0.0,
                y: 0.0,
                frame_id: String::new(),
                tags: Vec::new(),
            })
            .map(|wp| format!("waypoint {}", wp.id))
            .map_err(|e| describe(&e)),
        SimulatedOperation::DragWaypoint(id, px, py) => manager
            .drag_waypoint(*id, viewport, ViewportPoint::new(*px, *py))
            .map(|wp| format!("dragged {}", wp.id))
            .map_err(|e| describe(&e)),
        SimulatedOperation::DeleteWaypoint(id) => match manager.delete_waypoint(*id) {
            Ok(existed) => {
                if existed {
                    waypoints.retain(|wp| wp != id);
                }
                Ok(format!("deleted={existed}"))
            }
            Err(e) => Err(describe(&e)),
        },
        SimulatedOperation::StartMapping => manager
            .start_mapping()
            .map(|r| format!("{} -> {}", r.from, r.to))
            .map_err(|e| describe(&e)),
        SimulatedOperation::StopMapping => manager
            .stop_mapping()
            .map(|r| format!("{} -> {}", r.from, r.to))
            .map_err(|e| describe(&e)),
        SimulatedOperation::SaveMapping(name) => match manager.save_mapping(name) {
            Ok(receipt) => {
                maps.push(receipt.map.id);
                Ok(format!("saved {}", receipt.map.id))
            }
            Err(e) => Err(describe(&e)),
        },
        SimulatedOperation::ZoomIn => Ok(format!("zoom {}", viewport.zoom_in())),
        SimulatedOperation::ZoomOut => Ok(format!("zoom {}", viewport.zoom_out())),
        SimulatedOperation::ResetView => {
            viewport.reset();
            Ok("reset".to_string())
        }
    }
}

fn check_invariants(manager: &MapManager, viewport: &Viewport) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let store = manager.store();

    let active: Vec<_> = store
        .list_maps(true)
        .into_iter()
        .filter(|m| m.is_active)
        .collect();
    if active.len() > 1 {
        violations.push(InvariantViolation {
            check: InvariantCheck::AtMostOneActiveMap,
            details: format!("{} maps active simultaneously", active.len()),
        });
    }

    for wp in store.list_waypoints(None) {
        if store.get_map(wp.map_id).is_err() {
            violations.push(InvariantViolation {
                check: InvariantCheck::WaypointsReferenceExistingMaps,
                details: format!("waypoint {} references missing map {}", wp.id, wp.map_id),
            });
        }
    }

    let status = manager.status();
    if !status.is_transitioning {
        if let Some(id) = status.current_map_id {
            if store.get_map(id).is_err() {
                violations.push(InvariantViolation {
                    check: InvariantCheck::CurrentMapResolves,
                    details: format!("currentMapId {id} does not resolve"),
                });
            }
        }
    }

    if !(MIN_ZOOM..=MAX_ZOOM).contains(&viewport.zoom()) {
        violations.push(InvariantViolation {
            check: InvariantCheck::ZoomWithinBounds,
            details: format!("zoom {} outside [{MIN_ZOOM}, {MAX_ZOOM}]", viewport.zoom()),
        });
    }

    violations
}
