use std::sync::Arc;
use std::time::Duration;
use waymark_core::{MapStore, NewMap, NewWaypoint, ViewportPoint, Viewport};
use waymark_manager::{ManagerConfig, ManagerError, MapManager, MapMode};

fn manager_with(store: MapStore) -> MapManager {
    MapManager::new(Arc::new(store), ManagerConfig::immediate())
}

fn slow_manager(store: MapStore) -> MapManager {
    MapManager::new(
        Arc::new(store),
        ManagerConfig {
            transition_delay: Duration::from_millis(50),
            save_delay: Duration::from_millis(50),
        },
    )
}

#[tokio::test(start_paused = true)]
async fn reentrant_transition_rejected_then_deterministic() {
    let manager = slow_manager(MapStore::new());

    manager.start_mapping().unwrap();
    // Phase 1 is synchronously observable.
    assert!(manager.status().is_transitioning);
    assert_eq!(manager.status().state, MapMode::Active);

    // A second transition during the latency window is rejected, not queued.
    assert_eq!(
        manager.stop_mapping().unwrap_err(),
        ManagerError::TransitionInProgress
    );
    assert_eq!(
        manager.start_mapping().unwrap_err(),
        ManagerError::TransitionInProgress
    );

    manager.wait_idle().await;
    assert_eq!(manager.status().state, MapMode::Mapping);
    assert!(!manager.status().is_transitioning);

    manager.stop_mapping().unwrap();
    manager.wait_idle().await;
    assert_eq!(manager.status().state, MapMode::Active);
}

#[tokio::test]
async fn transitions_validate_against_matrix() {
    let manager = manager_with(MapStore::new());

    // stop from ACTIVE is illegal.
    assert!(matches!(
        manager.stop_mapping().unwrap_err(),
        ManagerError::IllegalTransition { .. }
    ));

    manager.start_mapping().unwrap();
    manager.wait_idle().await;

    // start from MAPPING is illegal.
    assert!(matches!(
        manager.start_mapping().unwrap_err(),
        ManagerError::IllegalTransition { .. }
    ));
}

#[tokio::test]
async fn save_mapping_creates_and_activates_map() {
    let store = MapStore::new();
    let previous = store.create_map(NewMap::from_label("Old Depot")).unwrap();
    store.set_active(previous.id).unwrap();
    let manager = manager_with(store);
    assert_eq!(manager.status().current_map_id, Some(previous.id));

    // Legal only while MAPPING.
    assert!(manager.save_mapping("Depot North").is_err());

    manager.start_mapping().unwrap();
    manager.wait_idle().await;

    let receipt = manager.save_mapping("Depot North").unwrap();
    assert_eq!(receipt.map.name, "depot_north");
    assert_eq!(receipt.map.file_name, "depot_north.png");
    // The record exists before the transition completes.
    assert!(manager.store().get_map(receipt.map.id).is_ok());

    manager.wait_idle().await;
    let status = manager.status();
    assert_eq!(status.state, MapMode::Active);
    assert_eq!(status.current_map_id, Some(receipt.map.id));
    // The saved map superseded the previously active one.
    assert!(manager.store().get_map(receipt.map.id).unwrap().is_active);
    assert!(!manager.store().get_map(previous.id).unwrap().is_active);
}

#[tokio::test]
async fn save_mapping_with_blank_name_leaves_state_clean() {
    let manager = manager_with(MapStore::new());
    manager.start_mapping().unwrap();
    manager.wait_idle().await;

    assert!(matches!(
        manager.save_mapping("   ").unwrap_err(),
        ManagerError::Store(_)
    ));
    // Rejection must not leave a transition in flight.
    let status = manager.status();
    assert_eq!(status.state, MapMode::Mapping);
    assert!(!status.is_transitioning);
    assert!(manager.store().list_maps(true).is_empty());
}

#[tokio::test]
async fn mutations_gated_while_mapping() {
    let store = MapStore::new();
    let map = store.create_map(NewMap::from_label("Depot")).unwrap();
    let wp = store
        .create_waypoint(NewWaypoint {
            name: "Dock".to_string(),
            map_id: map.id,
            x: 1.0,
            y: 2.0,
            frame_id: String::new(),
            tags: Vec::new(),
        })
        .unwrap();
    let manager = manager_with(store);

    manager.start_mapping().unwrap();
    manager.wait_idle().await;

    let gated = ManagerError::InvalidMode {
        required: MapMode::Active,
        actual: MapMode::Mapping,
    };
    assert_eq!(
        manager
            .create_waypoint(NewWaypoint {
                name: "Blocked".to_string(),
                map_id: map.id,
                x: 0.0,
                y: 0.0,
                frame_id: String::new(),
                tags: Vec::new(),
            })
            .unwrap_err(),
        gated
    );
    assert_eq!(
        manager
            .update_waypoint(wp.id, Default::default())
            .unwrap_err(),
        gated
    );
    assert_eq!(manager.delete_waypoint(wp.id).unwrap_err(), gated);
    assert_eq!(
        manager.update_map(map.id, Default::default()).unwrap_err(),
        gated
    );
    assert_eq!(manager.delete_map(map.id).unwrap_err(), gated);
    assert_eq!(manager.load_map(map.id).unwrap_err(), gated);

    // Reads are never gated.
    assert_eq!(manager.store().list_maps(false).len(), 1);
    assert!(manager.store().get_waypoint(wp.id).is_ok());
}

#[tokio::test(start_paused = true)]
async fn mutations_blocked_for_entire_transition_window() {
    let store = MapStore::new();
    let map = store.create_map(NewMap::from_label("Depot")).unwrap();
    let manager = slow_manager(store);

    manager.start_mapping().unwrap();

    // The gate holds from phase 1 until the transition settles; nothing
    // slips through mid-window.
    assert_eq!(
        manager.update_map(map.id, Default::default()).unwrap_err(),
        ManagerError::TransitionInProgress
    );
    assert_eq!(
        manager.delete_map(map.id).unwrap_err(),
        ManagerError::TransitionInProgress
    );
    assert_eq!(
        manager
            .create_waypoint(NewWaypoint {
                name: "Blocked".to_string(),
                map_id: map.id,
                x: 0.0,
                y: 0.0,
                frame_id: String::new(),
                tags: Vec::new(),
            })
            .unwrap_err(),
        ManagerError::TransitionInProgress
    );

    manager.wait_idle().await;
    assert!(manager.store().get_map(map.id).is_ok());
}

#[tokio::test]
async fn load_map_sets_active_and_current() {
    let store = MapStore::new();
    let a = store.create_map(NewMap::from_label("A")).unwrap();
    let b = store.create_map(NewMap::from_label("B")).unwrap();
    let manager = manager_with(store);

    assert!(manager.load_map(waymark_core::MapId::new()).is_err());

    manager.load_map(a.id).unwrap();
    assert_eq!(manager.status().current_map_id, Some(a.id));
    manager.load_map(b.id).unwrap();
    assert_eq!(manager.status().current_map_id, Some(b.id));
    assert!(!manager.store().get_map(a.id).unwrap().is_active);
    assert!(manager.store().get_map(b.id).unwrap().is_active);
}

#[tokio::test]
async fn deleting_current_map_repoints_current() {
    let store = MapStore::new();
    let a = store.create_map(NewMap::from_label("A")).unwrap();
    let b = store.create_map(NewMap::from_label("B")).unwrap();
    let manager = manager_with(store);

    manager.load_map(b.id).unwrap();
    assert!(manager.delete_map(b.id).unwrap());
    // The store promoted the first remaining map; current follows it.
    assert_eq!(manager.status().current_map_id, Some(a.id));

    assert!(manager.delete_map(a.id).unwrap());
    assert_eq!(manager.status().current_map_id, None);
}

#[tokio::test]
async fn drag_resolves_through_viewport_transform() {
    let store = MapStore::new();
    let map = store.create_map(NewMap::from_label("Depot")).unwrap();
    let wp = store
        .create_waypoint(NewWaypoint {
            name: "Dock".to_string(),
            map_id: map.id,
            x: 0.0,
            y: 0.0,
            frame_id: String::new(),
            tags: Vec::new(),
        })
        .unwrap();
    let manager = manager_with(store);

    let mut viewport = Viewport::new();
    viewport.zoom_in(); // 1.2
    viewport.pan_by(30.0, 40.0);

    let moved = manager
        .drag_waypoint(wp.id, &viewport, ViewportPoint::new(150.0, 160.0))
        .unwrap();
    assert!((moved.x - 100.0).abs() < 1e-9);
    assert!((moved.y - 100.0).abs() < 1e-9);

    // Dragging never bypasses the ACTIVE gate.
    manager.start_mapping().unwrap();
    manager.wait_idle().await;
    assert!(manager
        .drag_waypoint(wp.id, &viewport, ViewportPoint::new(0.0, 0.0))
        .is_err());
}

#[tokio::test]
async fn simulator_smoke_run_passes() {
    let report = waymark_manager::run_simulator(waymark_manager::SimulatorConfig {
        seed: 7,
        total_operations: 500,
        ..Default::default()
    })
    .await;
    assert!(report.passed(), "{}", report.generate_text());
}
