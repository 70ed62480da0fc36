//! The manager service: operational status plus the gated mutation surface.
//!
//! One `MapManager` owns the process-wide `OperationalStatus` and wraps the
//! entity store. It is an explicitly constructed service object handed to the
//! façade, never a module-level singleton, so test fixtures stay isolated.
//!
//! Mode transitions are two-phase: phase 1 marks `is_transitioning`
//! synchronously and returns; phase 2 is a scheduled task that applies the
//! terminal mode after the configured delay. Phase 2 is generation-guarded,
//! so a superseded task can never clobber later state.

use crate::config::ManagerConfig;
use crate::error::ManagerError;
use crate::state_machine::{self, MapMode};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use waymark_core::{
    MapId, MapPatch, MapRecord, MapStore, NewMap, NewWaypoint, Viewport, ViewportPoint, Waypoint,
    WaypointId, WaypointPatch,
};

/// Snapshot of the process-wide operational status.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalStatus {
    pub state: MapMode,
    pub current_map_id: Option<MapId>,
    pub is_transitioning: bool,
}

/// Receipt for a phase-1 transition acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionReceipt {
    pub from: MapMode,
    pub to: MapMode,
    pub started_at: DateTime<Utc>,
}

/// Receipt for a save-mapping request: the map record exists immediately,
/// the mode flips back to ACTIVE when the transition completes.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReceipt {
    pub map: MapRecord,
    pub receipt: TransitionReceipt,
}

#[derive(Debug)]
struct StatusInner {
    state: MapMode,
    current_map_id: Option<MapId>,
    is_transitioning: bool,
    /// Bumped on every phase 1; phase 2 applies only if it still matches.
    generation: u64,
}

impl StatusInner {
    /// Operator mutations require ACTIVE mode with no transition in flight;
    /// while MAPPING the store is read-only from the operator's perspective.
    fn check_active(&self) -> Result<(), ManagerError> {
        if self.is_transitioning {
            return Err(ManagerError::TransitionInProgress);
        }
        if self.state != MapMode::Active {
            tracing::debug!(mode = %self.state, "mutation rejected by mode gate");
            return Err(ManagerError::InvalidMode {
                required: MapMode::Active,
                actual: self.state,
            });
        }
        Ok(())
    }
}

pub struct MapManager {
    store: Arc<MapStore>,
    config: ManagerConfig,
    status: Arc<RwLock<StatusInner>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl MapManager {
    /// Initial state is ACTIVE, with `current_map_id` picked up from the
    /// store's active map if one exists.
    pub fn new(store: Arc<MapStore>, config: ManagerConfig) -> Self {
        let current_map_id = store.active_map().map(|m| m.id);
        Self {
            store,
            config,
            status: Arc::new(RwLock::new(StatusInner {
                state: MapMode::Active,
                current_map_id,
                is_transitioning: false,
                generation: 0,
            })),
            pending: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<MapStore> {
        &self.store
    }

    pub fn status(&self) -> OperationalStatus {
        let st = self.status.read();
        OperationalStatus {
            state: st.state,
            current_map_id: st.current_map_id,
            is_transitioning: st.is_transitioning,
        }
    }

    /// Awaits the pending phase-2 task, if any. Used by tests and shutdown.
    pub async fn wait_idle(&self) {
        let handle = self.pending.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Phase 1: validate against the matrix, mark transitioning, bump the
    /// generation. Rejects re-entrant requests with `TransitionInProgress`.
    fn begin_transition(&self, to: MapMode) -> Result<(MapMode, u64), ManagerError> {
        let mut st = self.status.write();
        if st.is_transitioning {
            return Err(ManagerError::TransitionInProgress);
        }
        state_machine::validate_transition(st.state, to)?;
        let from = st.state;
        st.is_transitioning = true;
        st.generation += 1;
        Ok((from, st.generation))
    }

    /// Phase 2: after the delay, apply the terminal update under the status
    /// lock. A stale generation means this transition was superseded by a
    /// re-initialized status; the task then resolves to a no-op.
    fn schedule_finalize(
        &self,
        generation: u64,
        delay: Duration,
        apply: impl FnOnce(&MapStore, &mut StatusInner) + Send + 'static,
    ) {
        let status = Arc::clone(&self.status);
        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut st = status.write();
            if st.is_transitioning && st.generation == generation {
                apply(&store, &mut st);
                st.is_transitioning = false;
            }
        });
        *self.pending.lock() = Some(handle);
    }

    /// Begin recording a new map. Legal only from ACTIVE, not transitioning.
    pub fn start_mapping(&self) -> Result<TransitionReceipt, ManagerError> {
        let (from, generation) = self.begin_transition(MapMode::Mapping)?;
        self.schedule_finalize(generation, self.config.transition_delay, |_, st| {
            st.state = MapMode::Mapping;
            tracing::info!("mapping started");
        });
        Ok(TransitionReceipt {
            from,
            to: MapMode::Mapping,
            started_at: Utc::now(),
        })
    }

    /// Stop recording without saving. Legal only from MAPPING.
    pub fn stop_mapping(&self) -> Result<TransitionReceipt, ManagerError> {
        let (from, generation) = self.begin_transition(MapMode::Active)?;
        self.schedule_finalize(generation, self.config.transition_delay, |_, st| {
            st.state = MapMode::Active;
            tracing::info!("mapping stopped");
        });
        Ok(TransitionReceipt {
            from,
            to: MapMode::Active,
            started_at: Utc::now(),
        })
    }

    /// Persist the recording session as a new map. Legal only while MAPPING.
    /// The record exists as soon as this returns; once the transition back to
    /// ACTIVE completes, the new map becomes active and current, superseding
    /// whichever map was active before the session.
    pub fn save_mapping(&self, map_name: &str) -> Result<SaveReceipt, ManagerError> {
        let mut st = self.status.write();
        if st.is_transitioning {
            return Err(ManagerError::TransitionInProgress);
        }
        state_machine::validate_transition(st.state, MapMode::Active)?;
        // Map creation and the transition start form one critical section:
        // no other transition can slip between them.
        let map = self.store.create_map(NewMap::from_label(map_name))?;
        let from = st.state;
        st.is_transitioning = true;
        st.generation += 1;
        let generation = st.generation;
        drop(st);

        let map_id = map.id;
        self.schedule_finalize(generation, self.config.save_delay, move |store, st| {
            st.state = MapMode::Active;
            // Gated deletes are blocked for the whole transition window, so
            // the id still resolves; tolerate a missing record anyway.
            if store.set_active(map_id).is_ok() {
                st.current_map_id = Some(map_id);
            }
            tracing::info!(map_id = %map_id, "mapping session saved");
        });

        Ok(SaveReceipt {
            map,
            receipt: TransitionReceipt {
                from,
                to: MapMode::Active,
                started_at: Utc::now(),
            },
        })
    }

    /// Load a map for browsing: exclusive active flag plus `current_map_id`.
    /// Legal only in ACTIVE with no transition in flight.
    pub fn load_map(&self, id: MapId) -> Result<MapRecord, ManagerError> {
        let mut st = self.status.write();
        if st.is_transitioning {
            return Err(ManagerError::TransitionInProgress);
        }
        if st.state != MapMode::Active {
            return Err(ManagerError::InvalidMode {
                required: MapMode::Active,
                actual: st.state,
            });
        }
        let map = self.store.set_active(id)?;
        st.current_map_id = Some(map.id);
        drop(st);
        tracing::info!(map_id = %map.id, "loaded map");
        Ok(map)
    }

    /// Gate for operator mutations. The returned guard is held across the
    /// store call, so a transition cannot begin between check and mutation.
    fn active_gate(&self) -> Result<RwLockReadGuard<'_, StatusInner>, ManagerError> {
        let st = self.status.read();
        st.check_active()?;
        Ok(st)
    }

    // ---- Gated store surface ----

    /// Map creation is not gated: the save-mapping path creates maps while
    /// still in MAPPING.
    pub fn create_map(&self, fields: NewMap) -> Result<MapRecord, ManagerError> {
        Ok(self.store.create_map(fields)?)
    }

    pub fn update_map(&self, id: MapId, patch: MapPatch) -> Result<MapRecord, ManagerError> {
        let _gate = self.active_gate()?;
        Ok(self.store.update_map(id, patch)?)
    }

    /// Cascade-deletes the map's waypoints and keeps `current_map_id`
    /// consistent with whichever map the store promoted, if any. Runs under
    /// the status write lock so the gate holds for the whole operation.
    pub fn delete_map(&self, id: MapId) -> Result<bool, ManagerError> {
        let mut st = self.status.write();
        st.check_active()?;
        let existed = self.store.delete_map(id);
        if existed && st.current_map_id == Some(id) {
            st.current_map_id = self.store.active_map().map(|m| m.id);
        }
        Ok(existed)
    }

    pub fn create_waypoint(&self, fields: NewWaypoint) -> Result<Waypoint, ManagerError> {
        let _gate = self.active_gate()?;
        Ok(self.store.create_waypoint(fields)?)
    }

    pub fn update_waypoint(
        &self,
        id: WaypointId,
        patch: WaypointPatch,
    ) -> Result<Waypoint, ManagerError> {
        let _gate = self.active_gate()?;
        Ok(self.store.update_waypoint(id, patch)?)
    }

    pub fn delete_waypoint(&self, id: WaypointId) -> Result<bool, ManagerError> {
        let _gate = self.active_gate()?;
        Ok(self.store.delete_waypoint(id))
    }

    /// Resolve a drag drop point through the viewport transform and move the
    /// waypoint. Runs through the gated update, so dragging never bypasses
    /// the ACTIVE-state gate.
    pub fn drag_waypoint(
        &self,
        id: WaypointId,
        viewport: &Viewport,
        drop_at: ViewportPoint,
    ) -> Result<Waypoint, ManagerError> {
        let target = viewport.to_map_space(drop_at);
        self.update_waypoint(
            id,
            WaypointPatch {
                x: Some(target.x),
                y: Some(target.y),
                ..WaypointPatch::default()
            },
        )
    }
}

impl std::fmt::Debug for MapManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapManager")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
