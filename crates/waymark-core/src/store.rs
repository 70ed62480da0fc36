//! The entity store: maps and waypoints under one lock.
//!
//! A single `RwLock` guards both tables so that cascade deletes and
//! active-map reassignment are atomic: no caller can observe the map gone
//! while its waypoints remain, or two maps active at once.

use crate::error::{EntityKind, StoreError};
use crate::slug;
use crate::types::{
    MapId, MapPatch, MapRecord, NewMap, NewWaypoint, Waypoint, WaypointId, WaypointPatch,
};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Inner {
    maps: HashMap<MapId, MapRecord>,
    waypoints: HashMap<WaypointId, Waypoint>,
}

impl Inner {
    /// Stable listing order: creation time, id as tiebreak.
    fn maps_ordered(&self) -> Vec<MapRecord> {
        let mut maps: Vec<_> = self.maps.values().cloned().collect();
        maps.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        maps
    }

    /// Clears every sibling's active flag, refreshing `updated_at` only on
    /// records that actually change.
    fn clear_active_except(&mut self, keep: Option<MapId>) {
        let now = Utc::now();
        for map in self.maps.values_mut() {
            if map.is_active && Some(map.id) != keep {
                map.is_active = false;
                map.updated_at = now;
            }
        }
    }
}

/// In-memory entity store for maps and waypoints.
///
/// Storage-agnostic contract: a durable backend would replace the inner
/// tables without changing any operation's semantics.
#[derive(Debug, Default)]
pub struct MapStore {
    inner: RwLock<Inner>,
}

impl MapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the sample depot/warehouse fixtures used by the
    /// demo CLI and tests.
    pub fn with_sample_data() -> Self {
        let store = Self::new();
        let depot = store
            .create_map(NewMap {
                label: "Husky Depot Map".to_string(),
                is_active: true,
                ..NewMap::default()
            })
            .expect("sample map is valid");
        store
            .create_map(NewMap::from_label("Warehouse Layout"))
            .expect("sample map is valid");
        for (name, x, y, tags) in [
            ("Entry Point", 120.0, 340.0, vec!["entry", "navigation"]),
            ("Loading Dock", 580.0, 190.0, vec!["loading", "dock"]),
        ] {
            store
                .create_waypoint(NewWaypoint {
                    name: name.to_string(),
                    map_id: depot.id,
                    x,
                    y,
                    frame_id: String::new(),
                    tags: tags.into_iter().map(String::from).collect(),
                })
                .expect("sample waypoint is valid");
        }
        store
    }

    // ---- Map operations ----

    /// All maps in stable order. Archived maps are excluded unless asked for.
    pub fn list_maps(&self, include_archived: bool) -> Vec<MapRecord> {
        self.inner
            .read()
            .maps_ordered()
            .into_iter()
            .filter(|m| include_archived || !m.is_archived)
            .collect()
    }

    pub fn get_map(&self, id: MapId) -> Result<MapRecord, StoreError> {
        self.inner
            .read()
            .maps
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(EntityKind::Map))
    }

    /// The currently active map, if any.
    pub fn active_map(&self) -> Option<MapRecord> {
        self.inner
            .read()
            .maps
            .values()
            .find(|m| m.is_active)
            .cloned()
    }

    pub fn create_map(&self, fields: NewMap) -> Result<MapRecord, StoreError> {
        let label = fields.label.trim().to_string();
        if label.is_empty() {
            return Err(StoreError::validation("label", "must not be empty"));
        }
        let name = match fields.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => slug::slugify(&label),
        };
        let file_name = match fields.file_name {
            Some(file_name) if !file_name.trim().is_empty() => file_name,
            _ => slug::file_name_for(&name),
        };

        let now = Utc::now();
        let map = MapRecord {
            id: MapId::new(),
            name,
            label,
            file_name,
            created_at: now,
            updated_at: now,
            is_archived: fields.is_archived,
            is_active: fields.is_active,
        };

        let mut inner = self.inner.write();
        if map.is_active {
            inner.clear_active_except(None);
        }
        inner.maps.insert(map.id, map.clone());
        drop(inner);

        tracing::info!(map_id = %map.id, name = %map.name, "created map");
        Ok(map)
    }

    /// Merges only supplied fields; always refreshes `updated_at`.
    pub fn update_map(&self, id: MapId, patch: MapPatch) -> Result<MapRecord, StoreError> {
        if matches!(&patch.label, Some(l) if l.trim().is_empty()) {
            return Err(StoreError::validation("label", "must not be empty"));
        }

        let mut inner = self.inner.write();
        if !inner.maps.contains_key(&id) {
            return Err(StoreError::NotFound(EntityKind::Map));
        }
        if patch.is_active == Some(true) {
            inner.clear_active_except(Some(id));
        }
        let map = inner.maps.get_mut(&id).expect("presence checked above");
        if let Some(name) = patch.name {
            map.name = name;
        }
        if let Some(label) = patch.label {
            map.label = label;
        }
        if let Some(file_name) = patch.file_name {
            map.file_name = file_name;
        }
        if let Some(is_archived) = patch.is_archived {
            map.is_archived = is_archived;
        }
        if let Some(is_active) = patch.is_active {
            map.is_active = is_active;
        }
        map.updated_at = Utc::now();
        let map = map.clone();
        drop(inner);

        tracing::debug!(map_id = %id, "updated map");
        Ok(map)
    }

    /// Deletes a map and, in the same critical section, every waypoint that
    /// references it. If the deleted map was active, the first remaining map
    /// in listing order becomes active. Returns whether a record existed.
    pub fn delete_map(&self, id: MapId) -> bool {
        let mut inner = self.inner.write();
        let Some(removed) = inner.maps.remove(&id) else {
            return false;
        };
        let before = inner.waypoints.len();
        inner.waypoints.retain(|_, wp| wp.map_id != id);
        let cascaded = before - inner.waypoints.len();

        if removed.is_active {
            if let Some(next) = inner.maps_ordered().first().map(|m| m.id) {
                let now = Utc::now();
                let map = inner.maps.get_mut(&next).expect("id from listing");
                map.is_active = true;
                map.updated_at = now;
            }
        }
        drop(inner);

        tracing::info!(map_id = %id, cascaded, "deleted map");
        true
    }

    /// Centralized at-most-one-active rule: marks the target active and
    /// clears every sibling under the same write lock.
    pub fn set_active(&self, id: MapId) -> Result<MapRecord, StoreError> {
        let mut inner = self.inner.write();
        if !inner.maps.contains_key(&id) {
            return Err(StoreError::NotFound(EntityKind::Map));
        }
        inner.clear_active_except(Some(id));
        let map = inner.maps.get_mut(&id).expect("presence checked above");
        if !map.is_active {
            map.is_active = true;
            map.updated_at = Utc::now();
        }
        Ok(map.clone())
    }

    // ---- Waypoint operations ----

    /// All waypoints in stable order, optionally filtered to one map.
    pub fn list_waypoints(&self, map_id: Option<MapId>) -> Vec<Waypoint> {
        let inner = self.inner.read();
        let mut waypoints: Vec<_> = inner
            .waypoints
            .values()
            .filter(|wp| map_id.map_or(true, |id| wp.map_id == id))
            .cloned()
            .collect();
        waypoints.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        waypoints
    }

    pub fn get_waypoint(&self, id: WaypointId) -> Result<Waypoint, StoreError> {
        self.inner
            .read()
            .waypoints
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(EntityKind::Waypoint))
    }

    /// Referential integrity is checked here, not at the transport layer.
    pub fn create_waypoint(&self, fields: NewWaypoint) -> Result<Waypoint, StoreError> {
        if fields.name.trim().is_empty() {
            return Err(StoreError::validation("name", "must not be empty"));
        }
        if !fields.x.is_finite() || !fields.y.is_finite() {
            return Err(StoreError::validation("x", "coordinates must be finite"));
        }

        let mut inner = self.inner.write();
        if !inner.maps.contains_key(&fields.map_id) {
            return Err(StoreError::Integrity {
                map_id: fields.map_id,
            });
        }
        let waypoint = Waypoint {
            id: WaypointId::new(),
            name: fields.name,
            map_id: fields.map_id,
            x: fields.x,
            y: fields.y,
            frame_id: fields.frame_id,
            tags: fields.tags,
            created_at: Utc::now(),
        };
        inner.waypoints.insert(waypoint.id, waypoint.clone());
        drop(inner);

        tracing::info!(waypoint_id = %waypoint.id, map_id = %waypoint.map_id, "created waypoint");
        Ok(waypoint)
    }

    pub fn update_waypoint(
        &self,
        id: WaypointId,
        patch: WaypointPatch,
    ) -> Result<Waypoint, StoreError> {
        if matches!(&patch.name, Some(n) if n.trim().is_empty()) {
            return Err(StoreError::validation("name", "must not be empty"));
        }
        if matches!(patch.x, Some(x) if !x.is_finite())
            || matches!(patch.y, Some(y) if !y.is_finite())
        {
            return Err(StoreError::validation("x", "coordinates must be finite"));
        }

        let mut inner = self.inner.write();
        if let Some(map_id) = patch.map_id {
            if !inner.maps.contains_key(&map_id) {
                return Err(StoreError::Integrity { map_id });
            }
        }
        let waypoint = inner
            .waypoints
            .get_mut(&id)
            .ok_or(StoreError::NotFound(EntityKind::Waypoint))?;
        if let Some(name) = patch.name {
            waypoint.name = name;
        }
        if let Some(map_id) = patch.map_id {
            waypoint.map_id = map_id;
        }
        if let Some(x) = patch.x {
            waypoint.x = x;
        }
        if let Some(y) = patch.y {
            waypoint.y = y;
        }
        if let Some(frame_id) = patch.frame_id {
            waypoint.frame_id = frame_id;
        }
        if let Some(tags) = patch.tags {
            waypoint.tags = tags;
        }
        let waypoint = waypoint.clone();
        drop(inner);

        tracing::debug!(waypoint_id = %id, "updated waypoint");
        Ok(waypoint)
    }

    /// Returns whether a record existed.
    pub fn delete_waypoint(&self, id: WaypointId) -> bool {
        let existed = self.inner.write().waypoints.remove(&id).is_some();
        if existed {
            tracing::info!(waypoint_id = %id, "deleted waypoint");
        }
        existed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_map_derives_slug_fields() {
        let store = MapStore::new();
        let map = store.create_map(NewMap::from_label("Depot")).unwrap();
        assert_eq!(map.name, "depot");
        assert_eq!(map.file_name, "depot.png");
        assert!(!map.is_active);
        assert_eq!(map.created_at, map.updated_at);
    }

    #[test]
    fn explicit_name_wins_over_derivation() {
        let store = MapStore::new();
        let map = store
            .create_map(NewMap {
                label: "Depot".to_string(),
                name: Some("bay_7".to_string()),
                file_name: Some("bay7.pcd".to_string()),
                ..NewMap::default()
            })
            .unwrap();
        assert_eq!(map.name, "bay_7");
        assert_eq!(map.file_name, "bay7.pcd");
    }

    #[test]
    fn blank_label_rejected() {
        let store = MapStore::new();
        let err = store.create_map(NewMap::from_label("  ")).unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "label", .. }));
    }

    #[test]
    fn update_map_merges_and_refreshes_updated_at() {
        let store = MapStore::new();
        let map = store.create_map(NewMap::from_label("Depot")).unwrap();
        let updated = store
            .update_map(
                map.id,
                MapPatch {
                    label: Some("Depot East".to_string()),
                    ..MapPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.label, "Depot East");
        assert_eq!(updated.name, "depot");
        assert_eq!(updated.created_at, map.created_at);
        assert!(updated.updated_at >= map.updated_at);
    }

    #[test]
    fn sample_data_has_one_active_map() {
        let store = MapStore::with_sample_data();
        let active: Vec<_> = store
            .list_maps(true)
            .into_iter()
            .filter(|m| m.is_active)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "husky_depot_map");
        assert_eq!(store.list_waypoints(Some(active[0].id)).len(), 2);
    }
}
