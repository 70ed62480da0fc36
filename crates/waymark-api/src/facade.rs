//! The request façade: translates transport requests into store and
//! state-machine calls, validating payload shape before they reach the core.
//!
//! Every failure is categorized here; nothing propagates uncategorized:
//! validation and integrity problems become 400s, missing entities 404s,
//! state-machine rejections 409s.

use crate::payload::{parse_body, SaveMappingBody};
use crate::response::ApiResponse;
use serde_json::json;
use std::sync::Arc;
use waymark_core::{MapId, MapPatch, NewMap, NewWaypoint, StoreError, WaypointId, WaypointPatch};
use waymark_manager::{ManagerError, MapManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

pub struct MapFacade {
    manager: Arc<MapManager>,
}

impl MapFacade {
    pub fn new(manager: Arc<MapManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<MapManager> {
        &self.manager
    }

    /// Route a request. `path` may carry a query string.
    pub fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> ApiResponse {
        let (path, query) = split_query(path);
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        match (method, segments.as_slice()) {
            (Method::Get, ["maps"]) => {
                self.list_maps(query_flag(&query, "includeArchived"))
            }
            (Method::Post, ["maps"]) => self.create_map(body),
            (_, ["maps"]) => ApiResponse::method_not_allowed(),

            (Method::Get, ["maps", id]) => self.get_map(id),
            (Method::Patch, ["maps", id]) => self.update_map(id, body),
            (Method::Delete, ["maps", id]) => self.delete_map(id),
            (_, ["maps", _]) => ApiResponse::method_not_allowed(),

            (Method::Get, ["waypoints"]) => self.list_waypoints(query_value(&query, "mapId")),
            (Method::Post, ["waypoints"]) => self.create_waypoint(body),
            (_, ["waypoints"]) => ApiResponse::method_not_allowed(),

            (Method::Get, ["waypoints", id]) => self.get_waypoint(id),
            (Method::Patch, ["waypoints", id]) => self.update_waypoint(id, body),
            (Method::Delete, ["waypoints", id]) => self.delete_waypoint(id),
            (_, ["waypoints", _]) => ApiResponse::method_not_allowed(),

            (Method::Post, ["mapping", "start"]) => self.start_mapping(),
            (Method::Post, ["mapping", "stop"]) => self.stop_mapping(),
            (Method::Post, ["mapping", "save"]) => self.save_mapping(body),
            (_, ["mapping", "start" | "stop" | "save"]) => ApiResponse::method_not_allowed(),

            (Method::Get, ["status"]) => self.status(),
            (_, ["status"]) => ApiResponse::method_not_allowed(),

            _ => ApiResponse::not_found("no such route"),
        }
    }

    // ---- Map endpoints ----

    pub fn list_maps(&self, include_archived: bool) -> ApiResponse {
        ApiResponse::ok(self.manager.store().list_maps(include_archived))
    }

    pub fn get_map(&self, id: &str) -> ApiResponse {
        let Some(id) = MapId::parse(id) else {
            return ApiResponse::not_found("map not found");
        };
        match self.manager.store().get_map(id) {
            Ok(map) => ApiResponse::ok(map),
            Err(e) => translate(e.into()),
        }
    }

    pub fn create_map(&self, body: Option<&serde_json::Value>) -> ApiResponse {
        let fields: NewMap = match parse_body(body, "map") {
            Ok(fields) => fields,
            Err(resp) => return resp,
        };
        match self.manager.create_map(fields) {
            Ok(map) => ApiResponse::created(map),
            Err(e) => translate(e),
        }
    }

    pub fn update_map(&self, id: &str, body: Option<&serde_json::Value>) -> ApiResponse {
        let Some(id) = MapId::parse(id) else {
            return ApiResponse::not_found("map not found");
        };
        let patch: MapPatch = match parse_body(body, "map") {
            Ok(patch) => patch,
            Err(resp) => return resp,
        };
        match self.manager.update_map(id, patch) {
            Ok(map) => ApiResponse::ok(map),
            Err(e) => translate(e),
        }
    }

    pub fn delete_map(&self, id: &str) -> ApiResponse {
        let Some(id) = MapId::parse(id) else {
            return ApiResponse::not_found("map not found");
        };
        match self.manager.delete_map(id) {
            Ok(true) => ApiResponse::no_content(),
            Ok(false) => ApiResponse::not_found("map not found"),
            Err(e) => translate(e),
        }
    }

    // ---- Waypoint endpoints ----

    pub fn list_waypoints(&self, map_id: Option<String>) -> ApiResponse {
        let filter = match map_id.as_deref() {
            // A filter id that cannot parse matches nothing.
            Some(raw) => match MapId::parse(raw) {
                Some(id) => Some(id),
                None => return ApiResponse::ok(Vec::<waymark_core::Waypoint>::new()),
            },
            None => None,
        };
        ApiResponse::ok(self.manager.store().list_waypoints(filter))
    }

    pub fn get_waypoint(&self, id: &str) -> ApiResponse {
        let Some(id) = WaypointId::parse(id) else {
            return ApiResponse::not_found("waypoint not found");
        };
        match self.manager.store().get_waypoint(id) {
            Ok(wp) => ApiResponse::ok(wp),
            Err(e) => translate(e.into()),
        }
    }

    pub fn create_waypoint(&self, body: Option<&serde_json::Value>) -> ApiResponse {
        let fields: NewWaypoint = match parse_body(body, "waypoint") {
            Ok(fields) => fields,
            Err(resp) => return resp,
        };
        match self.manager.create_waypoint(fields) {
            Ok(wp) => ApiResponse::created(wp),
            Err(e) => translate(e),
        }
    }

    pub fn update_waypoint(&self, id: &str, body: Option<&serde_json::Value>) -> ApiResponse {
        let Some(id) = WaypointId::parse(id) else {
            return ApiResponse::not_found("waypoint not found");
        };
        let patch: WaypointPatch = match parse_body(body, "waypoint") {
            Ok(patch) => patch,
            Err(resp) => return resp,
        };
        match self.manager.update_waypoint(id, patch) {
            Ok(wp) => ApiResponse::ok(wp),
            Err(e) => translate(e),
        }
    }

    pub fn delete_waypoint(&self, id: &str) -> ApiResponse {
        let Some(id) = WaypointId::parse(id) else {
            return ApiResponse::not_found("waypoint not found");
        };
        match self.manager.delete_waypoint(id) {
            Ok(true) => ApiResponse::no_content(),
            Ok(false) => ApiResponse::not_found("waypoint not found"),
            Err(e) => translate(e),
        }
    }

    // ---- Mapping mode endpoints ----

    pub fn start_mapping(&self) -> ApiResponse {
        match self.manager.start_mapping() {
            Ok(_) => ApiResponse::ok(json!({ "success": true, "message": "Mapping started" })),
            Err(e) => translate(e),
        }
    }

    pub fn stop_mapping(&self) -> ApiResponse {
        match self.manager.stop_mapping() {
            Ok(_) => ApiResponse::ok(json!({ "success": true, "message": "Mapping stopped" })),
            Err(e) => translate(e),
        }
    }

    pub fn save_mapping(&self, body: Option<&serde_json::Value>) -> ApiResponse {
        let payload: SaveMappingBody = match parse_body(body, "save") {
            Ok(payload) => payload,
            Err(resp) => return resp,
        };
        match self.manager.save_mapping(&payload.map_name) {
            Ok(receipt) => ApiResponse::ok(json!({
                "success": true,
                "message": "Map saved successfully",
                "map": receipt.map,
            })),
            Err(e) => translate(e),
        }
    }

    pub fn status(&self) -> ApiResponse {
        ApiResponse::ok(self.manager.status())
    }
}

/// Map a manager error onto the transport taxonomy.
fn translate(err: ManagerError) -> ApiResponse {
    match &err {
        ManagerError::Store(store_err) => match store_err {
            StoreError::NotFound(kind) => ApiResponse::not_found(format!("{kind} not found")),
            StoreError::Validation { .. } | StoreError::Integrity { .. } => {
                ApiResponse::bad_request(
                    store_err.to_string(),
                    store_err.detail().into_iter().collect(),
                )
            }
        },
        _ if err.is_conflict() => ApiResponse::conflict(err.to_string()),
        // Unreachable today; keeps the façade total if variants grow.
        _ => ApiResponse::error(500, err.to_string(), Vec::new()),
    }
}

fn split_query(path: &str) -> (&str, Vec<(String, String)>) {
    match path.split_once('?') {
        Some((path, query)) => {
            let pairs = query
                .split('&')
                .filter(|p| !p.is_empty())
                .map(|p| match p.split_once('=') {
                    Some((k, v)) => (k.to_string(), v.to_string()),
                    None => (p.to_string(), String::new()),
                })
                .collect();
            (path, pairs)
        }
        None => (path, Vec::new()),
    }
}

fn query_value(query: &[(String, String)], key: &str) -> Option<String> {
    query.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

fn query_flag(query: &[(String, String)], key: &str) -> bool {
    query_value(query, key).is_some_and(|v| v == "true" || v == "1" || v.is_empty())
}
