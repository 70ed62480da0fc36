use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapId(pub Uuid);

impl MapId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id from its path/query representation. An unparseable id can
    /// never resolve, so callers treat `None` as not-found.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for MapId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MapId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaypointId(pub Uuid);

impl WaypointId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for WaypointId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WaypointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A stored spatial scan with identity, display label and associated artifact
/// file. Serialized in camelCase to match the wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRecord {
    pub id: MapId,
    /// Machine-safe slug, derived from `label` at creation time.
    pub name: String,
    /// Human-readable display name, mutable.
    pub label: String,
    /// Artifact file associated with the stored scan.
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
    /// Logical delete: archived maps are excluded from normal listings.
    pub is_archived: bool,
    /// At most one map is active at any time; exclusivity is enforced by the
    /// store, never by callers.
    pub is_active: bool,
}

/// A named point in map-space belonging to exactly one map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub id: WaypointId,
    pub name: String,
    pub map_id: MapId,
    /// Map-space coordinates, not screen space.
    pub x: f64,
    pub y: f64,
    /// Optional coordinate-frame tag for multi-frame installations.
    pub frame_id: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a map. Only `label` is required; `name` and
/// `file_name` derive from it when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMap {
    pub label: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_active: bool,
}

impl NewMap {
    pub fn from_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

/// Partial update for a map. Only supplied fields change; `id` and
/// `created_at` are immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub is_archived: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Fields for creating a waypoint. `map_id` must resolve to an existing map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWaypoint {
    pub name: String,
    pub map_id: MapId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub frame_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update for a waypoint. A supplied `map_id` is re-checked for
/// referential integrity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaypointPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub map_id: Option<MapId>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub frame_id: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_id_parse_roundtrip() {
        let id = MapId::new();
        assert_eq!(MapId::parse(&id.to_string()), Some(id));
        assert_eq!(MapId::parse("not-a-uuid"), None);
    }

    #[test]
    fn map_record_serializes_camel_case() {
        let record = MapRecord {
            id: MapId::new(),
            name: "depot".to_string(),
            label: "Depot".to_string(),
            file_name: "depot.png".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            is_archived: false,
            is_active: true,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("fileName").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("isActive").is_some());
        assert!(json.get("file_name").is_none());
    }

    #[test]
    fn new_waypoint_defaults() {
        let json = serde_json::json!({
            "name": "Dock",
            "mapId": MapId::new(),
            "x": 10.0,
            "y": 20.0,
        });
        let wp: NewWaypoint = serde_json::from_value(json).unwrap();
        assert_eq!(wp.frame_id, "");
        assert!(wp.tags.is_empty());
    }
}
