//! Waymark Core - entity model and store
//!
//! The foundation of the map manager:
//! - Typed identifiers and records for maps and waypoints
//! - The entity store with referential integrity and atomic cascade deletes
//! - The viewport <-> map-space coordinate transform
//! - The store-level error taxonomy

// Core modules
pub mod error;
pub mod slug;
pub mod store;
pub mod transform;
pub mod types;

// Re-exports for convenience
pub use error::{EntityKind, StoreError};
pub use store::MapStore;
pub use transform::{MapPoint, Viewport, ViewportPoint, MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};
pub use types::{
    MapId, MapPatch, MapRecord, NewMap, NewWaypoint, Waypoint, WaypointId, WaypointPatch,
};
