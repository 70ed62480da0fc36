//! Waymark API - CRUD request façade over the manager service
//!
//! Exposes the map and waypoint catalog, the mapping-mode controls, and the
//! operational status as a transport-agnostic dispatch surface. Responses are
//! HTTP-shaped (`status` + JSON body) so any transport can front the façade
//! without re-encoding the contract.

pub mod facade;
pub mod payload;
pub mod response;

pub use facade::{MapFacade, Method};
pub use payload::SaveMappingBody;
pub use response::ApiResponse;
