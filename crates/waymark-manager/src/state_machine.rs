use crate::error::ManagerError;
use serde::{Deserialize, Serialize};

/// Operating mode of the map manager: browsing/editing an existing map, or
/// recording a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MapMode {
    Active,
    Mapping,
}

impl std::fmt::Display for MapMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapMode::Active => write!(f, "ACTIVE"),
            MapMode::Mapping => write!(f, "MAPPING"),
        }
    }
}

pub fn allowed_transitions(from: MapMode) -> Vec<MapMode> {
    match from {
        MapMode::Active => vec![MapMode::Mapping],
        MapMode::Mapping => vec![MapMode::Active],
    }
}

/// Validates a mode transition against the matrix.
pub fn validate_transition(from: MapMode, to: MapMode) -> Result<(), ManagerError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(ManagerError::IllegalTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_toggle() {
        assert!(validate_transition(MapMode::Active, MapMode::Mapping).is_ok());
        assert!(validate_transition(MapMode::Mapping, MapMode::Active).is_ok());
    }

    #[test]
    fn self_transitions_rejected() {
        assert!(validate_transition(MapMode::Active, MapMode::Active).is_err());
        assert!(validate_transition(MapMode::Mapping, MapMode::Mapping).is_err());
    }

    #[test]
    fn serializes_as_wire_constants() {
        assert_eq!(
            serde_json::to_value(MapMode::Mapping).unwrap(),
            serde_json::json!("MAPPING")
        );
    }
}
