//! Error types for the entity store.
//!
//! Every failure is a rejected operation; the store remains usable after any
//! error. The façade layer translates these into transport status codes.

use crate::types::MapId;

/// Entity kind referenced by a not-found error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Map,
    Waypoint,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Map => write!(f, "map"),
            EntityKind::Waypoint => write!(f, "waypoint"),
        }
    }
}

/// Store error taxonomy.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// Referenced id is absent.
    #[error("{0} not found")]
    NotFound(EntityKind),

    /// Malformed or incomplete payload.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Waypoint references a nonexistent map.
    #[error("referential integrity violation: map {map_id} does not exist")]
    Integrity { map_id: MapId },
}

impl StoreError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Field-level detail for 400 responses, where one exists.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Validation { field, reason } => Some(format!("{field}: {reason}")),
            Self::Integrity { map_id } => Some(format!("mapId: {map_id} does not exist")),
            Self::NotFound(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = StoreError::NotFound(EntityKind::Waypoint);
        assert_eq!(err.to_string(), "waypoint not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn validation_detail() {
        let err = StoreError::validation("label", "must not be empty");
        assert_eq!(err.detail().unwrap(), "label: must not be empty");
        assert!(!err.is_not_found());
    }
}
