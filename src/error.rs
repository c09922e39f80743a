//! Error types for gagsolve.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the specific condition. Pure calculation errors (health, track lookup)
//! always propagate; request-shape problems are absorbed during
//! normalization and never show up here.

use thiserror::Error;

use crate::gag::GagKey;
use crate::storage::StorageError;

/// Errors raised by the pure calculation functions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("Health cannot be calculated for level {level} (levels start at 1)")]
    InvalidLevel {
        level: u32,
    },

    #[error("Health of level {level} does not fit in 32 bits")]
    HealthOverflow {
        level: u32,
    },

    #[error("Unknown gag track: '{name}'")]
    UnknownTrack {
        name: String,
    },
}

/// Validation errors for catalog data and caller-built values.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Duplicate gag in catalog: {key}")]
    DuplicateGag {
        key: GagKey,
    },

    #[error("Gag not found in catalog: {key}")]
    UnknownGag {
        key: GagKey,
    },

    #[error("Invalid catalog: {reason}")]
    InvalidCatalog {
        reason: String,
    },

    #[error("Unknown toon restriction: '{name}'")]
    UnknownRestriction {
        name: String,
    },

    #[error("Invalid fill request: {reason}")]
    InvalidRequest {
        reason: String,
    },

    #[error("Invalid scenario key: '{value}'")]
    InvalidScenarioKey {
        value: String,
    },
}

/// Execution errors raised by the background solver runtime.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Solver queue is full (capacity {capacity})")]
    QueueFull {
        capacity: usize,
    },

    #[error("Solver worker disconnected")]
    Disconnected,

    #[error("Solve timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Solve {generation} was superseded by solve {latest}")]
    Superseded {
        generation: u64,
        latest: u64,
    },
}

/// Top-level error type for gagsolve.
#[derive(Debug, Error)]
pub enum GagError {
    #[error("Calculation error: {0}")]
    Calc(#[from] CalcError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl GagError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a calculation error.
    #[must_use]
    pub const fn is_calc(&self) -> bool {
        matches!(self, Self::Calc(_))
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if the result was discarded because a newer solve replaced it.
    #[must_use]
    pub const fn is_superseded(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::Superseded { .. }))
    }
}

/// Result type alias for gagsolve operations.
pub type GagResult<T> = Result<T, GagError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Track;

    #[test]
    fn test_calc_error_invalid_level() {
        let err = CalcError::InvalidLevel { level: 0 };
        let msg = format!("{err}");
        assert!(msg.contains("level 0"));
    }

    #[test]
    fn test_calc_error_unknown_track() {
        let err = CalcError::UnknownTrack {
            name: "Juggle".to_string(),
        };
        assert!(format!("{err}").contains("Juggle"));
    }

    #[test]
    fn test_validation_error_duplicate_gag() {
        let err = ValidationError::DuplicateGag {
            key: GagKey::new(Track::Throw, 1, "Cupcake"),
        };
        let msg = format!("{err}");
        assert!(msg.contains("Throw:1:Cupcake"));
    }

    #[test]
    fn test_execution_error_superseded() {
        let err = ExecutionError::Superseded {
            generation: 3,
            latest: 5,
        };
        let msg = format!("{err}");
        assert!(msg.contains('3'));
        assert!(msg.contains('5'));
    }

    #[test]
    fn test_gag_error_from_calc() {
        let err: GagError = CalcError::InvalidLevel { level: 0 }.into();
        assert!(err.is_calc());
        assert!(!err.is_execution());
    }

    #[test]
    fn test_gag_error_from_execution() {
        let err: GagError = ExecutionError::Superseded {
            generation: 1,
            latest: 2,
        }
        .into();
        assert!(err.is_execution());
        assert!(err.is_superseded());
    }

    #[test]
    fn test_gag_error_internal() {
        let err = GagError::internal("unexpected state");
        assert!(!err.is_validation());
        assert!(format!("{err}").contains("unexpected state"));
    }
}
