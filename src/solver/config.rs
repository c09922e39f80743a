//! Solver limits and defaults.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub use crate::roster::MAX_ATTACKERS;

/// Options returned when the caller does not say otherwise.
pub const DEFAULT_MAX_RESULTS: usize = 12;

/// Default generation cap per requested result.
pub const GENERATED_PER_RESULT: usize = 30;

/// Lower bound applied to a caller-supplied generation cap.
pub const MIN_GENERATED: usize = 50;

/// Upper bound applied to a caller-supplied generation cap.
pub const MAX_GENERATED: usize = 50_000;

/// Search-tree nodes one solve may expand before it stops early.
pub const MAX_SEARCH_NODES: usize = 500_000;

/// Attacker slots when the caller does not say otherwise.
pub const DEFAULT_MAX_TOONS: usize = 4;

/// Target level when the caller does not say otherwise.
pub const DEFAULT_TARGET_LEVEL: u32 = 10;

/// Bounds on how much work a solve does and how much it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLimits {
    /// Options returned after ranking.
    pub max_results: usize,
    /// Search stops once this many options have been accepted.
    pub max_generated: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::for_results(DEFAULT_MAX_RESULTS)
    }
}

impl SearchLimits {
    /// Limits for `max_results` results with the default generation cap.
    #[must_use]
    pub fn for_results(max_results: usize) -> Self {
        Self {
            max_results,
            max_generated: clamp_generated(max_results.saturating_mul(GENERATED_PER_RESULT)),
        }
    }

    /// Validate limits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_results == 0 {
            return Err(ValidationError::InvalidRequest {
                reason: "max_results must be > 0".to_string(),
            });
        }
        if self.max_generated == 0 {
            return Err(ValidationError::InvalidRequest {
                reason: "max_generated must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Clamps a generation cap into `[MIN_GENERATED, MAX_GENERATED]`.
#[must_use]
pub fn clamp_generated(n: usize) -> usize {
    n.clamp(MIN_GENERATED, MAX_GENERATED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_default_is_valid() {
        let limits = SearchLimits::default();
        limits.validate().unwrap();
        assert_eq!(limits.max_results, 12);
        assert_eq!(limits.max_generated, 360);
    }

    #[test]
    fn generation_cap_is_clamped() {
        assert_eq!(SearchLimits::for_results(1).max_generated, MIN_GENERATED);
        assert_eq!(SearchLimits::for_results(10_000).max_generated, MAX_GENERATED);
    }

    #[test]
    fn limits_reject_zero() {
        let mut limits = SearchLimits::default();
        limits.max_results = 0;
        assert!(limits.validate().is_err());

        let mut limits = SearchLimits::default();
        limits.max_generated = 0;
        assert!(limits.validate().is_err());
    }
}
