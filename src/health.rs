//! Target health model.

use crate::error::CalcError;

/// Level at which targets gain their flat health bonus.
pub const HEALTH_BONUS_LEVEL: u32 = 12;

/// Flat bonus applied from [`HEALTH_BONUS_LEVEL`] upward.
pub const HEALTH_BONUS: u32 = 14;

/// Hit points of a target of the given level.
///
/// Levels 1-11 have `(level + 1) * (level + 2)` hit points; level 12 and
/// above add a flat 14.
///
/// # Errors
///
/// Returns `CalcError::InvalidLevel` for level 0 and
/// `CalcError::HealthOverflow` when the hit points do not fit in a `u32`.
///
/// # Examples
///
/// ```
/// use gagsolve::health;
///
/// assert_eq!(health(1).unwrap(), 6);
/// assert_eq!(health(12).unwrap(), 196);
/// assert!(health(0).is_err());
/// ```
pub fn health(level: u32) -> Result<u32, CalcError> {
    if level < 1 {
        return Err(CalcError::InvalidLevel { level });
    }
    let overflow = || CalcError::HealthOverflow { level };
    let base = level
        .checked_add(1)
        .zip(level.checked_add(2))
        .and_then(|(a, b)| a.checked_mul(b))
        .ok_or_else(overflow)?;
    if level < HEALTH_BONUS_LEVEL {
        Ok(base)
    } else {
        base.checked_add(HEALTH_BONUS).ok_or_else(overflow)
    }
}
