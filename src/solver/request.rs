//! The canonical fill request and its builder.

use std::sync::Arc;

use crate::accuracy::AccuracyOptions;
use crate::catalog::GagCatalog;
use crate::error::{CalcError, GagResult};
use crate::gag::{GagDefinition, GagInstance};
use crate::health::health;
use crate::roster::{Roster, ToonRestriction};
use crate::track::{PerTrack, Track};

use super::config::{SearchLimits, DEFAULT_MAX_TOONS, MAX_ATTACKERS};
use super::weights::{RetainWeights, SortMode, SortWeights};

/// Gag levels the caller does not want to spend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelExclusions {
    /// Skip levels 1-3.
    pub low_1_to_3: bool,
    /// Skip level 7.
    pub level7: bool,
    /// Skip level 6 in every track.
    pub level6_all: bool,
    /// Skip level 6 in selected tracks.
    pub level6_by_track: PerTrack<bool>,
}

impl LevelExclusions {
    /// Whether a gag of `level` in `track` is excluded.
    #[must_use]
    pub fn excludes(&self, level: u8, track: Track) -> bool {
        match level {
            7 => self.level7,
            6 => self.level6_all || self.level6_by_track.get(track),
            1..=3 => self.low_1_to_3,
            _ => false,
        }
    }
}

/// Everything the solver needs to know about one fill-to-kill question.
#[derive(Debug, Clone)]
pub struct FillRequest {
    /// Target level.
    pub target_level: u32,
    /// Remaining hit points, when the target is already hurt.
    pub hp_override: Option<u32>,
    /// The target starts the round lured.
    pub initially_lured: bool,
    /// Gags already committed this round.
    pub current: Vec<GagInstance>,
    /// Gags the solver may add.
    pub available: Vec<Arc<GagDefinition>>,
    /// Attacker slots.
    pub max_toons: usize,
    /// Per-attacker missing track.
    pub restrictions: Vec<ToonRestriction>,
    /// Tracks the solver may add from.
    pub enabled_tracks: PerTrack<bool>,
    /// Levels the solver may not add.
    pub exclusions: LevelExclusions,
    /// Ranking mode.
    pub sort_mode: SortMode,
    /// Component weights for weighted ranking.
    pub sort_weights: SortWeights,
    /// Per-gag retain weights for weighted ranking.
    pub retain_weights: RetainWeights,
    /// Drop options that only add overkill.
    pub hide_overkill_additions: bool,
    /// Work and output bounds.
    pub limits: SearchLimits,
}

impl FillRequest {
    /// Starts a request against a target of `target_level`.
    #[must_use]
    pub fn builder(target_level: u32) -> FillRequestBuilder {
        FillRequestBuilder::new(target_level)
    }

    /// Hit points the solver must reach.
    pub fn hp(&self) -> Result<u32, CalcError> {
        match self.hp_override {
            Some(hp) => Ok(hp),
            None => health(self.target_level),
        }
    }

    /// The attacker roster described by this request.
    #[must_use]
    pub fn roster(&self) -> Roster {
        Roster::new(self.restrictions.iter().copied(), self.max_toons)
    }

    /// Free attacker slots after the committed gags.
    #[must_use]
    pub fn remaining_slots(&self) -> usize {
        self.max_toons.saturating_sub(self.current.len())
    }

    /// Options for probability evaluations of this request.
    #[must_use]
    pub fn accuracy_options(&self) -> AccuracyOptions {
        AccuracyOptions {
            initial_lured: self.initially_lured,
            hp_override: self.hp_override,
        }
    }
}

/// Builder for [`FillRequest`].
#[derive(Debug, Clone)]
pub struct FillRequestBuilder {
    target_level: u32,
    hp_override: Option<u32>,
    initially_lured: bool,
    current: Vec<GagInstance>,
    available: Option<Vec<Arc<GagDefinition>>>,
    max_toons: usize,
    restrictions: Vec<ToonRestriction>,
    enabled_tracks: PerTrack<bool>,
    exclusions: LevelExclusions,
    sort_mode: SortMode,
    sort_weights: SortWeights,
    retain_weights: Option<RetainWeights>,
    hide_overkill_additions: bool,
    limits: SearchLimits,
}

impl FillRequestBuilder {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn new(target_level: u32) -> Self {
        Self {
            target_level,
            hp_override: None,
            initially_lured: false,
            current: Vec::new(),
            available: None,
            max_toons: DEFAULT_MAX_TOONS,
            restrictions: Vec::new(),
            enabled_tracks: PerTrack::splat(true),
            exclusions: LevelExclusions::default(),
            sort_mode: SortMode::default(),
            sort_weights: SortWeights::default(),
            retain_weights: None,
            hide_overkill_additions: false,
            limits: SearchLimits::default(),
        }
    }

    /// Use remaining hit points instead of full health.
    #[must_use]
    pub fn hp_override(mut self, hp: u32) -> Self {
        self.hp_override = Some(hp);
        self
    }

    /// Mark the target as already lured.
    #[must_use]
    pub fn lured(mut self, lured: bool) -> Self {
        self.initially_lured = lured;
        self
    }

    /// Replace the committed gags.
    #[must_use]
    pub fn current(mut self, gags: Vec<GagInstance>) -> Self {
        self.current = gags;
        self
    }

    /// Commit one more gag.
    #[must_use]
    pub fn with_current(mut self, gag: GagInstance) -> Self {
        self.current.push(gag);
        self
    }

    /// Gags the solver may add. Defaults to the standard catalog.
    #[must_use]
    pub fn available(mut self, gags: Vec<Arc<GagDefinition>>) -> Self {
        self.available = Some(gags);
        self
    }

    /// Number of attacker slots.
    #[must_use]
    pub fn max_toons(mut self, max_toons: usize) -> Self {
        self.max_toons = max_toons;
        self
    }

    /// Per-attacker restrictions.
    #[must_use]
    pub fn restrictions(mut self, restrictions: Vec<ToonRestriction>) -> Self {
        self.restrictions = restrictions;
        self
    }

    /// Enable or disable a track for additions.
    #[must_use]
    pub fn track_enabled(mut self, track: Track, enabled: bool) -> Self {
        self.enabled_tracks.set(track, enabled);
        self
    }

    /// Level exclusions for additions.
    #[must_use]
    pub fn exclusions(mut self, exclusions: LevelExclusions) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Ranking mode.
    #[must_use]
    pub fn sort_mode(mut self, mode: SortMode) -> Self {
        self.sort_mode = mode;
        self
    }

    /// Component weights for weighted ranking.
    #[must_use]
    pub fn sort_weights(mut self, weights: SortWeights) -> Self {
        self.sort_weights = weights;
        self
    }

    /// Retain weights for weighted ranking. Defaults to the built-in table.
    #[must_use]
    pub fn retain_weights(mut self, weights: RetainWeights) -> Self {
        self.retain_weights = Some(weights);
        self
    }

    /// Hide options that only add overkill.
    #[must_use]
    pub fn hide_overkill_additions(mut self, hide: bool) -> Self {
        self.hide_overkill_additions = hide;
        self
    }

    /// Work and output bounds.
    #[must_use]
    pub fn limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Build the request.
    ///
    /// # Errors
    ///
    /// `CalcError::InvalidLevel` for level 0, `ValidationError::InvalidRequest`
    /// for zero limits or more than `MAX_ATTACKERS` slots.
    pub fn build(self) -> GagResult<FillRequest> {
        if self.target_level < 1 {
            return Err(CalcError::InvalidLevel {
                level: self.target_level,
            }
            .into());
        }
        self.limits.validate()?;
        if self.max_toons > MAX_ATTACKERS {
            return Err(crate::error::ValidationError::InvalidRequest {
                reason: format!("max_toons must be <= {MAX_ATTACKERS}"),
            }
            .into());
        }

        Ok(FillRequest {
            target_level: self.target_level,
            hp_override: self.hp_override.map(|hp| hp.max(1)),
            initially_lured: self.initially_lured,
            current: self.current,
            available: self
                .available
                .unwrap_or_else(|| GagCatalog::standard().definitions()),
            max_toons: self.max_toons,
            restrictions: self.restrictions,
            enabled_tracks: self.enabled_tracks,
            exclusions: self.exclusions,
            sort_mode: self.sort_mode,
            sort_weights: self.sort_weights.sanitized(),
            retain_weights: self.retain_weights.unwrap_or_else(RetainWeights::standard),
            hide_overkill_additions: self.hide_overkill_additions,
            limits: self.limits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GagError;

    #[test]
    fn builder_defaults() {
        let request = FillRequest::builder(10).build().unwrap();
        assert_eq!(request.max_toons, 4);
        assert_eq!(request.available.len(), 49);
        assert_eq!(request.hp().unwrap(), 132);
        assert_eq!(request.remaining_slots(), 4);
        assert_eq!(request.roster().len(), 4);
        assert!(request.enabled_tracks.get(Track::Drop));
    }

    #[test]
    fn builder_rejects_level_zero() {
        let err = FillRequest::builder(0).build().unwrap_err();
        assert!(matches!(err, GagError::Calc(CalcError::InvalidLevel { level: 0 })));
    }

    #[test]
    fn builder_rejects_oversized_roster() {
        let err = FillRequest::builder(5).max_toons(17).build().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn hp_override_is_at_least_one() {
        let request = FillRequest::builder(12).hp_override(0).build().unwrap();
        assert_eq!(request.hp().unwrap(), 1);
    }

    #[test]
    fn level_exclusions() {
        let mut exclusions = LevelExclusions {
            low_1_to_3: true,
            ..LevelExclusions::default()
        };
        exclusions.level6_by_track.set(Track::Throw, true);

        assert!(exclusions.excludes(2, Track::Sound));
        assert!(!exclusions.excludes(4, Track::Sound));
        assert!(exclusions.excludes(6, Track::Throw));
        assert!(!exclusions.excludes(6, Track::Squirt));
        assert!(!exclusions.excludes(7, Track::Drop));

        let all6 = LevelExclusions {
            level6_all: true,
            level7: true,
            ..LevelExclusions::default()
        };
        assert!(all6.excludes(6, Track::Squirt));
        assert!(all6.excludes(7, Track::Drop));
    }
}
