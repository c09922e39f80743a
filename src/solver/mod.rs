//! Fill-to-kill solver.
//!
//! Given the gags already committed this round, finds the additions that
//! bring the target to zero hit points and ranks them.
//!
//! The pipeline is:
//!
//! 1. [`pool::candidate_pool`] narrows the available gags.
//! 2. [`search::generate`] enumerates feasible, lethal multisets up to the
//!    generation cap.
//! 3. [`filter::hide_overkill_additions`] optionally collapses equivalent
//!    options and drops additions that do not raise the probability.
//! 4. [`ranking::rank`] orders the survivors and the list is truncated to
//!    the requested number of results.

pub mod config;
pub mod filter;
pub mod pool;
pub mod ranking;
pub mod request;
pub mod search;
pub mod weights;
pub mod wire;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::GagCatalog;
use crate::error::GagResult;
use crate::gag::{GagInstance, GagKey};
use crate::track::PerTrack;

pub use config::SearchLimits;
pub use request::{FillRequest, FillRequestBuilder, LevelExclusions};
pub use weights::{RetainWeights, SortMode, SortWeights};
pub use wire::RawFillRequest;

/// One way to finish off the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillOption {
    /// Gags added on top of the committed ones.
    #[serde(rename = "addedGags")]
    pub added: Vec<GagInstance>,
    /// Damage of committed plus added gags, assuming every gag hits.
    pub total_damage: u32,
    /// Damage beyond the target's hit points.
    pub overkill: u32,
    /// One-turn knock-out probability in `[0, 1]`.
    pub accuracy: f64,
}

impl FillOption {
    /// Highest level among the added gags, 0 when nothing is added.
    #[must_use]
    pub fn max_level(&self) -> u8 {
        self.added.iter().map(GagInstance::level).max().unwrap_or(0)
    }

    /// Sum of the added gags' levels.
    #[must_use]
    pub fn level_sum(&self) -> u32 {
        self.added.iter().map(|g| u32::from(g.level())).sum()
    }

    /// Mean level of the added gags, 0 when nothing is added.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_level(&self) -> f64 {
        if self.added.is_empty() {
            return 0.0;
        }
        f64::from(self.level_sum()) / self.added.len() as f64
    }

    /// The added multiset as sorted gag keys.
    #[must_use]
    pub fn exact_key(&self) -> Vec<GagKey> {
        let mut keys: Vec<GagKey> = self.added.iter().map(GagInstance::key).collect();
        keys.sort();
        keys
    }

    /// Added gags per track.
    #[must_use]
    pub fn track_counts(&self) -> PerTrack<usize> {
        let mut counts = PerTrack::default();
        for gag in &self.added {
            counts.bump(gag.track());
        }
        counts
    }
}

/// Solver output as sent over the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FillResponse {
    /// Ranked options, best first.
    pub options: Vec<FillOption>,
}

/// Solves `request`.
///
/// # Errors
///
/// `CalcError::InvalidLevel` when the target level is 0 and
/// `CalcError::HealthOverflow` when its health does not fit in a `u32`, in
/// both cases only without a hit-point override. Probability evaluation
/// errors are propagated.
pub fn try_solve(request: &FillRequest) -> GagResult<Vec<FillOption>> {
    let hp = request.hp()?;
    let roster = request.roster();
    let capacity = roster.capacity(&request.enabled_tracks);
    let pool = pool::candidate_pool(request, &capacity);

    let (mut options, _) = search::generate(request, hp, &pool, &roster, &capacity)?;
    if request.hide_overkill_additions {
        let before = options.len();
        options = filter::hide_overkill_additions(options);
        debug!(before, after = options.len(), "hid overkill additions");
    }

    let mut ranked = ranking::rank(options, request);
    ranked.truncate(request.limits.max_results);
    Ok(ranked)
}

/// Solves `request`, treating any failure as "no options".
#[must_use]
pub fn solve(request: &FillRequest) -> Vec<FillOption> {
    match try_solve(request) {
        Ok(options) => options,
        Err(err) => {
            warn!(%err, target_level = request.target_level, "solve failed; returning no options");
            Vec::new()
        }
    }
}

/// Normalizes a wire request and solves it.
#[must_use]
pub fn solve_value(value: &Value, catalog: &GagCatalog) -> FillResponse {
    match RawFillRequest::deserialize(value) {
        Ok(raw) => FillResponse {
            options: solve(&raw.normalize(catalog)),
        },
        Err(err) => {
            warn!(%err, "malformed fill request; returning no options");
            FillResponse::default()
        }
    }
}

/// Parses, normalizes and solves a JSON request.
#[must_use]
pub fn solve_json(json: &str, catalog: &GagCatalog) -> FillResponse {
    match serde_json::from_str::<Value>(json) {
        Ok(value) => solve_value(&value, catalog),
        Err(err) => {
            warn!(%err, "unparseable fill request; returning no options");
            FillResponse::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CalcError, GagError};
    use crate::track::Track;

    fn gag(track: Track, level: u8, name: &str) -> GagInstance {
        GagCatalog::standard()
            .instance(&GagKey::new(track, level, name))
            .unwrap()
    }

    #[test]
    fn option_level_helpers() {
        let option = FillOption {
            added: vec![
                gag(Track::Throw, 5, "Whole Cream Pie"),
                gag(Track::Squirt, 3, "Squirt Gun"),
                gag(Track::Throw, 5, "Whole Cream Pie"),
            ],
            total_damage: 0,
            overkill: 0,
            accuracy: 0.0,
        };
        assert_eq!(option.max_level(), 5);
        assert_eq!(option.level_sum(), 13);
        assert!((option.avg_level() - 13.0 / 3.0).abs() < 1e-12);
        assert_eq!(option.track_counts().get(Track::Throw), 2);
        assert_eq!(option.exact_key()[0].track, Track::Throw);
    }

    #[test]
    fn empty_option_helpers() {
        let option = FillOption {
            added: Vec::new(),
            total_damage: 10,
            overkill: 0,
            accuracy: 1.0,
        };
        assert_eq!(option.max_level(), 0);
        assert!(option.avg_level().abs() < f64::EPSILON);
        assert!(option.exact_key().is_empty());
    }

    #[test]
    fn results_are_truncated_and_lethal() {
        let request = FillRequest::builder(9)
            .with_current(gag(Track::Lure, 5, "$10 Bill"))
            .limits(SearchLimits::for_results(5))
            .build()
            .unwrap();
        let hp = request.hp().unwrap();
        let options = try_solve(&request).unwrap();
        assert_eq!(options.len(), 5);
        assert!(options.iter().all(|o| o.total_damage >= hp));
        assert!(options
            .windows(2)
            .all(|w| w[0].accuracy >= w[1].accuracy));
    }

    #[test]
    fn level_zero_fails_closed() {
        let request = FillRequest {
            target_level: 0,
            ..FillRequest::builder(1).build().unwrap()
        };
        assert!(matches!(
            try_solve(&request),
            Err(GagError::Calc(CalcError::InvalidLevel { level: 0 }))
        ));
        assert!(solve(&request).is_empty());
    }

    #[test]
    fn malformed_json_yields_empty_response() {
        let catalog = GagCatalog::standard();
        assert!(solve_json("{not json", catalog).options.is_empty());
        assert!(solve_json("[1, 2]", catalog).options.is_empty());
    }

    #[test]
    fn response_wire_shape() {
        let response = solve_json(
            r#"{"targetLevel": 1, "maxToons": 1, "maxResults": 1,
                "availableGags": [{"track": "Throw", "level": 1, "name": "Cupcake"}]}"#,
            GagCatalog::standard(),
        );
        let value = serde_json::to_value(&response).unwrap();
        let option = &value["options"][0];
        assert_eq!(option["addedGags"][0]["name"], "Cupcake");
        assert_eq!(option["totalDamage"], 6);
        assert_eq!(option["overkill"], 0);
        assert!(option["accuracy"].as_f64().unwrap() > 0.0);
    }
}
