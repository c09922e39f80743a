//! Ordering of options.
//!
//! Every comparator ends in a total tie-break chain and the sort is stable,
//! so a given option list always ranks the same way.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::gag::GagInstance;
use crate::track::Track;

use super::request::FillRequest;
use super::weights::{RetainWeights, SortMode, SortWeights};
use super::FillOption;

fn by_accuracy(a: &FillOption, b: &FillOption) -> Ordering {
    b.accuracy.total_cmp(&a.accuracy)
}

fn by_levels(a: &FillOption, b: &FillOption) -> Ordering {
    a.max_level()
        .cmp(&b.max_level())
        .then_with(|| a.avg_level().total_cmp(&b.avg_level()))
}

fn by_waste(a: &FillOption, b: &FillOption) -> Ordering {
    a.overkill
        .cmp(&b.overkill)
        .then_with(|| a.total_damage.cmp(&b.total_damage))
}

/// Highest probability first, then lowest levels, then least waste.
#[must_use]
pub fn compare_accuracy(a: &FillOption, b: &FillOption) -> Ordering {
    by_accuracy(a, b)
        .then_with(|| by_levels(a, b))
        .then_with(|| by_waste(a, b))
}

/// Lowest levels first, then highest probability, then least waste.
#[must_use]
pub fn compare_conserve(a: &FillOption, b: &FillOption) -> Ordering {
    by_levels(a, b)
        .then_with(|| by_accuracy(a, b))
        .then_with(|| by_waste(a, b))
}

/// Per-option inputs to the weighted score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedMetrics {
    /// `10 * max(effective level) + mean(effective level)`; lower is better.
    pub level_metric: f64,
    /// Distinct tracks across committed and added gags; lower is better.
    pub track_count: usize,
}

impl WeightedMetrics {
    /// Computes the metrics of `option` on top of the committed gags.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn of(option: &FillOption, current: &[GagInstance], retain: &RetainWeights) -> Self {
        let effective: Vec<f64> = option
            .added
            .iter()
            .map(|g| f64::from(g.level()) * retain.get(&g.key()))
            .collect();
        let max = effective.iter().copied().fold(0.0, f64::max);
        let avg = if effective.is_empty() {
            0.0
        } else {
            effective.iter().sum::<f64>() / effective.len() as f64
        };

        let tracks: HashSet<Track> = current
            .iter()
            .chain(option.added.iter())
            .map(GagInstance::track)
            .collect();

        Self {
            level_metric: max * 10.0 + avg,
            track_count: tracks.len(),
        }
    }
}

/// Position of `value` within `[min, max]`; 0 when there is no spread.
fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if !(value.is_finite() && min.is_finite() && max.is_finite()) || max <= min {
        return 0.0;
    }
    (value - min) / (max - min)
}

/// Sorts by the weighted blend of accuracy, conservation and track count.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rank_weighted(
    options: Vec<FillOption>,
    current: &[GagInstance],
    weights: SortWeights,
    retain: &RetainWeights,
) -> Vec<FillOption> {
    if options.is_empty() {
        return options;
    }
    let metrics: Vec<WeightedMetrics> = options
        .iter()
        .map(|o| WeightedMetrics::of(o, current, retain))
        .collect();

    let level_min = metrics.iter().map(|m| m.level_metric).fold(f64::INFINITY, f64::min);
    let level_max = metrics.iter().map(|m| m.level_metric).fold(f64::NEG_INFINITY, f64::max);
    let track_min = metrics.iter().map(|m| m.track_count).min().unwrap_or(0) as f64;
    let track_max = metrics.iter().map(|m| m.track_count).max().unwrap_or(0) as f64;

    let scores: Vec<f64> = options
        .iter()
        .zip(&metrics)
        .map(|(option, m)| {
            let accuracy = option.accuracy.clamp(0.0, 1.0);
            let conserve = 1.0 - normalize(m.level_metric, level_min, level_max);
            let tracks = 1.0 - normalize(m.track_count as f64, track_min, track_max);
            weights.accuracy * accuracy + weights.conserve * conserve + weights.tracks * tracks
        })
        .collect();

    let mut order: Vec<usize> = (0..options.len()).collect();
    order.sort_by(|&ia, &ib| {
        let (a, b) = (&options[ia], &options[ib]);
        let (ma, mb) = (&metrics[ia], &metrics[ib]);
        scores[ib]
            .total_cmp(&scores[ia])
            .then_with(|| by_accuracy(a, b))
            .then_with(|| ma.level_metric.total_cmp(&mb.level_metric))
            .then_with(|| ma.track_count.cmp(&mb.track_count))
            .then_with(|| by_waste(a, b))
    });

    let mut slots: Vec<Option<FillOption>> = options.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect()
}

/// Orders options according to the request's sort mode.
#[must_use]
pub fn rank(mut options: Vec<FillOption>, request: &FillRequest) -> Vec<FillOption> {
    match request.sort_mode {
        SortMode::Accuracy => {
            options.sort_by(compare_accuracy);
            options
        }
        SortMode::Conserve => {
            options.sort_by(compare_conserve);
            options
        }
        SortMode::Weighted => rank_weighted(
            options,
            &request.current,
            request.sort_weights,
            &request.retain_weights,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::GagCatalog;
    use crate::gag::GagKey;

    fn gag(track: Track, level: u8, name: &str) -> GagInstance {
        GagCatalog::standard()
            .instance(&GagKey::new(track, level, name))
            .unwrap()
    }

    fn option(added: Vec<GagInstance>, total: u32, overkill: u32, accuracy: f64) -> FillOption {
        FillOption {
            added,
            total_damage: total,
            overkill,
            accuracy,
        }
    }

    fn names(options: &[FillOption]) -> Vec<String> {
        options
            .iter()
            .map(|o| {
                o.added
                    .iter()
                    .map(|g| g.name().to_string())
                    .collect::<Vec<_>>()
                    .join("+")
            })
            .collect()
    }

    fn sample() -> Vec<FillOption> {
        vec![
            option(vec![gag(Track::Drop, 4, "Big Weight")], 45, 0, 0.55),
            option(vec![gag(Track::Throw, 5, "Whole Cream Pie"), gag(Track::Throw, 5, "Whole Cream Pie")], 96, 0, 0.95),
            option(vec![gag(Track::Squirt, 6, "Storm Cloud"), gag(Track::Throw, 6, "Birthday Cake")], 216, 84, 0.95),
        ]
    }

    #[test]
    fn accuracy_mode() {
        let mut options = sample();
        options.sort_by(compare_accuracy);
        assert_eq!(
            names(&options),
            vec!["Whole Cream Pie+Whole Cream Pie", "Storm Cloud+Birthday Cake", "Big Weight"]
        );
    }

    #[test]
    fn conserve_mode_never_prefers_higher_max_level() {
        let mut options = sample();
        options.sort_by(compare_conserve);
        assert_eq!(
            names(&options),
            vec!["Big Weight", "Whole Cream Pie+Whole Cream Pie", "Storm Cloud+Birthday Cake"]
        );
        for pair in options.windows(2) {
            assert!(pair[0].max_level() <= pair[1].max_level());
        }
    }

    #[test]
    fn conserve_breaks_level_ties_by_probability_then_waste() {
        let pie = || gag(Track::Throw, 5, "Whole Cream Pie");
        let mut options = vec![
            option(vec![pie()], 40, 10, 0.7),
            option(vec![pie()], 40, 5, 0.7),
            option(vec![pie()], 40, 20, 0.9),
        ];
        options.sort_by(compare_conserve);
        let overkills: Vec<u32> = options.iter().map(|o| o.overkill).collect();
        assert_eq!(overkills, vec![20, 5, 10]);
    }

    #[test]
    fn weighted_metrics_use_retain_weights() {
        let retain = RetainWeights::new()
            .with_overrides([(GagKey::new(Track::Throw, 5, "Whole Cream Pie"), 0.2)]);
        let o = option(
            vec![gag(Track::Throw, 5, "Whole Cream Pie"), gag(Track::Drop, 4, "Big Weight")],
            100,
            0,
            0.5,
        );
        let current = vec![gag(Track::Lure, 5, "$10 Bill")];
        let m = WeightedMetrics::of(&o, &current, &retain);
        // Effective levels: 5 * 0.2 = 1.0 and 4 * 0.5 = 2.0.
        assert!((m.level_metric - 21.5).abs() < 1e-9);
        assert_eq!(m.track_count, 3);
    }

    #[test]
    fn weighted_without_variance_falls_back_to_accuracy() {
        let pie = || gag(Track::Throw, 5, "Whole Cream Pie");
        let options = vec![
            option(vec![pie()], 40, 0, 0.6),
            option(vec![pie()], 40, 0, 0.9),
        ];
        let ranked = rank_weighted(options, &[], SortWeights::default(), &RetainWeights::standard());
        assert!((ranked[0].accuracy - 0.9).abs() < 1e-12);
    }

    #[test]
    fn weighted_prefers_cheap_gags_when_conserve_dominates() {
        let options = vec![
            option(vec![gag(Track::Throw, 7, "Wedding Cake")], 120, 30, 0.9),
            option(vec![gag(Track::Drop, 6, "Grand Piano")], 170, 80, 0.85),
        ];
        let weights = SortWeights {
            accuracy: 0.1,
            conserve: 1.0,
            tracks: 0.0,
        };
        let ranked = rank_weighted(options, &[], weights, &RetainWeights::standard());
        assert_eq!(ranked[0].added[0].name(), "Grand Piano");
    }

    #[test]
    fn weighted_is_deterministic() {
        let weights = SortWeights::recommended();
        let retain = RetainWeights::standard();
        let a = rank_weighted(sample(), &[], weights, &retain);
        let mut reversed = sample();
        reversed.reverse();
        let b = rank_weighted(reversed, &[], weights, &retain);
        assert_eq!(names(&a), names(&b));
    }
}
