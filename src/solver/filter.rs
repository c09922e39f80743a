//! Hiding options that only add overkill.
//!
//! Probabilities are compared in 0.1% bins, the precision they are shown at.

use std::collections::{HashMap, HashSet};

use crate::gag::GagKey;
use crate::track::PerTrack;

use super::FillOption;

/// Probability rounded to the nearest 0.1%, as an integer bin.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn probability_bin(probability: f64) -> i64 {
    (probability * 1000.0).round() as i64
}

/// Applies both filters in order.
#[must_use]
pub fn hide_overkill_additions(options: Vec<FillOption>) -> Vec<FillOption> {
    drop_dominated_supersets(collapse_equivalent(options))
}

fn conserves_better(candidate: &FillOption, incumbent: &FillOption) -> bool {
    let rank = |o: &FillOption| (o.max_level(), o.level_sum(), o.overkill, o.total_damage);
    rank(candidate) < rank(incumbent)
}

/// Keeps one option per (size, track composition, probability bin).
///
/// The survivor is the one spending the lowest levels; the first one seen
/// wins full ties. Survivors keep the position of the first option in their
/// group.
#[must_use]
pub fn collapse_equivalent(options: Vec<FillOption>) -> Vec<FillOption> {
    let mut slots: HashMap<(usize, PerTrack<usize>, i64), usize> = HashMap::new();
    let mut kept: Vec<FillOption> = Vec::new();

    for option in options {
        let key = (
            option.added.len(),
            option.track_counts(),
            probability_bin(option.accuracy),
        );
        match slots.get(&key) {
            Some(&idx) => {
                if conserves_better(&option, &kept[idx]) {
                    kept[idx] = option;
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(option);
            }
        }
    }
    kept
}

/// Drops options that have a proper sub-multiset among `options` with an
/// equal or better probability bin. The empty addition counts as a subset.
#[must_use]
pub fn drop_dominated_supersets(options: Vec<FillOption>) -> Vec<FillOption> {
    let bins: HashMap<Vec<GagKey>, i64> = options
        .iter()
        .map(|o| (o.exact_key(), probability_bin(o.accuracy)))
        .collect();

    options
        .into_iter()
        .filter(|option| !is_dominated(option, &bins))
        .collect()
}

fn is_dominated(option: &FillOption, bins: &HashMap<Vec<GagKey>, i64>) -> bool {
    let n = option.added.len();
    if n == 0 {
        return false;
    }
    let own = probability_bin(option.accuracy);
    let keys: Vec<GagKey> = option.added.iter().map(|g| g.key()).collect();
    let full: u64 = (1u64 << n) - 1;

    let mut seen: HashSet<Vec<GagKey>> = HashSet::new();
    for mask in 0..full {
        let mut subset: Vec<GagKey> = (0..n)
            .filter(|i| mask & (1u64 << i) != 0)
            .map(|i| keys[i].clone())
            .collect();
        subset.sort();
        if !seen.insert(subset.clone()) {
            continue;
        }
        if bins.get(&subset).is_some_and(|&bin| bin >= own) {
            return true;
        }
    }
    false
}
