//! Sort weights and per-gag retain weights.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::gag::GagKey;
use crate::track::Track::{self, Drop, Lure, Sound, Squirt, Throw, ToonUp, Trap};

/// Retain weight for a gag with no entry.
pub const DEFAULT_RETAIN_WEIGHT: f64 = 0.5;

/// How options are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Highest knock-out probability first.
    #[default]
    Accuracy,
    /// Lowest gag levels first.
    Conserve,
    /// Blend of accuracy, conservation and track count.
    Weighted,
}

impl SortMode {
    /// Parses a wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "accuracy" => Some(Self::Accuracy),
            "conserve" => Some(Self::Conserve),
            "weighted" => Some(Self::Weighted),
            _ => None,
        }
    }
}

/// Component weights for [`SortMode::Weighted`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SortWeights {
    /// Weight of the knock-out probability.
    pub accuracy: f64,
    /// Weight of conserving high-level gags.
    pub conserve: f64,
    /// Weight of using few distinct tracks.
    pub tracks: f64,
}

impl Default for SortWeights {
    fn default() -> Self {
        Self {
            accuracy: 1.0,
            conserve: 1.0,
            tracks: 1.0,
        }
    }
}

impl SortWeights {
    /// Preset that leans on accuracy and spends gags freely.
    #[must_use]
    pub fn recommended() -> Self {
        Self {
            accuracy: 0.5,
            conserve: 0.05,
            tracks: 0.3,
        }
    }

    /// Replaces non-finite components with the default and negatives with 0.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let fallback = Self::default();
        Self {
            accuracy: clean_weight(self.accuracy, fallback.accuracy),
            conserve: clean_weight(self.conserve, fallback.conserve),
            tracks: clean_weight(self.tracks, fallback.tracks),
        }
    }
}

fn clean_weight(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        fallback
    }
}

/// Clamps into `[0, 1]`; non-finite values become 0.
#[must_use]
pub fn clamp01(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// 0 = spend freely, 1 = strongly keep.
const STANDARD_RETAIN: [(Track, u8, &str, f64); 49] = [
    (ToonUp, 1, "Feather", 0.05),
    (ToonUp, 2, "Megaphone", 0.08),
    (ToonUp, 3, "Lipstick", 0.12),
    (ToonUp, 4, "Bamboo Cane", 0.18),
    (ToonUp, 5, "Pixie Dust", 0.25),
    (ToonUp, 6, "Juggling Balls", 0.35),
    (ToonUp, 7, "High Dive", 1.0),
    (Trap, 1, "Banana Peel", 0.0),
    (Trap, 2, "Rake", 0.0),
    (Trap, 3, "Marbles", 0.01),
    (Trap, 4, "Quicksand", 0.02),
    (Trap, 5, "Trapdoor", 0.03),
    (Trap, 6, "TNT", 0.05),
    (Trap, 7, "Railroad", 1.0),
    (Lure, 1, "$1 Bill", 0.0),
    (Lure, 2, "Small Magnet", 0.0),
    (Lure, 3, "$5 Bill", 0.01),
    (Lure, 4, "Big Magnet", 0.02),
    (Lure, 5, "$10 Bill", 0.05),
    (Lure, 6, "Hypno Goggles", 0.06),
    (Lure, 7, "Presentation", 1.0),
    (Sound, 1, "Bike Horn", 0.0),
    (Sound, 2, "Whistle", 0.0),
    (Sound, 3, "Bugle", 0.01),
    (Sound, 4, "Aoogah", 0.02),
    (Sound, 5, "Elephant Trunk", 0.04),
    (Sound, 6, "Foghorn", 0.10),
    (Sound, 7, "Opera Singer", 1.0),
    (Throw, 1, "Cupcake", 0.02),
    (Throw, 2, "Fruit Pie Slice", 0.04),
    (Throw, 3, "Cream Pie Slice", 0.06),
    (Throw, 4, "Whole Fruit Pie", 0.10),
    (Throw, 5, "Whole Cream Pie", 0.18),
    (Throw, 6, "Birthday Cake", 0.30),
    (Throw, 7, "Wedding Cake", 1.0),
    (Squirt, 1, "Squirting Flower", 0.005),
    (Squirt, 2, "Glass of Water", 0.02),
    (Squirt, 3, "Squirt Gun", 0.04),
    (Squirt, 4, "Seltzer Bottle", 0.07),
    (Squirt, 5, "Fire Hose", 0.1),
    (Squirt, 6, "Storm Cloud", 0.2),
    (Squirt, 7, "Geyser", 1.0),
    (Drop, 1, "Flower Pot", 0.02),
    (Drop, 2, "Sandbag", 0.03),
    (Drop, 3, "Anvil", 0.05),
    (Drop, 4, "Big Weight", 0.08),
    (Drop, 5, "Safe", 0.12),
    (Drop, 6, "Grand Piano", 0.2),
    (Drop, 7, "Toontanic", 1.0),
];

/// Per-gag "importance to keep" weights in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetainWeights {
    weights: HashMap<GagKey, f64>,
}

impl RetainWeights {
    /// An empty table; every lookup returns [`DEFAULT_RETAIN_WEIGHT`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table for the standard catalog.
    #[must_use]
    pub fn standard() -> Self {
        let weights = STANDARD_RETAIN
            .iter()
            .map(|&(track, level, name, weight)| (GagKey::new(track, level, name), weight))
            .collect();
        Self { weights }
    }

    /// Sets the weight of `key`, clamped into `[0, 1]`.
    pub fn set(&mut self, key: GagKey, weight: f64) {
        self.weights.insert(key, clamp01(weight));
    }

    /// Returns this table with `overrides` applied on top.
    #[must_use]
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = (GagKey, f64)>) -> Self {
        for (key, weight) in overrides {
            self.set(key, weight);
        }
        self
    }

    /// Weight of `key`, or [`DEFAULT_RETAIN_WEIGHT`] when absent.
    #[must_use]
    pub fn get(&self, key: &GagKey) -> f64 {
        self.weights.get(key).copied().unwrap_or(DEFAULT_RETAIN_WEIGHT)
    }

    /// Number of explicit entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether there are no explicit entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::GagCatalog;

    #[test]
    fn standard_table_covers_catalog() {
        let weights = RetainWeights::standard();
        for gag in GagCatalog::standard().iter() {
            let w = weights.get(&gag.key());
            assert!((0.0..=1.0).contains(&w), "{}", gag.key());
        }
        assert_eq!(weights.len(), 49);
        assert!((weights.get(&GagKey::new(Throw, 5, "Whole Cream Pie")) - 0.18).abs() < 1e-12);
    }

    #[test]
    fn overrides_are_clamped_and_missing_keys_default() {
        let weights = RetainWeights::standard().with_overrides([
            (GagKey::new(Throw, 5, "Whole Cream Pie"), 3.0),
            (GagKey::new(Drop, 6, "Grand Piano"), f64::NAN),
        ]);
        assert!((weights.get(&GagKey::new(Throw, 5, "Whole Cream Pie")) - 1.0).abs() < 1e-12);
        assert!(weights.get(&GagKey::new(Drop, 6, "Grand Piano")).abs() < 1e-12);
        assert!((weights.get(&GagKey::new(Throw, 5, "Custard")) - DEFAULT_RETAIN_WEIGHT).abs() < 1e-12);
    }

    #[test]
    fn sort_weights_sanitize() {
        let w = SortWeights {
            accuracy: -2.0,
            conserve: f64::INFINITY,
            tracks: 0.25,
        }
        .sanitized();
        assert!(w.accuracy.abs() < 1e-12);
        assert!((w.conserve - 1.0).abs() < 1e-12);
        assert!((w.tracks - 0.25).abs() < 1e-12);
    }

    #[test]
    fn sort_mode_names() {
        assert_eq!(SortMode::from_name("weighted"), Some(SortMode::Weighted));
        assert_eq!(SortMode::from_name("fastest"), None);
        assert_eq!(serde_json::to_string(&SortMode::Conserve).unwrap(), "\"conserve\"");
    }
}
