//! Gag definitions and selected gag instances.
//!
//! A [`GagDefinition`] is an immutable catalog entry. A [`GagInstance`] is a
//! definition someone has selected, plus the organic/preview flags that only
//! make sense for a concrete selection.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::track::{DamageType, Track};

/// Default organic bonus fraction when a definition does not specify one.
pub const DEFAULT_ORGANIC_BONUS: f64 = 0.1;

/// Who a gag affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AffectsType {
    /// Targets cogs.
    Cog,
    /// Targets toons (heals).
    Toon,
}

/// How many targets a gag affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AffectsNum {
    /// Every target in the battle.
    All,
    /// One target.
    Single,
}

/// Identity of a gag for equality and lookup: `(track, level, name)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GagKey {
    /// Track of the gag.
    pub track: Track,
    /// Level (1-7).
    pub level: u8,
    /// Unique display name.
    pub name: String,
}

impl GagKey {
    /// Creates a key.
    #[must_use]
    pub fn new(track: Track, level: u8, name: impl Into<String>) -> Self {
        Self {
            track,
            level,
            name: name.into(),
        }
    }
}

impl fmt::Display for GagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.track, self.level, self.name)
    }
}

/// An immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GagDefinition {
    /// Unique display name.
    pub name: String,
    /// Track of the gag.
    pub track: Track,
    /// Level (1-7).
    pub level: u8,
    /// Base accuracy in percent.
    pub accuracy: i32,
    /// Who the gag affects.
    pub affects_type: AffectsType,
    /// How many targets the gag affects.
    pub affects_num: AffectsNum,
    /// Minimum damage (or heal).
    #[serde(default)]
    pub min_dmg: u32,
    /// Maximum damage (or heal).
    #[serde(default)]
    pub max_dmg: u32,
    /// Damage classification.
    pub dmg_type: DamageType,
    /// Fraction of `max_dmg` added by the organic variant.
    #[serde(default = "default_organic_bonus")]
    pub organic_bonus: f64,
    /// Experience needed to unlock this gag.
    #[serde(default)]
    pub min_xp: u32,
    /// Experience at which the next level unlocks.
    #[serde(default)]
    pub max_xp: u32,
}

fn default_organic_bonus() -> f64 {
    DEFAULT_ORGANIC_BONUS
}

impl GagDefinition {
    /// Returns the `(track, level, name)` identity of this gag.
    #[must_use]
    pub fn key(&self) -> GagKey {
        GagKey::new(self.track, self.level, self.name.clone())
    }

    /// Whether this definition has the identity `key`.
    #[must_use]
    pub fn matches(&self, key: &GagKey) -> bool {
        self.track == key.track && self.level == key.level && self.name == key.name
    }

    /// Compares by `(track, level, name)` without allocating a key.
    #[must_use]
    pub fn cmp_identity(&self, other: &Self) -> Ordering {
        self.track
            .cmp(&other.track)
            .then(self.level.cmp(&other.level))
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Unique identifier of a selected gag instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(uuid::Uuid);

impl InstanceId {
    /// Creates a new random instance ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A selected gag: a catalog definition plus selection flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GagInstance {
    /// Unique id of this selection.
    pub id: InstanceId,
    /// The catalog definition.
    #[serde(flatten)]
    pub gag: Arc<GagDefinition>,
    /// Organic variant: bonus damage, and bonus accuracy for lures.
    #[serde(default, rename = "isOrganic")]
    pub organic: bool,
    /// Transient preview rather than a committed selection.
    #[serde(default, rename = "isPreview")]
    pub preview: bool,
}

impl GagInstance {
    /// Creates a committed, non-organic instance with a fresh id.
    #[must_use]
    pub fn new(gag: Arc<GagDefinition>) -> Self {
        Self {
            id: InstanceId::new(),
            gag,
            organic: false,
            preview: false,
        }
    }

    /// Marks this instance as the organic variant.
    #[must_use]
    pub fn organic(mut self) -> Self {
        self.organic = true;
        self
    }

    /// Marks this instance as a transient preview.
    #[must_use]
    pub fn preview(mut self) -> Self {
        self.preview = true;
        self
    }

    /// Track of the underlying gag.
    #[must_use]
    pub fn track(&self) -> Track {
        self.gag.track
    }

    /// Level of the underlying gag.
    #[must_use]
    pub fn level(&self) -> u8 {
        self.gag.level
    }

    /// Name of the underlying gag.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.gag.name
    }

    /// Identity of the underlying gag.
    #[must_use]
    pub fn key(&self) -> GagKey {
        self.gag.key()
    }

    /// Damage dealt by this instance: `max(1, max_dmg + organic bonus)`.
    ///
    /// The organic bonus is `max(1, ceil(max_dmg * organic_bonus))`.
    #[must_use]
    pub fn damage(&self) -> u32 {
        let max_dmg = self.gag.max_dmg;
        let bonus = if self.organic {
            organic_bonus_damage(max_dmg, self.gag.organic_bonus)
        } else {
            0
        };
        max_dmg.saturating_add(bonus).max(1)
    }

    /// Accuracy of this instance before caps.
    ///
    /// Organic lures gain 10 points, limited to 95.
    #[must_use]
    pub fn accuracy(&self) -> i32 {
        if self.organic && self.gag.dmg_type == DamageType::Lure {
            self.gag.accuracy.saturating_add(10).min(95)
        } else {
            self.gag.accuracy
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn organic_bonus_damage(max_dmg: u32, fraction: f64) -> u32 {
    let raw = (f64::from(max_dmg) * fraction).ceil();
    if raw.is_finite() && raw > 1.0 {
        raw as u32
    } else {
        1
    }
}
