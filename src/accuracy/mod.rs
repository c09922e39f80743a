//! One-turn knock-out probability.
//!
//! Each track used against the target makes a single accuracy roll: all of its
//! gags hit together or miss together. The [`evaluator`] walks every hit/miss
//! combination of those rolls and reports each step to a [`TraceSink`]; the
//! scalar probability and the human-readable explanation are both derived
//! from that one walk.

pub mod evaluator;
pub mod trace;

pub use evaluator::{AccuracyRoll, Evaluator, HitChance, RoundState};
pub use trace::{KoTally, Outcome, Trace, TraceSink, TraceStep};

use std::collections::BTreeMap;

use crate::error::GagResult;
use crate::gag::{AffectsNum, GagInstance};
use crate::health::health;
use crate::track::Track;

/// Experience bonus assumed for any track a toon carries.
pub const TRACK_EXPERIENCE: i32 = 60;

/// Experience bonus for Toon-Up, which uses half the normal value.
pub const TOON_UP_EXPERIENCE: i32 = 30;

/// Upper bound on the accumulated stun bonus.
pub const MAX_STUN: i32 = 75;

/// Stun added per gag of a stunning track that hits.
pub const STUN_PER_HIT: i32 = 25;

/// Stun added when a trap is triggered.
pub const TRAP_STUN: i32 = 50;

/// Accuracy bonus a lure gets from a trap already placed.
pub const TRAP_LURE_BONUS: i32 = 10;

/// Accuracy ceiling, in percent.
pub const ACCURACY_MAX: i32 = 95;

/// Accuracy floor, in percent.
pub const ACCURACY_MIN: i32 = 5;

const DEFENSE_BY_LEVEL: [i32; 12] = [-2, -5, -10, -12, -15, -25, -30, -35, -40, -45, -50, -55];

/// Defense of a target of the given level, as an accuracy modifier.
#[must_use]
pub fn target_defense(level: u32) -> i32 {
    match level {
        0 => 0,
        1..=12 => DEFENSE_BY_LEVEL[(level - 1) as usize],
        13..=19 => -60,
        _ => -65,
    }
}

/// Clamps an accuracy value into `[5, 95]`.
#[must_use]
pub fn accuracy_cap(accuracy: i32) -> i32 {
    accuracy.clamp(ACCURACY_MIN, ACCURACY_MAX)
}

/// Experience bonus for a track that is in use.
#[must_use]
pub fn track_experience(track: Track) -> i32 {
    if track == Track::ToonUp {
        TOON_UP_EXPERIENCE
    } else {
        TRACK_EXPERIENCE
    }
}

/// Bonus for stacking several lures of the same target cardinality.
///
/// Within each cardinality group, every lure after the highest-level one adds
/// `max(10, 20 - 5 * level_gap)`.
#[must_use]
pub fn lure_combo_bonus(lures: &[&GagInstance]) -> i32 {
    if lures.len() <= 1 {
        return 0;
    }
    let mut groups: BTreeMap<AffectsNum, Vec<u8>> = BTreeMap::new();
    for lure in lures {
        groups.entry(lure.gag.affects_num).or_default().push(lure.level());
    }

    let mut bonus = 0;
    for levels in groups.values_mut() {
        if levels.len() <= 1 {
            continue;
        }
        levels.sort_unstable_by(|a, b| b.cmp(a));
        let highest = i32::from(levels[0]);
        for &level in &levels[1..] {
            let gap = (highest - i32::from(level)).max(0);
            bonus += (20 - gap * 5).max(10);
        }
    }
    bonus
}

/// Options for a probability evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccuracyOptions {
    /// The target starts the round lured.
    pub initial_lured: bool,
    /// Remaining hit points to use instead of full health.
    pub hp_override: Option<u32>,
}

impl AccuracyOptions {
    /// Options for a target that starts lured.
    #[must_use]
    pub fn lured() -> Self {
        Self {
            initial_lured: true,
            hp_override: None,
        }
    }

    /// Sets the remaining hit points.
    #[must_use]
    pub fn with_hp(mut self, hp: u32) -> Self {
        self.hp_override = Some(hp);
        self
    }
}

fn resolve_target(level: Option<u32>, opts: &AccuracyOptions) -> GagResult<(u32, u32)> {
    let level = level.unwrap_or(1);
    let hp = match opts.hp_override {
        Some(hp) => hp,
        None => health(level)?,
    };
    Ok((level, hp))
}

/// Probability that `gags`, used together in one round, knock out the target.
///
/// An absent level is treated as level 1. An empty selection has probability 0.
///
/// # Errors
///
/// Returns `CalcError::InvalidLevel` when the level is 0 and no hit-point
/// override is given.
pub fn ko_probability(gags: &[GagInstance], level: Option<u32>, opts: &AccuracyOptions) -> GagResult<f64> {
    if gags.is_empty() {
        return Ok(0.0);
    }
    let (level, hp) = resolve_target(level, opts)?;
    let evaluator = Evaluator::new(gags, level, hp, opts.initial_lured);
    let mut tally = KoTally::default();
    evaluator.run(&mut tally);
    Ok(tally.probability())
}

/// Records the full branch trace of a probability evaluation.
///
/// # Errors
///
/// Same conditions as [`ko_probability`].
pub fn trace(gags: &[GagInstance], level: Option<u32>, opts: &AccuracyOptions) -> GagResult<Trace> {
    let (level, hp) = resolve_target(level, opts)?;
    let evaluator = Evaluator::new(gags, level, hp, opts.initial_lured);
    let mut trace = Trace::new(&evaluator, opts.hp_override.is_some());
    evaluator.run(&mut trace);
    Ok(trace)
}

/// Human-readable explanation of how the KO probability was reached.
///
/// # Errors
///
/// Same conditions as [`ko_probability`].
pub fn explain(gags: &[GagInstance], level: Option<u32>, opts: &AccuracyOptions) -> GagResult<String> {
    if gags.is_empty() {
        return Ok("No gags selected.".to_string());
    }
    Ok(trace(gags, level, opts)?.render())
}
