//! Damage resolution for a single round against a single target.
//!
//! Gags are grouped by track and resolved in canonical track order. A small
//! [`TargetStatus`] value is threaded through every gag: each resolution step
//! takes the current status and returns the next one.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::gag::GagInstance;
use crate::health::health;
use crate::track::{DamageType, Track};

/// Highest target level considered by [`max_killable_level`].
pub const MAX_TARGET_LEVEL: u32 = 20;

/// Transient target state for one damage-resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TargetStatus<'a> {
    /// Whether the target is currently lured.
    pub lured: bool,
    /// Trap placed in front of the target, waiting for a lure.
    pub pending_trap: Option<&'a GagInstance>,
    /// A trap already went off this round; later lures do nothing.
    pub trap_triggered: bool,
}

impl TargetStatus<'_> {
    /// A fresh status: not lured, no trap.
    #[must_use]
    pub fn new(lured: bool) -> Self {
        Self {
            lured,
            pending_trap: None,
            trap_triggered: false,
        }
    }

    /// A fresh status for a target that starts the round lured.
    #[must_use]
    pub fn lured() -> Self {
        Self::new(true)
    }
}

/// Damage subtotals for one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageResult {
    /// Raw damage from every gag.
    pub base_damage: u32,
    /// Bonus for using several gags of one track together.
    pub group_bonus: u32,
    /// Bonus for knocking a lured target out of its lure.
    pub lure_bonus: u32,
    /// `base_damage + group_bonus + lure_bonus`.
    pub total_damage: u32,
}

/// Resolves one gag against the current status.
fn resolve_gag<'a>(track: Track, gag: &'a GagInstance, status: TargetStatus<'a>) -> (u32, TargetStatus<'a>) {
    if track == Track::Trap {
        if status.lured {
            return (0, status);
        }
        // Only the first trap in resolution order counts.
        return (
            0,
            TargetStatus {
                pending_trap: status.pending_trap.or(Some(gag)),
                ..status
            },
        );
    }

    if track == Track::Drop && status.lured {
        return (0, status);
    }

    match track.dmg_type() {
        DamageType::Damage => (gag.damage(), status),
        DamageType::Lure => {
            if status.lured || status.trap_triggered {
                return (0, status);
            }
            if let Some(trap) = status.pending_trap {
                return (
                    trap.damage(),
                    TargetStatus {
                        pending_trap: None,
                        trap_triggered: true,
                        ..status
                    },
                );
            }
            (0, TargetStatus { lured: true, ..status })
        }
        DamageType::Heal => (0, status),
    }
}

/// Order in which gags are resolved: track, then level, name, organic flag
/// and damage. Of several traps, the first in this order is the live one.
pub(crate) fn resolution_order(a: &GagInstance, b: &GagInstance) -> Ordering {
    a.track()
        .cmp(&b.track())
        .then(a.level().cmp(&b.level()))
        .then_with(|| a.name().cmp(b.name()))
        .then(a.organic.cmp(&b.organic))
        .then_with(|| a.damage().cmp(&b.damage()))
}

/// Computes the damage dealt by `gags` in one round.
///
/// The result depends only on which gags are present, never on the order
/// they are given in. Totals saturate at `u32::MAX`.
pub fn total_damage<'a, I>(gags: I, initial: TargetStatus<'a>) -> DamageResult
where
    I: IntoIterator<Item = &'a GagInstance>,
{
    let mut ordered: Vec<&'a GagInstance> = gags.into_iter().collect();
    ordered.sort_by(|a, b| resolution_order(a, b));

    let mut status = initial;
    let mut result = DamageResult::default();

    for track_gags in ordered.chunk_by(|a, b| a.track() == b.track()) {
        let track = track_gags[0].track();
        let lured_on_entry = status.lured;

        let mut track_damage = 0u32;
        for gag in track_gags {
            let (dmg, next) = resolve_gag(track, gag, status);
            track_damage = track_damage.saturating_add(dmg);
            status = next;
        }

        if lured_on_entry && track.dmg_type() == DamageType::Damage && track_damage > 0 {
            status.lured = false;
            if track != Track::Sound {
                result.lure_bonus = result.lure_bonus.saturating_add(track_damage.div_ceil(2));
            }
        }

        if track_gags.iter().filter(|g| g.track() != Track::Lure).count() > 1 {
            result.group_bonus = result.group_bonus.saturating_add(track_damage.div_ceil(5));
        }

        result.base_damage = result.base_damage.saturating_add(track_damage);
    }

    result.total_damage = result
        .base_damage
        .saturating_add(result.group_bonus)
        .saturating_add(result.lure_bonus);
    result
}

/// Highest target level (1-20) whose health `gags` still reaches, or 0.
///
/// Scans upward and stops at the first level the set cannot knock out.
pub fn max_killable_level<'a, I>(gags: I, initial: TargetStatus<'a>) -> u32
where
    I: IntoIterator<Item = &'a GagInstance>,
{
    let damage = total_damage(gags, initial).total_damage;
    (1..=MAX_TARGET_LEVEL)
        .find(|&level| health(level).map_or(true, |hp| damage < hp))
        .map_or(MAX_TARGET_LEVEL, |level| level - 1)
}
