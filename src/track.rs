//! Gag tracks and their static metadata.
//!
//! Track order is significant: it is the sequence in which tracks resolve
//! within a round. Both the damage and the accuracy engines iterate tracks
//! in this order, so shuffling the input gags never changes a result.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalcError;

/// One of the seven gag categories.
///
/// Variants are declared in canonical resolution order, so the derived
/// `Ord` is the resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Track {
    /// Heals toons; never participates in combat resolution.
    #[serde(rename = "Toonup", alias = "ToonUp", alias = "Toon-Up")]
    ToonUp,
    /// Placed in front of the target, triggered by a later lure.
    Trap,
    /// Lures the target; lured targets take bonus damage.
    Lure,
    /// Hits every target, wakes lured targets without a lure bonus.
    Sound,
    /// Single-target damage.
    Throw,
    /// Single-target damage.
    Squirt,
    /// Heavy damage that always misses a lured target.
    Drop,
}

/// Damage classification of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    /// Deals damage to the target.
    Damage,
    /// Heals toons.
    Heal,
    /// Changes the target's lured state.
    Lure,
}

/// Static metadata about a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackInfo {
    /// The track described.
    pub track: Track,
    /// Resolution order (0 = first).
    pub order: u8,
    /// Damage classification.
    pub dmg_type: DamageType,
}

impl Track {
    /// All tracks in canonical resolution order.
    pub const ALL: [Self; 7] = [
        Self::ToonUp,
        Self::Trap,
        Self::Lure,
        Self::Sound,
        Self::Throw,
        Self::Squirt,
        Self::Drop,
    ];

    /// Tracks whose successful hits add stun to later tracks.
    pub const STUN: [Self; 4] = [Self::Sound, Self::Throw, Self::Squirt, Self::Drop];

    /// Display / key name, matching the catalog's `"Track:Level:Name"` keys.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ToonUp => "Toonup",
            Self::Trap => "Trap",
            Self::Lure => "Lure",
            Self::Sound => "Sound",
            Self::Throw => "Throw",
            Self::Squirt => "Squirt",
            Self::Drop => "Drop",
        }
    }

    /// Position in the resolution order.
    #[must_use]
    pub const fn order(self) -> u8 {
        self as u8
    }

    /// Index usable for fixed-size per-track tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Damage classification of this track.
    #[must_use]
    pub const fn dmg_type(self) -> DamageType {
        match self {
            Self::ToonUp => DamageType::Heal,
            Self::Lure => DamageType::Lure,
            Self::Trap | Self::Sound | Self::Throw | Self::Squirt | Self::Drop => {
                DamageType::Damage
            }
        }
    }

    /// Full metadata record for this track.
    #[must_use]
    pub const fn info(self) -> TrackInfo {
        TrackInfo {
            track: self,
            order: self.order(),
            dmg_type: self.dmg_type(),
        }
    }

    /// Whether a hit from this track stuns the target.
    #[must_use]
    pub fn stuns(self) -> bool {
        Self::STUN.contains(&self)
    }

    /// Whether this track auto-hits a lured target.
    #[must_use]
    pub const fn auto_hits_lured(self) -> bool {
        matches!(self, Self::Sound | Self::Throw | Self::Squirt)
    }

    /// Whether this track takes part in the round's combat resolution.
    #[must_use]
    pub const fn is_combat(self) -> bool {
        !matches!(self, Self::ToonUp)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Track {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_' && !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "toonup" => Ok(Self::ToonUp),
            "trap" => Ok(Self::Trap),
            "lure" => Ok(Self::Lure),
            "sound" => Ok(Self::Sound),
            "throw" => Ok(Self::Throw),
            "squirt" => Ok(Self::Squirt),
            "drop" => Ok(Self::Drop),
            _ => Err(CalcError::UnknownTrack { name: s.to_string() }),
        }
    }
}

/// A fixed-size table holding one value per track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PerTrack<T>([T; 7]);

impl<T: Copy> PerTrack<T> {
    /// Creates a table with every track set to `value`.
    #[must_use]
    pub const fn splat(value: T) -> Self {
        Self([value; 7])
    }

    /// Returns the value stored for `track`.
    #[must_use]
    pub const fn get(&self, track: Track) -> T {
        self.0[track.index()]
    }

    /// Stores `value` for `track`.
    pub fn set(&mut self, track: Track, value: T) {
        self.0[track.index()] = value;
    }

    /// Iterates `(track, value)` pairs in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (Track, T)> + '_ {
        Track::ALL.iter().map(move |t| (*t, self.get(*t)))
    }
}

impl PerTrack<usize> {
    /// Increments the counter for `track`.
    pub fn bump(&mut self, track: Track) {
        self.0[track.index()] += 1;
    }

    /// Decrements the counter for `track`, saturating at zero.
    pub fn unbump(&mut self, track: Track) {
        let slot = &mut self.0[track.index()];
        *slot = slot.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_matches_resolution_sequence() {
        let combat: Vec<Track> = Track::ALL.iter().copied().filter(|t| t.is_combat()).collect();
        assert_eq!(
            combat,
            vec![
                Track::Trap,
                Track::Lure,
                Track::Sound,
                Track::Throw,
                Track::Squirt,
                Track::Drop
            ]
        );
        assert!(Track::Trap < Track::Lure);
        assert!(Track::Squirt < Track::Drop);
    }

    #[test]
    fn damage_types() {
        assert_eq!(Track::ToonUp.dmg_type(), DamageType::Heal);
        assert_eq!(Track::Lure.dmg_type(), DamageType::Lure);
        assert_eq!(Track::Trap.dmg_type(), DamageType::Damage);
        assert_eq!(Track::Drop.info().dmg_type, DamageType::Damage);
    }

    #[test]
    fn parses_track_names_leniently() {
        assert_eq!("Toonup".parse::<Track>().unwrap(), Track::ToonUp);
        assert_eq!("toon-up".parse::<Track>().unwrap(), Track::ToonUp);
        assert_eq!(" SQUIRT ".parse::<Track>().unwrap(), Track::Squirt);
        let err = "Juggle".parse::<Track>().unwrap_err();
        assert_eq!(
            err,
            CalcError::UnknownTrack {
                name: "Juggle".to_string()
            }
        );
    }

    #[test]
    fn serde_uses_catalog_names() {
        let json = serde_json::to_string(&Track::ToonUp).unwrap();
        assert_eq!(json, "\"Toonup\"");
        let t: Track = serde_json::from_str("\"ToonUp\"").unwrap();
        assert_eq!(t, Track::ToonUp);
    }

    #[test]
    fn per_track_counters() {
        let mut counts = PerTrack::<usize>::default();
        counts.bump(Track::Throw);
        counts.bump(Track::Throw);
        counts.unbump(Track::Drop);
        assert_eq!(counts.get(Track::Throw), 2);
        assert_eq!(counts.get(Track::Drop), 0);
    }
}
