//! Attacker slots, per-slot track restrictions, and assignment feasibility.
//!
//! Every attacker can carry at most one missing track. Throw and Squirt are
//! always available. A proposed set of gags is feasible when each gag can be
//! handed to a distinct attacker that has its track.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::track::{PerTrack, Track};

/// Hard upper bound on attacker slots.
pub const MAX_ATTACKERS: usize = 16;

/// The one track an attacker lacks, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToonRestriction {
    /// Has every track.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Lacks Toon-Up.
    #[serde(rename = "toonup-less")]
    ToonUpLess,
    /// Lacks Trap.
    #[serde(rename = "trapless")]
    Trapless,
    /// Lacks Lure.
    #[serde(rename = "lureless")]
    Lureless,
    /// Lacks Sound.
    #[serde(rename = "soundless")]
    Soundless,
    /// Lacks Drop.
    #[serde(rename = "dropless")]
    Dropless,
}

impl ToonRestriction {
    /// Wire name of the restriction.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ToonUpLess => "toonup-less",
            Self::Trapless => "trapless",
            Self::Lureless => "lureless",
            Self::Soundless => "soundless",
            Self::Dropless => "dropless",
        }
    }

    /// The track this attacker lacks.
    #[must_use]
    pub const fn missing_track(self) -> Option<Track> {
        match self {
            Self::None => None,
            Self::ToonUpLess => Some(Track::ToonUp),
            Self::Trapless => Some(Track::Trap),
            Self::Lureless => Some(Track::Lure),
            Self::Soundless => Some(Track::Sound),
            Self::Dropless => Some(Track::Drop),
        }
    }

    /// Whether an attacker with this restriction can use `track`.
    #[must_use]
    pub fn allows(self, track: Track) -> bool {
        if matches!(track, Track::Throw | Track::Squirt) {
            return true;
        }
        self.missing_track() != Some(track)
    }
}

impl fmt::Display for ToonRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToonRestriction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "toonup-less" | "toonupless" => Ok(Self::ToonUpLess),
            "trapless" => Ok(Self::Trapless),
            "lureless" => Ok(Self::Lureless),
            "soundless" => Ok(Self::Soundless),
            "dropless" => Ok(Self::Dropless),
            _ => Err(ValidationError::UnknownRestriction { name: s.to_string() }),
        }
    }
}

/// How many gags of each track the roster can field in one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackCapacity(PerTrack<usize>);

impl TrackCapacity {
    /// Capacity of `track`.
    #[must_use]
    pub fn get(&self, track: Track) -> usize {
        self.0.get(track)
    }
}

/// The attackers available for a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    slots: Vec<ToonRestriction>,
}

impl Roster {
    /// Builds a roster of `size` attackers.
    ///
    /// `restrictions` is padded with [`ToonRestriction::None`] or truncated to
    /// fit; `size` is limited to [`MAX_ATTACKERS`].
    #[must_use]
    pub fn new(restrictions: impl IntoIterator<Item = ToonRestriction>, size: usize) -> Self {
        let size = size.min(MAX_ATTACKERS);
        let mut slots: Vec<ToonRestriction> = restrictions.into_iter().take(size).collect();
        slots.resize(size, ToonRestriction::None);
        Self { slots }
    }

    /// A roster of `size` attackers with every track.
    #[must_use]
    pub fn unrestricted(size: usize) -> Self {
        Self::new(std::iter::empty(), size)
    }

    /// Number of attackers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the roster has no attackers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Per-slot restrictions.
    #[must_use]
    pub fn slots(&self) -> &[ToonRestriction] {
        &self.slots
    }

    fn choices(&self, track: Track) -> usize {
        self.slots.iter().filter(|r| r.allows(track)).count()
    }

    /// Per-track capacity; disabled tracks get 0 and Trap is capped at 1.
    #[must_use]
    pub fn capacity(&self, enabled: &PerTrack<bool>) -> TrackCapacity {
        let mut capacity = PerTrack::splat(0);
        for track in Track::ALL {
            if enabled.get(track) {
                capacity.set(track, self.choices(track));
            }
        }
        // Single target, single trap.
        capacity.set(Track::Trap, capacity.get(Track::Trap).min(1));
        TrackCapacity(capacity)
    }

    /// Whether every gag track in `tracks` can go to a distinct attacker.
    #[must_use]
    pub fn can_assign(&self, tracks: &[Track]) -> bool {
        if tracks.len() > self.slots.len() {
            return false;
        }

        // Least flexible first.
        let mut ordered = tracks.to_vec();
        ordered.sort_by_key(|track| self.choices(*track));
        self.assign(&ordered, 0)
    }

    fn assign(&self, tracks: &[Track], used: u32) -> bool {
        let Some((&track, rest)) = tracks.split_first() else {
            return true;
        };
        self.slots.iter().enumerate().any(|(slot, restriction)| {
            let bit = 1u32 << slot;
            used & bit == 0 && restriction.allows(track) && self.assign(rest, used | bit)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throw_and_squirt_are_always_allowed() {
        for restriction in [
            ToonRestriction::None,
            ToonRestriction::ToonUpLess,
            ToonRestriction::Trapless,
            ToonRestriction::Lureless,
            ToonRestriction::Soundless,
            ToonRestriction::Dropless,
        ] {
            assert!(restriction.allows(Track::Throw));
            assert!(restriction.allows(Track::Squirt));
        }
        assert!(!ToonRestriction::Dropless.allows(Track::Drop));
        assert!(ToonRestriction::Dropless.allows(Track::Sound));
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("trapless".parse::<ToonRestriction>().unwrap(), ToonRestriction::Trapless);
        assert_eq!(" Toonup-Less ".parse::<ToonRestriction>().unwrap(), ToonRestriction::ToonUpLess);
        assert!("throwless".parse::<ToonRestriction>().is_err());
        let json = serde_json::to_string(&ToonRestriction::Soundless).unwrap();
        assert_eq!(json, "\"soundless\"");
    }

    #[test]
    fn roster_is_padded_and_truncated() {
        let roster = Roster::new([ToonRestriction::Lureless], 3);
        assert_eq!(
            roster.slots(),
            &[ToonRestriction::Lureless, ToonRestriction::None, ToonRestriction::None]
        );
        let roster = Roster::new([ToonRestriction::Lureless, ToonRestriction::Dropless], 1);
        assert_eq!(roster.len(), 1);
        assert_eq!(Roster::unrestricted(40).len(), MAX_ATTACKERS);
    }

    #[test]
    fn capacity_counts_slots_and_caps_trap() {
        let roster = Roster::new(
            [
                ToonRestriction::Soundless,
                ToonRestriction::Soundless,
                ToonRestriction::None,
                ToonRestriction::Trapless,
            ],
            4,
        );
        let mut enabled = PerTrack::splat(true);
        enabled.set(Track::Drop, false);
        let capacity = roster.capacity(&enabled);

        assert_eq!(capacity.get(Track::Sound), 2);
        assert_eq!(capacity.get(Track::Throw), 4);
        assert_eq!(capacity.get(Track::Trap), 1);
        assert_eq!(capacity.get(Track::Drop), 0);
    }

    #[test]
    fn assignment_respects_restrictions() {
        let roster = Roster::new(
            [
                ToonRestriction::Soundless,
                ToonRestriction::Soundless,
                ToonRestriction::None,
                ToonRestriction::None,
            ],
            4,
        );
        assert!(roster.can_assign(&[Track::Sound, Track::Sound, Track::Throw, Track::Throw]));
        assert!(!roster.can_assign(&[Track::Sound, Track::Sound, Track::Sound]));
        assert!(!roster.can_assign(&[Track::Throw; 5]));
        assert!(roster.can_assign(&[]));
    }

    #[test]
    fn assignment_needs_backtracking() {
        // Greedy placement of Throw into the only Sound-capable slot fails.
        let roster = Roster::new([ToonRestriction::None, ToonRestriction::Soundless], 2);
        assert!(roster.can_assign(&[Track::Throw, Track::Sound]));
        assert!(roster.can_assign(&[Track::Sound, Track::Throw]));
    }
}
