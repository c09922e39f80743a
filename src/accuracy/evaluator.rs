//! Branch-enumerating evaluator.

use std::collections::BTreeMap;
use std::fmt;

use crate::damage::{resolution_order, total_damage, TargetStatus};
use crate::gag::GagInstance;
use crate::track::Track;

use super::trace::{Outcome, TraceSink, TraceStep};
use super::{
    accuracy_cap, lure_combo_bonus, target_defense, track_experience, MAX_STUN, STUN_PER_HIT,
    TRAP_LURE_BONUS, TRAP_STUN,
};

/// State carried from one track roll to the next within a branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundState {
    /// Accumulated stun bonus, at most `MAX_STUN`.
    pub stun: i32,
    /// Whether the target is lured at this point of the round.
    pub lured: bool,
}

impl RoundState {
    fn stunned_by(self, amount: i32) -> Self {
        Self {
            stun: self.stun.saturating_add(amount).min(MAX_STUN),
            ..self
        }
    }
}

/// The terms of a rolled accuracy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccuracyRoll {
    /// Track rolling.
    pub track: Track,
    /// Best accuracy among the track's gags.
    pub base: i32,
    /// Track experience bonus.
    pub experience: i32,
    /// Target defense (negative).
    pub defense: i32,
    /// Trap bonus; only meaningful for Lure.
    pub trap_bonus: i32,
    /// Stacked-lure bonus; only meaningful for Lure.
    pub lure_combo: i32,
    /// Stun accumulated before this roll.
    pub stun: i32,
    /// Final accuracy after capping.
    pub capped: i32,
}

impl fmt::Display for AccuracyRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hit% = cap(base {} + exp {} + def {}",
            self.track, self.base, self.experience, self.defense
        )?;
        if self.track == Track::Lure {
            write!(f, " + trapBonus {} + lureCombo {}", self.trap_bonus, self.lure_combo)?;
        }
        write!(f, " + stun {}) = {}%", self.stun, self.capped)
    }
}

/// How a track's hit chance was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitChance {
    /// Lure against a target that is already lured; a guaranteed no-op.
    AlreadyLured,
    /// Lured target, track that always connects.
    AutoHit {
        /// Track rolling.
        track: Track,
    },
    /// Lured target, Drop always whiffs.
    AutoMiss {
        /// Track rolling.
        track: Track,
    },
    /// A regular accuracy roll.
    Rolled(AccuracyRoll),
}

impl HitChance {
    /// Probability that the track hits.
    #[must_use]
    pub fn probability(&self) -> f64 {
        match self {
            Self::AlreadyLured | Self::AutoHit { .. } => 1.0,
            Self::AutoMiss { .. } => 0.0,
            Self::Rolled(roll) => f64::from(roll.capped) / 100.0,
        }
    }
}

impl fmt::Display for HitChance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyLured => f.write_str("Lure: target already lured => treated as no-op (100%)"),
            Self::AutoHit { track } => write!(f, "{track}: target is lured => auto-hit (100%)"),
            Self::AutoMiss { track } => write!(f, "{track}: target is lured => auto-miss (0%)"),
            Self::Rolled(roll) => roll.fmt(f),
        }
    }
}

/// Walks every hit/miss combination of the track rolls for one gag set.
#[derive(Debug, Clone)]
pub struct Evaluator<'g> {
    level: u32,
    hp: u32,
    defense: i32,
    initial_lured: bool,
    tracks: Vec<(Track, Vec<&'g GagInstance>)>,
    lures: Vec<&'g GagInstance>,
    trap: Option<&'g GagInstance>,
}

impl<'g> Evaluator<'g> {
    /// Prepares an evaluation of `gags` against a target with `hp` hit points.
    #[must_use]
    pub fn new(gags: &'g [GagInstance], level: u32, hp: u32, initial_lured: bool) -> Self {
        let mut by_track: BTreeMap<Track, Vec<&'g GagInstance>> = BTreeMap::new();
        for gag in gags {
            by_track.entry(gag.track()).or_default().push(gag);
        }

        // At most one trap is ever live on a target.
        let trap = by_track
            .get(&Track::Trap)
            .and_then(|traps| traps.iter().copied().min_by(|a, b| resolution_order(a, b)));
        let lures = by_track.get(&Track::Lure).cloned().unwrap_or_default();
        let tracks = by_track
            .into_iter()
            .filter(|(track, _)| track.is_combat() && *track != Track::Trap)
            .collect();

        Self {
            level,
            hp,
            defense: target_defense(level),
            initial_lured,
            tracks,
            lures,
            trap,
        }
    }

    /// Target level.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Hit points needed for a knock-out.
    #[must_use]
    pub fn hp(&self) -> u32 {
        self.hp
    }

    /// Target defense modifier.
    #[must_use]
    pub fn defense(&self) -> i32 {
        self.defense
    }

    /// Whether the target starts lured.
    #[must_use]
    pub fn initial_lured(&self) -> bool {
        self.initial_lured
    }

    /// Whether a trap is part of the set.
    #[must_use]
    pub fn has_trap(&self) -> bool {
        self.trap.is_some()
    }

    /// Tracks that roll, in resolution order.
    pub fn tracks(&self) -> impl Iterator<Item = Track> + '_ {
        self.tracks.iter().map(|(track, _)| *track)
    }

    /// Hit chance of `track` given the state reached so far.
    #[must_use]
    pub fn hit_chance(&self, track: Track, state: RoundState) -> HitChance {
        if track == Track::Lure {
            if state.lured {
                return HitChance::AlreadyLured;
            }
            let trap_bonus = if self.trap.is_some() { TRAP_LURE_BONUS } else { 0 };
            return HitChance::Rolled(self.roll(track, &self.lures, state, trap_bonus, lure_combo_bonus(&self.lures)));
        }

        if state.lured && track.auto_hits_lured() {
            return HitChance::AutoHit { track };
        }
        if state.lured && track == Track::Drop {
            return HitChance::AutoMiss { track };
        }

        let gags = self
            .tracks
            .iter()
            .find(|(t, _)| *t == track)
            .map_or(&[][..], |(_, gags)| gags.as_slice());
        HitChance::Rolled(self.roll(track, gags, state, 0, 0))
    }

    fn roll(&self, track: Track, gags: &[&GagInstance], state: RoundState, trap_bonus: i32, lure_combo: i32) -> AccuracyRoll {
        let base = gags.iter().map(|g| g.accuracy()).fold(0, i32::max);
        let experience = track_experience(track);
        let raw = [experience, self.defense, trap_bonus, lure_combo, state.stun]
            .into_iter()
            .fold(base, i32::saturating_add);
        AccuracyRoll {
            track,
            base,
            experience,
            defense: self.defense,
            trap_bonus,
            lure_combo,
            stun: state.stun,
            capped: accuracy_cap(raw),
        }
    }

    /// Runs the full enumeration, reporting every step to `sink`.
    pub fn run<S: TraceSink + ?Sized>(&self, sink: &mut S) {
        let start = RoundState {
            stun: 0,
            lured: self.initial_lured,
        };
        let mut hits = Vec::new();
        self.descend(0, start, 1.0, &mut hits, sink);
    }

    fn descend<S: TraceSink + ?Sized>(
        &self,
        depth: usize,
        state: RoundState,
        probability: f64,
        hits: &mut Vec<&'g GagInstance>,
        sink: &mut S,
    ) {
        if probability <= 0.0 {
            return;
        }

        let Some((track, gags)) = self.tracks.get(depth) else {
            let damage = total_damage(hits.iter().copied(), TargetStatus::new(self.initial_lured)).total_damage;
            sink.record(TraceStep::Leaf {
                depth,
                damage,
                hp: self.hp,
                ko: damage >= self.hp,
                probability,
            });
            return;
        };

        let chance = self.hit_chance(*track, state);
        let p = chance.probability();
        sink.record(TraceStep::Roll {
            depth,
            track: *track,
            chance,
        });

        let mark = hits.len();
        let on_hit = self.apply_hit(*track, gags, state, hits);
        sink.record(TraceStep::Branch {
            depth,
            outcome: Outcome::Hit,
            probability: p,
        });
        self.descend(depth + 1, on_hit, probability * p, hits, sink);
        hits.truncate(mark);

        sink.record(TraceStep::Branch {
            depth,
            outcome: Outcome::Miss,
            probability: 1.0 - p,
        });
        self.descend(depth + 1, state, probability * (1.0 - p), hits, sink);
    }

    /// State after `track` hits; pushes the gags that connected onto `hits`.
    fn apply_hit(&self, track: Track, gags: &[&'g GagInstance], state: RoundState, hits: &mut Vec<&'g GagInstance>) -> RoundState {
        if track == Track::Lure {
            hits.extend_from_slice(&self.lures);
            if state.lured {
                return state;
            }
            return match self.trap {
                Some(trap) => {
                    hits.push(trap);
                    RoundState {
                        lured: false,
                        ..state.stunned_by(TRAP_STUN)
                    }
                }
                None => RoundState { lured: true, ..state },
            };
        }

        hits.extend_from_slice(gags);
        let mut next = state;
        if track.stuns() {
            let count = i32::try_from(gags.len()).unwrap_or(i32::MAX);
            next = next.stunned_by(STUN_PER_HIT.saturating_mul(count));
        }
        // First damaging hit ends the lure.
        next.lured = false;
        next
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

    #[derive(Default)]
    struct Recorder(Vec<TraceStep>);

    impl TraceSink for Recorder {
        fn record(&mut self, step: TraceStep) {
            self.0.push(step);
        }
    }

    #[test]
    fn trap_and_toon_up_do_not_roll() {
        let gags = vec![
            gag(Track::ToonUp, 2, "Megaphone"),
            gag(Track::Trap, 3, "Marbles"),
            gag(Track::Lure, 3, "$5 Bill"),
            gag(Track::Squirt, 2, "Glass of Water"),
        ];
        let evaluator = Evaluator::new(&gags, 5, 42, false);
        let tracks: Vec<Track> = evaluator.tracks().collect();
        assert_eq!(tracks, vec![Track::Lure, Track::Squirt]);
        assert!(evaluator.has_trap());
    }

    #[test]
    fn lure_roll_includes_trap_and_combo() {
        let gags = vec![
            gag(Track::Trap, 1, "Banana Peel"),
            gag(Track::Lure, 5, "$10 Bill"),
            gag(Track::Lure, 5, "$10 Bill"),
        ];
        let evaluator = Evaluator::new(&gags, 12, 196, false);
        let chance = evaluator.hit_chance(Track::Lure, RoundState::default());
        let HitChance::Rolled(roll) = chance else {
            panic!("expected a rolled chance, got {chance:?}");
        };
        assert_eq!(roll.trap_bonus, 10);
        assert_eq!(roll.lure_combo, 20);
        // 70 + 60 - 55 + 10 + 20 = 105 -> 95
        assert_eq!(roll.capped, 95);
        assert_eq!(
            chance.to_string(),
            "Lure hit% = cap(base 70 + exp 60 + def -55 + trapBonus 10 + lureCombo 20 + stun 0) = 95%"
        );
    }

    #[test]
    fn lured_overrides() {
        let gags = vec![gag(Track::Throw, 1, "Cupcake"), gag(Track::Drop, 1, "Flower Pot")];
        let evaluator = Evaluator::new(&gags, 3, 20, true);
        let lured = RoundState { stun: 0, lured: true };
        assert_eq!(
            evaluator.hit_chance(Track::Throw, lured),
            HitChance::AutoHit { track: Track::Throw }
        );
        assert_eq!(
            evaluator.hit_chance(Track::Drop, lured),
            HitChance::AutoMiss { track: Track::Drop }
        );
        assert_eq!(
            evaluator.hit_chance(Track::Lure, lured),
            HitChance::AlreadyLured
        );
    }

    #[test]
    fn stun_is_capped() {
        let pie = gag(Track::Throw, 5, "Whole Cream Pie");
        let gags = vec![pie.clone(), pie.clone(), pie.clone(), pie, gag(Track::Drop, 4, "Big Weight")];
        let evaluator = Evaluator::new(&gags, 20, 1_000, false);
        let mut recorder = Recorder::default();
        evaluator.run(&mut recorder);

        let drop_rolls: Vec<i32> = recorder
            .0
            .iter()
            .filter_map(|step| match step {
                TraceStep::Roll {
                    chance: HitChance::Rolled(roll),
                    ..
                } if roll.track == Track::Drop => Some(roll.stun),
                _ => None,
            })
            .collect();
        assert_eq!(drop_rolls, vec![MAX_STUN, 0]);
    }

    #[test]
    fn zero_probability_subtrees_are_skipped() {
        let gags = vec![gag(Track::Drop, 6, "Grand Piano")];
        let evaluator = Evaluator::new(&gags, 1, 6, true);
        let mut recorder = Recorder::default();
        evaluator.run(&mut recorder);

        let leaves: Vec<&TraceStep> = recorder
            .0
            .iter()
            .filter(|s| matches!(s, TraceStep::Leaf { .. }))
            .collect();
        assert_eq!(leaves.len(), 1);
        assert!(matches!(leaves[0], TraceStep::Leaf { ko: false, damage: 0, .. }));
    }
}
