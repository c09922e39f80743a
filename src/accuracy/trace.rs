//! Structured trace of an evaluation and its text rendering.

use std::fmt;

use crate::track::Track;

use super::evaluator::{Evaluator, HitChance};

/// Maximum number of lines in a rendered explanation.
pub const MAX_LINES: usize = 100;

/// Maximum number of leaves printed in a rendered explanation.
pub const MAX_LEAVES: usize = 20;

const RULES: [&str; 3] = [
    "- Same track + same target: all gags in that track either hit or miss together.",
    "- Stun: each hit from Throw/Squirt/Sound/Drop adds +25 accuracy (capped at +75). Trap activation adds +50.",
    "- Lured target: Throw/Squirt/Sound auto-hit; Drop auto-miss; first successful damage ends lure.",
];

/// Which side of a roll a branch follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The track's gags connected.
    Hit,
    /// The track's gags missed.
    Miss,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => f.write_str("Hit"),
            Self::Miss => f.write_str("Miss"),
        }
    }
}

/// One event of the branch walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceStep {
    /// A track is about to roll.
    Roll {
        /// Number of tracks already resolved on this path.
        depth: usize,
        /// Track rolling.
        track: Track,
        /// How its chance was decided.
        chance: HitChance,
    },
    /// The walk enters one outcome of the last roll at this depth.
    Branch {
        /// Depth of the roll.
        depth: usize,
        /// Outcome followed.
        outcome: Outcome,
        /// Probability of this outcome alone.
        probability: f64,
    },
    /// All tracks resolved on this path.
    Leaf {
        /// Number of tracks resolved.
        depth: usize,
        /// Damage from the gags that hit.
        damage: u32,
        /// Hit points to beat.
        hp: u32,
        /// Whether `damage >= hp`.
        ko: bool,
        /// Probability of reaching this leaf.
        probability: f64,
    },
}

/// Receives the steps of an evaluation in walk order.
pub trait TraceSink {
    /// Records one step.
    fn record(&mut self, step: TraceStep);
}

/// Sums the probability of knock-out leaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct KoTally {
    probability: f64,
    leaves: usize,
}

impl KoTally {
    /// Total knock-out probability seen so far.
    #[must_use]
    pub fn probability(&self) -> f64 {
        if self.probability.is_finite() {
            self.probability
        } else {
            0.0
        }
    }

    /// Number of leaves visited.
    #[must_use]
    pub fn leaves(&self) -> usize {
        self.leaves
    }
}

impl TraceSink for KoTally {
    fn record(&mut self, step: TraceStep) {
        if let TraceStep::Leaf { ko, probability, .. } = step {
            self.leaves += 1;
            if ko {
                self.probability += probability;
            }
        }
    }
}

/// A full recorded evaluation.
#[derive(Debug, Clone)]
pub struct Trace {
    level: u32,
    hp: u32,
    defense: i32,
    initial_lured: bool,
    tracks: Vec<Track>,
    has_trap: bool,
    hp_override: bool,
    steps: Vec<TraceStep>,
}

impl Trace {
    pub(crate) fn new(evaluator: &Evaluator<'_>, hp_override: bool) -> Self {
        Self {
            level: evaluator.level(),
            hp: evaluator.hp(),
            defense: evaluator.defense(),
            initial_lured: evaluator.initial_lured(),
            tracks: evaluator.tracks().collect(),
            has_trap: evaluator.has_trap(),
            hp_override,
            steps: Vec::new(),
        }
    }

    /// Recorded steps in walk order.
    #[must_use]
    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    /// Knock-out probability: the sum of knock-out leaf probabilities.
    #[must_use]
    pub fn probability(&self) -> f64 {
        let mut tally = KoTally::default();
        for step in &self.steps {
            tally.record(*step);
        }
        tally.probability()
    }

    fn header(&self) -> Vec<String> {
        let tracks = if self.tracks.is_empty() {
            "(none)".to_string()
        } else {
            self.tracks
                .iter()
                .map(|track| track.name())
                .collect::<Vec<_>>()
                .join(" -> ")
        };

        let mut lines = vec![
            format!("One-turn KO probability: {:.2}%", self.probability() * 100.0),
            format!("Target level: {} (HP {}, defense {})", self.level, self.hp, self.defense),
            format!(
                "Initial status: {}",
                if self.initial_lured { "Already lured" } else { "Not lured" }
            ),
            format!("Tracks resolved: {tracks}"),
            "Rules summary:".to_string(),
        ];
        lines.extend(RULES.iter().map(|rule| (*rule).to_string()));
        if self.has_trap {
            lines.push("- Trap triggers only if Lure hits (Trap itself is not an accuracy roll).".to_string());
        }
        if self.hp_override {
            lines.push("- KO check uses Remaining HP override.".to_string());
        }
        lines
    }

    /// Renders the trace as indented text, bounded in length.
    #[must_use]
    pub fn render(&self) -> String {
        let mut lines = self.header();
        let mut printed_leaves = 0;
        let mut truncated = false;

        for step in &self.steps {
            if lines.len() >= MAX_LINES {
                truncated = true;
                break;
            }
            match step {
                TraceStep::Roll { depth, chance, .. } => {
                    lines.push(format!("{}{chance}", indent(*depth)));
                }
                TraceStep::Branch {
                    depth,
                    outcome,
                    probability,
                } => {
                    lines.push(format!(
                        "{}↳ {outcome} branch: p={:.1}%",
                        indent(*depth),
                        probability * 100.0
                    ));
                }
                TraceStep::Leaf {
                    depth,
                    damage,
                    hp,
                    ko,
                    probability,
                } => {
                    if printed_leaves >= MAX_LEAVES {
                        truncated = true;
                        continue;
                    }
                    printed_leaves += 1;
                    let (cmp, verdict) = if *ko { (">=", "KO ✓") } else { ("<", "no KO") };
                    lines.push(format!(
                        "{}Leaf: damage {damage} {cmp} HP {hp} => {verdict} (branch p={:.2}%)",
                        indent(*depth),
                        probability * 100.0
                    ));
                }
            }
        }

        if truncated {
            lines.push("… (trace truncated)".to_string());
        }
        lines.join("\n")
    }
}

impl TraceSink for Trace {
    fn record(&mut self, step: TraceStep) {
        self.steps.push(step);
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}
