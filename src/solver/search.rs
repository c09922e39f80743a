//! Combination search over the candidate pool.
//!
//! For every addition size `k` the search walks multisets of pool indices in
//! non-decreasing order, pruning branches that would field more gags of a
//! track than the roster can carry. The walk stops once the generation cap
//! is reached or the node budget is spent, whichever comes first.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::accuracy::ko_probability;
use crate::damage::{total_damage, TargetStatus};
use crate::error::GagResult;
use crate::gag::{GagDefinition, GagInstance, GagKey};
use crate::roster::{Roster, TrackCapacity};
use crate::track::{PerTrack, Track};

use super::config::MAX_SEARCH_NODES;
use super::request::FillRequest;
use super::FillOption;

/// Counters describing one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Search-tree nodes expanded, complete or not.
    pub nodes: usize,
    /// Complete multisets examined.
    pub visited: usize,
    /// Rejected by slot count or track assignment.
    pub infeasible: usize,
    /// Rejected for falling short of the target's hit points.
    pub too_weak: usize,
    /// Rejected as an exact repeat.
    pub duplicates: usize,
    /// Whether the generation cap cut the search short.
    pub capped: bool,
    /// Whether the node budget cut the search short.
    pub exhausted: bool,
}

impl SearchStats {
    fn stopped(&self) -> bool {
        self.capped || self.exhausted
    }
}

struct Search<'r> {
    request: &'r FillRequest,
    hp: u32,
    roster: &'r Roster,
    capacity: &'r TrackCapacity,
    pool: Vec<GagInstance>,
    base_tracks: Vec<Track>,
    base_counts: PerTrack<usize>,
    added_counts: PerTrack<usize>,
    chosen: Vec<usize>,
    seen: HashSet<Vec<GagKey>>,
    out: Vec<FillOption>,
    cap: usize,
    node_budget: usize,
    stats: SearchStats,
}

impl<'r> Search<'r> {
    fn new(
        request: &'r FillRequest,
        hp: u32,
        pool: &[Arc<GagDefinition>],
        roster: &'r Roster,
        capacity: &'r TrackCapacity,
        node_budget: usize,
    ) -> Self {
        let mut base_counts = PerTrack::default();
        for gag in &request.current {
            base_counts.bump(gag.track());
        }
        Self {
            request,
            hp,
            roster,
            capacity,
            pool: pool.iter().map(|g| GagInstance::new(Arc::clone(g))).collect(),
            base_tracks: request.current.iter().map(GagInstance::track).collect(),
            base_counts,
            added_counts: PerTrack::default(),
            chosen: Vec::new(),
            seen: HashSet::new(),
            out: Vec::new(),
            cap: request.limits.max_generated,
            node_budget,
            stats: SearchStats::default(),
        }
    }

    fn status(&self) -> TargetStatus<'static> {
        TargetStatus::new(self.request.initially_lured)
    }

    fn probability(&self, all: &[GagInstance]) -> GagResult<f64> {
        ko_probability(
            all,
            Some(self.request.target_level),
            &self.request.accuracy_options(),
        )
    }

    /// Adds the zero-addition option when the committed gags already suffice.
    fn already_lethal(&mut self) -> GagResult<()> {
        let current = &self.request.current;
        let total = total_damage(current, self.status()).total_damage;
        if total < self.hp || !self.roster.can_assign(&self.base_tracks) {
            return Ok(());
        }
        let accuracy = self.probability(current)?;
        self.seen.insert(Vec::new());
        self.out.push(FillOption {
            added: Vec::new(),
            total_damage: total,
            overkill: total - self.hp,
            accuracy,
        });
        Ok(())
    }

    fn would_exceed(&self, track: Track) -> bool {
        let used = self.base_counts.get(track) + self.added_counts.get(track);
        if track == Track::Trap {
            return used >= 1;
        }
        used + 1 > self.capacity.get(track)
    }

    fn descend(&mut self, start: usize, k: usize) -> GagResult<()> {
        if self.stats.stopped() {
            return Ok(());
        }
        if self.out.len() >= self.cap {
            self.stats.capped = true;
            return Ok(());
        }
        if self.stats.nodes >= self.node_budget {
            self.stats.exhausted = true;
            return Ok(());
        }
        self.stats.nodes += 1;
        if self.chosen.len() == k {
            return self.evaluate();
        }

        for idx in start..self.pool.len() {
            let track = self.pool[idx].track();
            if self.would_exceed(track) {
                continue;
            }
            self.chosen.push(idx);
            self.added_counts.bump(track);

            self.descend(idx, k)?;

            self.added_counts.unbump(track);
            self.chosen.pop();
        }
        Ok(())
    }

    fn evaluate(&mut self) -> GagResult<()> {
        self.stats.visited += 1;
        let current = &self.request.current;

        if current.len() + self.chosen.len() > self.request.max_toons {
            self.stats.infeasible += 1;
            return Ok(());
        }
        let tracks: Vec<Track> = self
            .base_tracks
            .iter()
            .copied()
            .chain(self.chosen.iter().map(|&i| self.pool[i].track()))
            .collect();
        if !self.roster.can_assign(&tracks) {
            self.stats.infeasible += 1;
            return Ok(());
        }

        let all = current.iter().chain(self.chosen.iter().map(|&i| &self.pool[i]));
        let total = total_damage(all, self.status()).total_damage;
        if total < self.hp {
            self.stats.too_weak += 1;
            return Ok(());
        }

        let mut key: Vec<GagKey> = self.chosen.iter().map(|&i| self.pool[i].key()).collect();
        key.sort();
        if !self.seen.insert(key) {
            self.stats.duplicates += 1;
            return Ok(());
        }

        let all: Vec<GagInstance> = current
            .iter()
            .cloned()
            .chain(self.chosen.iter().map(|&i| self.pool[i].clone()))
            .collect();
        let accuracy = self.probability(&all)?;

        // Every option gets instances of its own.
        let added = self
            .chosen
            .iter()
            .map(|&i| GagInstance::new(Arc::clone(&self.pool[i].gag)))
            .collect();
        self.out.push(FillOption {
            added,
            total_damage: total,
            overkill: total - self.hp,
            accuracy,
        });
        Ok(())
    }
}

/// Generates every option (up to the generation cap) that reaches `hp`.
///
/// # Errors
///
/// Propagates probability evaluation errors.
pub fn generate(
    request: &FillRequest,
    hp: u32,
    pool: &[Arc<GagDefinition>],
    roster: &Roster,
    capacity: &TrackCapacity,
) -> GagResult<(Vec<FillOption>, SearchStats)> {
    generate_within(request, hp, pool, roster, capacity, MAX_SEARCH_NODES)
}

fn generate_within(
    request: &FillRequest,
    hp: u32,
    pool: &[Arc<GagDefinition>],
    roster: &Roster,
    capacity: &TrackCapacity,
    node_budget: usize,
) -> GagResult<(Vec<FillOption>, SearchStats)> {
    let mut search = Search::new(request, hp, pool, roster, capacity, node_budget);
    search.already_lethal()?;

    for k in 1..=request.remaining_slots() {
        search.descend(0, k)?;
        if search.stats.stopped() {
            break;
        }
    }

    if search.stats.exhausted {
        warn!(
            target_level = request.target_level,
            hp,
            nodes = search.stats.nodes,
            generated = search.out.len(),
            "fill search ran out of node budget; returning partial results"
        );
    }

    debug!(
        target_level = request.target_level,
        hp,
        pool = pool.len(),
        nodes = search.stats.nodes,
        generated = search.out.len(),
        visited = search.stats.visited,
        infeasible = search.stats.infeasible,
        too_weak = search.stats.too_weak,
        duplicates = search.stats.duplicates,
        capped = search.stats.capped,
        exhausted = search.stats.exhausted,
        "fill search finished"
    );
    Ok((search.out, search.stats))
}
