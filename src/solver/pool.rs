//! Candidate pool: the gags the search may add.

use std::sync::Arc;

use crate::gag::{AffectsType, GagDefinition};
use crate::roster::TrackCapacity;
use crate::track::{DamageType, Track};

use super::request::FillRequest;

/// Filters `request.available` down to gags worth adding, in search order.
///
/// The order (level, then track name, then gag name) fixes the order in which
/// multisets are enumerated.
#[must_use]
pub fn candidate_pool(request: &FillRequest, capacity: &TrackCapacity) -> Vec<Arc<GagDefinition>> {
    let mut pool: Vec<Arc<GagDefinition>> = request
        .available
        .iter()
        .filter(|g| g.affects_type == AffectsType::Cog)
        .filter(|g| g.dmg_type != DamageType::Heal)
        .filter(|g| request.enabled_tracks.get(g.track))
        .filter(|g| !request.exclusions.excludes(g.level, g.track))
        .filter(|g| g.track != Track::ToonUp)
        .filter(|g| !request.initially_lured || !matches!(g.track, Track::Lure | Track::Trap))
        .filter(|g| capacity.get(g.track) > 0)
        .cloned()
        .collect();

    pool.sort_by(|a, b| {
        a.level
            .cmp(&b.level)
            .then_with(|| a.track.name().cmp(b.track.name()))
            .then_with(|| a.name.cmp(&b.name))
    });
    pool
}
