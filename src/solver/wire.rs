//! Loose JSON request shape and its normalization.
//!
//! Callers send either a flat object or one with a nested `toggles` object
//! carrying the same fields. Top-level values win; `null` counts as absent.
//! Nothing here fails: malformed values fall back to defaults and unknown
//! names are skipped with a warning.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::catalog::GagCatalog;
use crate::gag::{GagDefinition, GagInstance, GagKey};
use crate::roster::ToonRestriction;
use crate::track::{PerTrack, Track};

use super::config::{
    clamp_generated, SearchLimits, DEFAULT_MAX_RESULTS, DEFAULT_MAX_TOONS, DEFAULT_TARGET_LEVEL,
    MAX_ATTACKERS,
};
use super::request::{FillRequest, LevelExclusions};
use super::weights::{clamp01, RetainWeights, SortMode, SortWeights};

/// A fill request as it arrives on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct RawFillRequest {
    pub target_level: Option<Value>,
    pub is_target_already_lured: Option<Value>,
    pub target_hp_override: Option<Value>,
    pub current_gags: Option<Value>,
    pub available_gags: Option<Value>,
    pub max_toons: Option<Value>,
    pub exclude_levels: Option<Value>,
    pub enabled_tracks: Option<Value>,
    pub prefer_accuracy: Option<Value>,
    pub sort_mode: Option<Value>,
    pub sort_weights: Option<Value>,
    pub gag_conserve_weights: Option<Value>,
    pub hide_overkill_additions: Option<Value>,
    pub max_results: Option<Value>,
    pub max_generated: Option<Value>,
    pub toon_restrictions: Option<Value>,
    /// Nested copy of any of the fields above.
    pub toggles: Option<Value>,
}

impl RawFillRequest {
    fn field<'a>(&'a self, top: &'a Option<Value>, key: &str) -> Option<&'a Value> {
        present(top.as_ref()).or_else(|| self.toggle(key))
    }

    fn toggle(&self, key: &str) -> Option<&Value> {
        present(self.toggles.as_ref()?.get(key))
    }

    /// Normalizes into a canonical request.
    ///
    /// Gag references are resolved against `catalog`; when `availableGags`
    /// is absent every catalog entry is available. A target level below 1 is
    /// carried through as 0 so that solving reports the invalid level.
    #[must_use]
    pub fn normalize(&self, catalog: &GagCatalog) -> FillRequest {
        let max_results = self
            .field(&self.max_results, "maxResults")
            .and_then(as_number)
            .map_or(DEFAULT_MAX_RESULTS, |n| to_usize(n).max(1));
        let max_generated = match self
            .field(&self.max_generated, "maxGenerated")
            .and_then(as_number)
        {
            Some(n) => clamp_generated(to_usize(n)),
            None => SearchLimits::for_results(max_results).max_generated,
        };

        let max_toons = self
            .field(&self.max_toons, "maxToons")
            .and_then(as_number)
            .map_or(DEFAULT_MAX_TOONS, |n| to_usize(n).min(MAX_ATTACKERS));

        let prefer_accuracy = self
            .field(&self.prefer_accuracy, "preferAccuracy")
            .map_or(true, truthy);
        let sort_mode = self
            .field(&self.sort_mode, "sortMode")
            .and_then(Value::as_str)
            .and_then(SortMode::from_name)
            .unwrap_or(if prefer_accuracy {
                SortMode::Accuracy
            } else {
                SortMode::Conserve
            });

        let available = match self.field(&self.available_gags, "availableGags") {
            Some(value) => parse_gags(value, catalog, "availableGags")
                .into_iter()
                .map(|g| g.gag)
                .collect(),
            None => catalog.definitions(),
        };

        FillRequest {
            target_level: self
                .field(&self.target_level, "targetLevel")
                .and_then(as_number)
                .map_or(DEFAULT_TARGET_LEVEL, to_u32),
            hp_override: self
                .field(&self.target_hp_override, "targetHpOverride")
                .and_then(as_number)
                .map(|n| to_u32(n).max(1)),
            initially_lured: self
                .field(&self.is_target_already_lured, "isTargetAlreadyLured")
                .is_some_and(truthy),
            current: self
                .field(&self.current_gags, "currentGags")
                .map(|v| parse_gags(v, catalog, "currentGags"))
                .unwrap_or_default(),
            available,
            max_toons,
            restrictions: self.restrictions(),
            enabled_tracks: self.enabled_tracks(),
            exclusions: self.exclusions(),
            sort_mode,
            sort_weights: self.sort_weights(),
            retain_weights: self.retain_weights(),
            hide_overkill_additions: self
                .field(&self.hide_overkill_additions, "hideOverkillAdditions")
                .is_some_and(truthy),
            limits: SearchLimits {
                max_results,
                max_generated,
            },
        }
    }

    fn exclusions(&self) -> LevelExclusions {
        if let Some(value) = present(self.exclude_levels.as_ref()) {
            let get = |key: &str| present(value.get(key));
            return LevelExclusions {
                low_1_to_3: get("low1to3").is_some_and(truthy),
                level7: get("level7").is_some_and(truthy),
                level6_all: get("level6").is_some_and(truthy),
                level6_by_track: get("level6ByTrack").map(track_flags).unwrap_or_default(),
            };
        }
        LevelExclusions {
            low_1_to_3: self.toggle("excludeLow").is_some_and(truthy),
            level7: self.toggle("excludeLevel7").is_some_and(truthy),
            level6_all: self.toggle("excludeLevel6").is_some_and(truthy),
            level6_by_track: self
                .toggle("excludeLevel6ByTrack")
                .map(track_flags)
                .unwrap_or_default(),
        }
    }

    fn enabled_tracks(&self) -> PerTrack<bool> {
        let mut enabled = PerTrack::splat(true);
        let Some(map) = self
            .field(&self.enabled_tracks, "enabledTracks")
            .and_then(Value::as_object)
        else {
            return enabled;
        };
        for (name, flag) in map {
            match Track::from_str(name) {
                Ok(track) => enabled.set(track, *flag != Value::Bool(false)),
                Err(err) => warn!(%err, "ignoring enabledTracks entry"),
            }
        }
        enabled
    }

    fn restrictions(&self) -> Vec<ToonRestriction> {
        let Some(items) = self
            .field(&self.toon_restrictions, "toonRestrictions")
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };
        items
            .iter()
            .map(|item| match item.as_str().map(ToonRestriction::from_str) {
                Some(Ok(restriction)) => restriction,
                Some(Err(err)) => {
                    warn!(%err, "treating toon restriction as none");
                    ToonRestriction::None
                }
                None => ToonRestriction::None,
            })
            .collect()
    }

    fn sort_weights(&self) -> SortWeights {
        let defaults = SortWeights::default();
        let Some(raw) = self
            .field(&self.sort_weights, "sortWeights")
            .and_then(Value::as_object)
        else {
            return defaults;
        };
        let weight = |key: &str, fallback: f64| {
            present(raw.get(key))
                .and_then(as_number)
                .map_or(fallback, |n| n.max(0.0))
        };
        SortWeights {
            accuracy: weight("accuracy", defaults.accuracy),
            conserve: weight("conserve", defaults.conserve),
            tracks: weight("tracks", defaults.tracks),
        }
    }

    fn retain_weights(&self) -> RetainWeights {
        let mut weights = RetainWeights::standard();
        let Some(raw) = self
            .field(&self.gag_conserve_weights, "gagConserveWeights")
            .and_then(Value::as_object)
        else {
            return weights;
        };
        for (key, value) in raw {
            let (Some(gag), Some(weight)) = (parse_gag_key(key), as_number(value)) else {
                warn!(key = %key, "ignoring gagConserveWeights entry");
                continue;
            };
            weights.set(gag, clamp01(weight));
        }
        weights
    }
}

/// Treats JSON `null` the same as a missing field.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Numeric value of a JSON scalar; numeric strings and booleans count.
fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else {
                s.parse::<f64>().ok()
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    n.filter(|n| n.is_finite())
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_usize(n: f64) -> usize {
    let n = n.floor();
    if n <= 0.0 {
        0
    } else {
        n.min(u32::MAX.into()) as usize
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u32(n: f64) -> u32 {
    let n = n.floor();
    if n <= 0.0 {
        0
    } else {
        n.min(u32::MAX.into()) as u32
    }
}

fn track_flags(value: &Value) -> PerTrack<bool> {
    let mut flags = PerTrack::default();
    let Some(map) = value.as_object() else {
        return flags;
    };
    for (name, flag) in map {
        match Track::from_str(name) {
            Ok(track) => flags.set(track, truthy(flag)),
            Err(err) => warn!(%err, "ignoring per-track flag"),
        }
    }
    flags
}

/// Parses `"Track:Level:Name"`.
fn parse_gag_key(key: &str) -> Option<GagKey> {
    let mut parts = key.splitn(3, ':');
    let track = Track::from_str(parts.next()?).ok()?;
    let level = parts.next()?.trim().parse::<u8>().ok()?;
    let name = parts.next()?;
    Some(GagKey::new(track, level, name))
}

fn parse_gags(value: &Value, catalog: &GagCatalog, field: &str) -> Vec<GagInstance> {
    let Some(items) = value.as_array() else {
        warn!(field, "expected an array of gags");
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let gag = item.as_object().and_then(|obj| parse_gag(obj, catalog));
            if gag.is_none() {
                warn!(field, gag = %item, "skipping unresolvable gag");
            }
            gag
        })
        .collect()
}

fn parse_gag(obj: &Map<String, Value>, catalog: &GagCatalog) -> Option<GagInstance> {
    let definition = lookup_gag(obj, catalog).or_else(|| {
        serde_json::from_value::<GagDefinition>(Value::Object(obj.clone()))
            .ok()
            .map(Arc::new)
    })?;

    let flag = |key: &str| present(obj.get(key)).is_some_and(truthy);
    let mut instance = GagInstance::new(definition);
    instance.organic = flag("isOrganic");
    instance.preview = flag("isPreview");
    Some(instance)
}

fn lookup_gag(obj: &Map<String, Value>, catalog: &GagCatalog) -> Option<Arc<GagDefinition>> {
    let track = Track::from_str(obj.get("track")?.as_str()?).ok()?;
    let level = u8::try_from(to_u32(as_number(obj.get("level")?)?)).ok()?;
    let name = obj.get("name")?.as_str()?;
    catalog.find(track, level, name).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: Value) -> FillRequest {
        let raw: RawFillRequest = serde_json::from_value(value).unwrap();
        raw.normalize(GagCatalog::standard())
    }

    #[test]
    fn empty_object_gets_defaults() {
        let request = normalize(json!({}));
        assert_eq!(request.target_level, 10);
        assert_eq!(request.max_toons, 4);
        assert_eq!(request.limits, SearchLimits::default());
        assert_eq!(request.sort_mode, SortMode::Accuracy);
        assert_eq!(request.sort_weights, SortWeights::default());
        assert_eq!(request.available.len(), 49);
        assert!(request.current.is_empty());
        assert!(!request.initially_lured);
        assert!(request.hp_override.is_none());
    }

    #[test]
    fn toggles_fill_in_missing_fields() {
        let request = normalize(json!({
            "targetLevel": 12,
            "maxToons": 3,
            "toggles": {
                "targetLevel": 5,
                "isTargetAlreadyLured": true,
                "preferAccuracy": false,
                "excludeLow": true,
                "excludeLevel6ByTrack": {"Throw": true},
                "enabledTracks": {"Drop": false},
                "maxResults": 4,
                "hideOverkillAdditions": 1
            }
        }));
        assert_eq!(request.target_level, 12);
        assert_eq!(request.max_toons, 3);
        assert!(request.initially_lured);
        assert_eq!(request.sort_mode, SortMode::Conserve);
        assert!(request.exclusions.low_1_to_3);
        assert!(request.exclusions.excludes(6, Track::Throw));
        assert!(!request.exclusions.excludes(6, Track::Squirt));
        assert!(!request.enabled_tracks.get(Track::Drop));
        assert!(request.enabled_tracks.get(Track::Sound));
        assert_eq!(request.limits.max_results, 4);
        assert_eq!(request.limits.max_generated, 120);
        assert!(request.hide_overkill_additions);
    }

    #[test]
    fn null_counts_as_absent() {
        let request = normalize(json!({
            "maxToons": null,
            "toggles": {"maxToons": 2}
        }));
        assert_eq!(request.max_toons, 2);
    }

    #[test]
    fn numbers_are_coerced() {
        let request = normalize(json!({
            "targetLevel": "7",
            "targetHpOverride": 0.4,
            "maxToons": 40,
            "maxResults": "abc",
            "maxGenerated": 10
        }));
        assert_eq!(request.target_level, 7);
        assert_eq!(request.hp_override, Some(1));
        assert_eq!(request.max_toons, MAX_ATTACKERS);
        assert_eq!(request.limits.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(request.limits.max_generated, 50);
    }

    #[test]
    fn level_below_one_passes_through_as_zero() {
        assert_eq!(normalize(json!({"targetLevel": -3})).target_level, 0);
    }

    #[test]
    fn gags_resolve_against_catalog() {
        let request = normalize(json!({
            "currentGags": [
                {"track": "Lure", "level": 5, "name": "$10 Bill", "isOrganic": true},
                {"track": "Throw", "level": 9, "name": "Nope"},
                {"track": "Juggle", "level": 1, "name": "Ball"}
            ],
            "availableGags": [
                {"track": "Drop", "level": 6, "name": "Grand Piano"}
            ]
        }));
        assert_eq!(request.current.len(), 1);
        assert!(request.current[0].organic);
        assert_eq!(request.current[0].name(), "$10 Bill");
        assert_eq!(request.available.len(), 1);
        assert_eq!(request.available[0].max_dmg, 170);
    }

    #[test]
    fn inline_definitions_are_accepted() {
        let request = normalize(json!({
            "currentGags": [{
                "name": "Custom Pie", "track": "Throw", "level": 3, "accuracy": 75,
                "affectsType": "Cog", "affectsNum": "Single", "maxDmg": 20, "dmgType": "Damage"
            }]
        }));
        assert_eq!(request.current.len(), 1);
        assert_eq!(request.current[0].damage(), 20);
    }

    #[test]
    fn explicit_sort_mode_wins() {
        let request = normalize(json!({"preferAccuracy": false, "sortMode": "weighted"}));
        assert_eq!(request.sort_mode, SortMode::Weighted);
        let request = normalize(json!({"sortMode": "fastest"}));
        assert_eq!(request.sort_mode, SortMode::Accuracy);
    }

    #[test]
    fn sort_weights_merge_over_defaults() {
        let request = normalize(json!({"sortWeights": {"accuracy": -2, "conserve": "0.25"}}));
        assert_eq!(
            request.sort_weights,
            SortWeights {
                accuracy: 0.0,
                conserve: 0.25,
                tracks: 1.0
            }
        );
    }

    #[test]
    fn conserve_weights_override_table() {
        let request = normalize(json!({
            "gagConserveWeights": {
                "Throw:5:Whole Cream Pie": 3,
                "Drop:6:Grand Piano": 0.9,
                "garbage": 1
            }
        }));
        let retain = &request.retain_weights;
        assert!((retain.get(&GagKey::new(Track::Throw, 5, "Whole Cream Pie")) - 1.0).abs() < 1e-12);
        assert!((retain.get(&GagKey::new(Track::Drop, 6, "Grand Piano")) - 0.9).abs() < 1e-12);
        assert!((retain.get(&GagKey::new(Track::Squirt, 5, "Fire Hose")) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn restrictions_parse_leniently() {
        let request = normalize(json!({"toonRestrictions": ["soundless", "wingless", 3]}));
        assert_eq!(
            request.restrictions,
            vec![ToonRestriction::Soundless, ToonRestriction::None, ToonRestriction::None]
        );
    }

    #[test]
    fn exclude_levels_object_wins_over_toggles() {
        let request = normalize(json!({
            "excludeLevels": {"level7": true, "level6": true},
            "toggles": {"excludeLow": true}
        }));
        assert!(request.exclusions.level7);
        assert!(request.exclusions.level6_all);
        assert!(!request.exclusions.low_1_to_3);
    }
}
