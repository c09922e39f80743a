//! Favorite combos, grouped by the scenario they were found for.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::gag::GagKey;
use crate::solver::{FillOption, FillRequest};

/// Hit points the scenario was solved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HpMode {
    /// Full health for the level.
    Full,
    /// An explicit remaining hit point value.
    Remaining(u32),
}

/// Identifies the situation a favorite applies to.
///
/// Renders as `lvl:{L}|hp:{full|N}|lured:{0|1}|toons:{T}`, where `T` is the
/// number of committed gags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScenarioKey {
    /// Target level.
    pub target_level: u32,
    /// Hit point mode.
    pub hp: HpMode,
    /// Target starts lured.
    pub lured: bool,
    /// Committed gags.
    pub toons: usize,
}

impl ScenarioKey {
    /// The scenario a request is solved in.
    #[must_use]
    pub fn for_request(request: &FillRequest) -> Self {
        Self {
            target_level: request.target_level,
            hp: request.hp_override.map_or(HpMode::Full, HpMode::Remaining),
            lured: request.initially_lured,
            toons: request.current.len(),
        }
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lvl:{}|hp:", self.target_level)?;
        match self.hp {
            HpMode::Full => f.write_str("full")?,
            HpMode::Remaining(hp) => write!(f, "{hp}")?,
        }
        write!(f, "|lured:{}|toons:{}", u8::from(self.lured), self.toons)
    }
}

fn scenario_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^lvl:(\d+)\|hp:(full|\d+)\|lured:([01])\|toons:(\d+)$").ok())
        .as_ref()
}

impl FromStr for ScenarioKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidScenarioKey {
            value: s.to_string(),
        };
        let caps = scenario_pattern()
            .and_then(|re| re.captures(s.trim()))
            .ok_or_else(invalid)?;

        let target_level = caps[1].parse().map_err(|_| invalid())?;
        let hp = match &caps[2] {
            "full" => HpMode::Full,
            n => HpMode::Remaining(n.parse().map_err(|_| invalid())?),
        };
        let toons = caps[4].parse().map_err(|_| invalid())?;

        Ok(Self {
            target_level,
            hp,
            lured: &caps[3] == "1",
            toons,
        })
    }
}

/// A saved combo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCombo {
    /// Stable identifier: the same combo in the same scenario always has the
    /// same id.
    pub id: String,
    /// The added gags.
    #[serde(rename = "addedGags")]
    pub added: Vec<GagKey>,
    /// Attackers used, committed plus added.
    pub toons: usize,
    /// Total damage.
    pub total: u32,
    /// Overkill.
    pub overkill: u32,
    /// Target level.
    pub target_level: u32,
    /// When the combo was saved.
    pub created_at: DateTime<Utc>,
}

impl FavoriteCombo {
    /// Builds a favorite from a solver option.
    #[must_use]
    pub fn from_option(scenario: &ScenarioKey, option: &FillOption) -> Self {
        let added = option.exact_key();
        Self {
            id: favorite_id(scenario, &added),
            toons: scenario.toons + added.len(),
            added,
            total: option.total_damage,
            overkill: option.overkill,
            target_level: scenario.target_level,
            created_at: Utc::now(),
        }
    }
}

/// Hex digest identifying `added` (sorted) within `scenario`.
#[must_use]
pub fn favorite_id(scenario: &ScenarioKey, added: &[GagKey]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(scenario.to_string().as_bytes());
    for key in added {
        hasher.update(b"\n");
        hasher.update(key.to_string().as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
