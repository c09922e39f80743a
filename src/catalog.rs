//! The gag catalog: read-only definitions keyed by `(track, level, name)`.
//!
//! The standard catalog ships with the crate. Callers with their own stat
//! tables can load one from JSON; the catalog rejects duplicate identities
//! so exact-match lookups stay unambiguous.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::error::ValidationError;
use crate::gag::{AffectsNum, AffectsType, GagDefinition, GagInstance, GagKey, DEFAULT_ORGANIC_BONUS};
use crate::track::Track;

/// Experience needed to unlock each gag level (index 0 = level 1).
const UNLOCK_XP: [u32; 7] = [0, 10, 50, 400, 2000, 6000, 10_000];

/// Experience at which each level's successor unlocks.
const NEXT_XP: [u32; 7] = [10, 50, 400, 2000, 6000, 10_000, 10_000];

struct Row {
    track: Track,
    level: u8,
    name: &'static str,
    accuracy: i32,
    affects: AffectsNum,
    min_dmg: u32,
    max_dmg: u32,
}

const fn row(
    track: Track,
    level: u8,
    name: &'static str,
    accuracy: i32,
    affects: AffectsNum,
    min_dmg: u32,
    max_dmg: u32,
) -> Row {
    Row {
        track,
        level,
        name,
        accuracy,
        affects,
        min_dmg,
        max_dmg,
    }
}

use AffectsNum::{All, Single};
use Track::{Drop, Lure, Sound, Squirt, Throw, ToonUp, Trap};

#[rustfmt::skip]
const STANDARD_ROWS: [Row; 49] = [
    row(ToonUp, 1, "Feather", 70, Single, 8, 10),
    row(ToonUp, 2, "Megaphone", 70, All, 15, 18),
    row(ToonUp, 3, "Lipstick", 70, Single, 25, 30),
    row(ToonUp, 4, "Bamboo Cane", 70, All, 40, 45),
    row(ToonUp, 5, "Pixie Dust", 70, Single, 50, 60),
    row(ToonUp, 6, "Juggling Balls", 70, All, 90, 120),
    row(ToonUp, 7, "High Dive", 95, All, 210, 210),

    row(Trap, 1, "Banana Peel", 100, Single, 10, 12),
    row(Trap, 2, "Rake", 100, Single, 18, 20),
    row(Trap, 3, "Marbles", 100, Single, 30, 35),
    row(Trap, 4, "Quicksand", 100, Single, 45, 50),
    row(Trap, 5, "Trapdoor", 100, Single, 60, 70),
    row(Trap, 6, "TNT", 100, Single, 90, 180),
    row(Trap, 7, "Railroad", 100, All, 195, 195),

    row(Lure, 1, "$1 Bill", 50, Single, 0, 0),
    row(Lure, 2, "Small Magnet", 50, All, 0, 0),
    row(Lure, 3, "$5 Bill", 60, Single, 0, 0),
    row(Lure, 4, "Big Magnet", 60, All, 0, 0),
    row(Lure, 5, "$10 Bill", 70, Single, 0, 0),
    row(Lure, 6, "Hypno Goggles", 70, All, 0, 0),
    row(Lure, 7, "Presentation", 95, All, 0, 0),

    row(Sound, 1, "Bike Horn", 95, All, 3, 4),
    row(Sound, 2, "Whistle", 95, All, 5, 7),
    row(Sound, 3, "Bugle", 95, All, 9, 11),
    row(Sound, 4, "Aoogah", 95, All, 14, 16),
    row(Sound, 5, "Elephant Trunk", 95, All, 19, 21),
    row(Sound, 6, "Foghorn", 95, All, 25, 50),
    row(Sound, 7, "Opera Singer", 95, All, 55, 90),

    row(Throw, 1, "Cupcake", 75, Single, 4, 6),
    row(Throw, 2, "Fruit Pie Slice", 75, Single, 8, 10),
    row(Throw, 3, "Cream Pie Slice", 75, Single, 14, 17),
    row(Throw, 4, "Whole Fruit Pie", 75, Single, 24, 27),
    row(Throw, 5, "Whole Cream Pie", 75, Single, 36, 40),
    row(Throw, 6, "Birthday Cake", 75, Single, 75, 100),
    row(Throw, 7, "Wedding Cake", 75, All, 110, 120),

    row(Squirt, 1, "Squirting Flower", 95, Single, 3, 4),
    row(Squirt, 2, "Glass of Water", 95, Single, 6, 8),
    row(Squirt, 3, "Squirt Gun", 95, Single, 10, 12),
    row(Squirt, 4, "Seltzer Bottle", 95, Single, 18, 21),
    row(Squirt, 5, "Fire Hose", 95, Single, 27, 30),
    row(Squirt, 6, "Storm Cloud", 95, Single, 36, 80),
    row(Squirt, 7, "Geyser", 95, All, 105, 105),

    row(Drop, 1, "Flower Pot", 50, Single, 10, 10),
    row(Drop, 2, "Sandbag", 50, Single, 18, 18),
    row(Drop, 3, "Anvil", 50, Single, 30, 30),
    row(Drop, 4, "Big Weight", 50, Single, 45, 45),
    row(Drop, 5, "Safe", 50, Single, 60, 70),
    row(Drop, 6, "Grand Piano", 50, Single, 170, 170),
    row(Drop, 7, "Toontanic", 50, All, 180, 180),
];

impl Row {
    fn to_definition(&self) -> GagDefinition {
        let idx = usize::from(self.level.saturating_sub(1)).min(6);
        GagDefinition {
            name: self.name.to_string(),
            track: self.track,
            level: self.level,
            accuracy: self.accuracy,
            affects_type: if self.track == ToonUp {
                AffectsType::Toon
            } else {
                AffectsType::Cog
            },
            affects_num: self.affects,
            min_dmg: self.min_dmg,
            max_dmg: self.max_dmg,
            dmg_type: self.track.dmg_type(),
            organic_bonus: DEFAULT_ORGANIC_BONUS,
            min_xp: UNLOCK_XP[idx],
            max_xp: NEXT_XP[idx],
        }
    }
}

/// A read-only set of gag definitions with exact-match lookup.
#[derive(Debug, Clone)]
pub struct GagCatalog {
    gags: Vec<Arc<GagDefinition>>,
    index: HashMap<GagKey, usize>,
}

impl GagCatalog {
    /// Returns the shared standard catalog.
    pub fn standard() -> &'static Self {
        static STANDARD: OnceLock<GagCatalog> = OnceLock::new();
        STANDARD.get_or_init(|| {
            let mut gags = Vec::with_capacity(STANDARD_ROWS.len());
            let mut index = HashMap::with_capacity(STANDARD_ROWS.len());
            for row in &STANDARD_ROWS {
                let gag = row.to_definition();
                index.insert(gag.key(), gags.len());
                gags.push(Arc::new(gag));
            }
            Self { gags, index }
        })
    }

    /// Builds a catalog from caller-supplied definitions.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DuplicateGag` if two definitions share an identity,
    /// or `ValidationError::InvalidCatalog` for out-of-range levels.
    pub fn from_definitions(defs: Vec<GagDefinition>) -> Result<Self, ValidationError> {
        let mut gags = Vec::with_capacity(defs.len());
        let mut index = HashMap::with_capacity(defs.len());
        for def in defs {
            if !(1..=7).contains(&def.level) {
                return Err(ValidationError::InvalidCatalog {
                    reason: format!("{} has level {} (expected 1-7)", def.name, def.level),
                });
            }
            let key = def.key();
            if index.contains_key(&key) {
                return Err(ValidationError::DuplicateGag { key });
            }
            index.insert(key, gags.len());
            gags.push(Arc::new(def));
        }
        Ok(Self { gags, index })
    }

    /// Loads a catalog from a JSON array of definitions.
    ///
    /// Unknown track names surface as `InvalidCatalog` with the parser message.
    pub fn from_json(s: &str) -> Result<Self, ValidationError> {
        let defs: Vec<GagDefinition> =
            serde_json::from_str(s).map_err(|e| ValidationError::InvalidCatalog {
                reason: format!("deserialize catalog: {e}"),
            })?;
        Self::from_definitions(defs)
    }

    /// Looks up a definition by identity.
    #[must_use]
    pub fn get(&self, key: &GagKey) -> Option<&Arc<GagDefinition>> {
        self.index.get(key).map(|&idx| &self.gags[idx])
    }

    /// Looks up a definition by its parts.
    #[must_use]
    pub fn find(&self, track: Track, level: u8, name: &str) -> Option<&Arc<GagDefinition>> {
        self.get(&GagKey::new(track, level, name))
    }

    /// Looks up a definition, failing with `UnknownGag` when absent.
    pub fn require(&self, key: &GagKey) -> Result<&Arc<GagDefinition>, ValidationError> {
        self.get(key)
            .ok_or_else(|| ValidationError::UnknownGag { key: key.clone() })
    }

    /// Creates a fresh committed instance of the gag named by `key`.
    pub fn instance(&self, key: &GagKey) -> Result<GagInstance, ValidationError> {
        self.require(key).map(|gag| GagInstance::new(Arc::clone(gag)))
    }

    /// All definitions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<GagDefinition>> {
        self.gags.iter()
    }

    /// The roster of one track, ordered by level.
    #[must_use]
    pub fn track(&self, track: Track) -> Vec<&Arc<GagDefinition>> {
        let mut roster: Vec<_> = self.gags.iter().filter(|g| g.track == track).collect();
        roster.sort_by_key(|g| g.level);
        roster
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gags.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gags.is_empty()
    }

    /// Shared handles to every definition.
    #[must_use]
    pub fn definitions(&self) -> Vec<Arc<GagDefinition>> {
        self.gags.clone()
    }
}
