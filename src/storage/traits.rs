//! Storage contract for favorites.

use thiserror::Error;

use crate::favorites::{FavoriteCombo, ScenarioKey};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Storage for favorite combos, one list per scenario.
///
/// Lists are ordered newest first.
pub trait FavoritesStore: Send + Sync {
    /// Favorites saved for `scenario`; empty when none.
    fn load(&self, scenario: &ScenarioKey) -> Result<Vec<FavoriteCombo>, StorageError>;

    /// Replaces the list for `scenario`.
    fn save(&self, scenario: &ScenarioKey, favorites: Vec<FavoriteCombo>) -> Result<(), StorageError>;

    /// Removes `favorite` if a combo with its id is saved, otherwise inserts
    /// it at the front. Returns the resulting list.
    fn toggle(&self, scenario: &ScenarioKey, favorite: FavoriteCombo) -> Result<Vec<FavoriteCombo>, StorageError> {
        let mut list = self.load(scenario)?;
        toggle_in(&mut list, favorite);
        self.save(scenario, list.clone())?;
        Ok(list)
    }

    /// Whether a combo with `id` is saved for `scenario`.
    fn contains(&self, scenario: &ScenarioKey, id: &str) -> Result<bool, StorageError> {
        Ok(self.load(scenario)?.iter().any(|f| f.id == id))
    }
}

pub(crate) fn toggle_in(list: &mut Vec<FavoriteCombo>, favorite: FavoriteCombo) {
    match list.iter().position(|f| f.id == favorite.id) {
        Some(idx) => {
            list.remove(idx);
        }
        None => list.insert(0, favorite),
    }
}
