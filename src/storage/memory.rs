//! In-memory favorites store.
//!
//! Thread-safe, process-local. Useful for tests and embedded callers that
//! persist favorites some other way.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::favorites::{FavoriteCombo, ScenarioKey};
use crate::storage::traits::{toggle_in, FavoritesStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// Favorites held in a map behind a lock.
#[derive(Debug, Default)]
pub struct InMemoryFavoritesStore {
    lists: RwLock<HashMap<ScenarioKey, Vec<FavoriteCombo>>>,
}

impl InMemoryFavoritesStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scenarios with a non-empty list.
    pub fn scenario_count(&self) -> Result<usize, StorageError> {
        let lists = self.lists.read().map_err(|_| lock_err("favorites.read"))?;
        Ok(lists.values().filter(|l| !l.is_empty()).count())
    }
}

impl FavoritesStore for InMemoryFavoritesStore {
    fn load(&self, scenario: &ScenarioKey) -> Result<Vec<FavoriteCombo>, StorageError> {
        let lists = self.lists.read().map_err(|_| lock_err("favorites.read"))?;
        Ok(lists.get(scenario).cloned().unwrap_or_default())
    }

    fn save(&self, scenario: &ScenarioKey, favorites: Vec<FavoriteCombo>) -> Result<(), StorageError> {
        let mut lists = self.lists.write().map_err(|_| lock_err("favorites.write"))?;
        lists.insert(*scenario, favorites);
        Ok(())
    }

    fn toggle(&self, scenario: &ScenarioKey, favorite: FavoriteCombo) -> Result<Vec<FavoriteCombo>, StorageError> {
        // One write lock for the whole read-modify-write.
        let mut lists = self.lists.write().map_err(|_| lock_err("favorites.toggle"))?;
        let list = lists.entry(*scenario).or_default();
        toggle_in(list, favorite);
        Ok(list.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favorites::HpMode;
    use chrono::Utc;

    fn scenario(level: u32) -> ScenarioKey {
        ScenarioKey {
            target_level: level,
            hp: HpMode::Full,
            lured: false,
            toons: 1,
        }
    }

    fn combo(id: &str) -> FavoriteCombo {
        FavoriteCombo {
            id: id.to_string(),
            added: Vec::new(),
            toons: 1,
            total: 10,
            overkill: 0,
            target_level: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn toggle_inserts_newest_first_then_removes() {
        let store = InMemoryFavoritesStore::new();
        let s = scenario(5);

        store.toggle(&s, combo("a")).unwrap();
        let list = store.toggle(&s, combo("b")).unwrap();
        assert_eq!(list.iter().map(|f| f.id.as_str()).collect::<Vec<_>>(), vec!["b", "a"]);

        let list = store.toggle(&s, combo("a")).unwrap();
        assert_eq!(list.len(), 1);
        assert!(store.contains(&s, "b").unwrap());
        assert!(!store.contains(&s, "a").unwrap());
    }

    #[test]
    fn scenarios_are_independent() {
        let store = InMemoryFavoritesStore::new();
        store.toggle(&scenario(5), combo("a")).unwrap();
        assert!(store.load(&scenario(6)).unwrap().is_empty());
        assert_eq!(store.scenario_count().unwrap(), 1);

        store.save(&scenario(5), Vec::new()).unwrap();
        assert_eq!(store.scenario_count().unwrap(), 0);
    }
}
