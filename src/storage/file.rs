//! JSON-file favorites store.
//!
//! The whole store is one JSON object mapping scenario signatures to lists.
//! Writes go to a temporary file that is then renamed into place.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::favorites::{FavoriteCombo, ScenarioKey};
use crate::storage::traits::{toggle_in, FavoritesStore, StorageError};

type Document = BTreeMap<String, Vec<FavoriteCombo>>;

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// Favorites persisted to a single JSON file.
#[derive(Debug)]
pub struct JsonFileFavoritesStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl JsonFileFavoritesStore {
    /// Uses `path`; the file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Document, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(StorageError::Io(format!("read {}: {e}", self.path.display()))),
        };
        if raw.trim().is_empty() {
            return Ok(Document::new());
        }
        serde_json::from_str(&raw)
            .map_err(|e| StorageError::SerializationError(format!("parse {}: {e}", self.path.display())))
    }

    fn write_document(&self, document: &Document) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|e| StorageError::Io(format!("create {}: {e}", dir.display())))?;
        }
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        fs::write(&temp, bytes).map_err(|e| StorageError::Io(format!("write {}: {e}", temp.display())))?;
        fs::rename(&temp, &self.path)
            .map_err(|e| StorageError::Io(format!("rename to {}: {e}", self.path.display())))?;
        debug!(path = %self.path.display(), scenarios = document.len(), "favorites written");
        Ok(())
    }

    fn update<R>(&self, f: impl FnOnce(&mut Document) -> R) -> Result<R, StorageError> {
        let _guard = self.guard.lock().map_err(|_| lock_err("favorites.file"))?;
        let mut document = self.read_document()?;
        let out = f(&mut document);
        self.write_document(&document)?;
        Ok(out)
    }
}

impl FavoritesStore for JsonFileFavoritesStore {
    fn load(&self, scenario: &ScenarioKey) -> Result<Vec<FavoriteCombo>, StorageError> {
        let _guard = self.guard.lock().map_err(|_| lock_err("favorites.file"))?;
        let mut document = self.read_document()?;
        Ok(document.remove(&scenario.to_string()).unwrap_or_default())
    }

    fn save(&self, scenario: &ScenarioKey, favorites: Vec<FavoriteCombo>) -> Result<(), StorageError> {
        self.update(|document| {
            document.insert(scenario.to_string(), favorites);
        })
    }

    fn toggle(&self, scenario: &ScenarioKey, favorite: FavoriteCombo) -> Result<Vec<FavoriteCombo>, StorageError> {
        self.update(|document| {
            let list = document.entry(scenario.to_string()).or_default();
            toggle_in(list, favorite);
            list.clone()
        })
    }
}
