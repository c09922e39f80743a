//! Favorites storage backends.

mod file;
mod memory;
mod traits;

pub use file::JsonFileFavoritesStore;
pub use memory::InMemoryFavoritesStore;
pub use traits::{FavoritesStore, StorageError};
