//! Persistence port and the saved-entity library.
//!
//! Collections are stored whole under a key; every write replaces the full
//! collection. Concurrent writers are not coordinated, the last write wins.

use anyhow::Result;

mod file;
mod library;
mod memory;


pub use file::FileStore;
pub use library::{
    Library, CHARACTERS_KEY, CHARACTER_DRAFTS_KEY, ITEMS_KEY, ITEM_DRAFTS_KEY,
};
pub use memory::MemoryStore;

/// Key-value store holding serialized collections
pub trait StoragePort: Send + Sync {
    /// Stored contents, `None` if the key was never written
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the contents stored under `key`
    fn write(&self, key: &str, contents: &str) -> Result<()>;
}

impl<S: StoragePort + ?Sized> StoragePort for std::sync::Arc<S> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, contents: &str) -> Result<()> {
        (**self).write(key, contents)
    }
}
