//! Key-value persistence port
//!
//! Session state is mirrored into a small string key-value store so it
//! survives restarts. Stores may fail; callers decide how to degrade.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::utils::expand_tilde;
use std::sync::Arc;

/// Durable string key-value storage
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `Ok(None)` when the key is absent
    fn get(&self, key: &str) -> crate::Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> crate::Result<()>;

    /// Remove a key; removing a missing key is not an error
    fn remove(&self, key: &str) -> crate::Result<()>;

    /// Remove every key owned by this store
    fn clear(&self) -> crate::Result<()>;
}

/// Open the store described by the storage configuration
pub fn open_store(config: &StorageConfig) -> Arc<dyn KeyValueStore> {
    match config.backend {
        StorageBackend::File => Arc::new(FileStore::new(expand_tilde(&config.dir))),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    }
}
