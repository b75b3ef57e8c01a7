//! Persistence is a single key-value seam, [KeyValueStore]. Values are whole documents: a write
//! always replaces everything stored under a key, there are no partial updates.
//!  - [file_store::FileStore] keeps one JSON file per key and is what the binary uses.
//!  - [memory_store::MemoryStore] keeps values in memory, for ephemeral sessions and tests.

pub mod file_store;
pub mod memory_store;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

/// Key under which the punch history is stored.
pub const DEFAULT_STORAGE_KEY: &str = "timeRecords";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when nothing was ever stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }
}
