//! Document storage: named collections of JSON documents keyed by string id.

mod collection;
mod memory;
#[cfg(feature = "rocksdb")]
mod rocks;

pub use collection::{Collection, Database};
pub use memory::MemoryBackend;
#[cfg(feature = "rocksdb")]
pub use rocks::RocksDbBackend;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::Result;

/// Read-modify-write callback handed to [`DocumentBackend::modify`].
pub type ModifyFn<'a> = dyn FnMut(&[u8]) -> Result<Vec<u8>> + Send + 'a;

#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn put(&self, collection: &str, id: &str, doc: Vec<u8>) -> Result<()>;

    /// Returns `false` and leaves the stored document untouched when `id` already exists.
    async fn put_if_absent(&self, collection: &str, id: &str, doc: Vec<u8>) -> Result<bool>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Vec<u8>>>;

    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    /// Every document of `collection`, in id order.
    async fn scan(&self, collection: &str) -> Result<Vec<Vec<u8>>>;

    /// Atomically replaces a document with the output of `f`. Returns `false` if it does not exist.
    async fn modify(&self, collection: &str, id: &str, f: &mut ModifyFn<'_>) -> Result<bool>;

    fn name(&self) -> &'static str;
}

pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static str;
    fn id(&self) -> &str;
}
