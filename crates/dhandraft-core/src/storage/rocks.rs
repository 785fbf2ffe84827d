use async_trait::async_trait;
use parking_lot::Mutex;
use rocksdb::{Direction, IteratorMode, Options, DB};
use std::path::Path;

use super::{DocumentBackend, ModifyFn};
use crate::{CoreError, Result};

/// Documents live in the default column family under `collection \0 id`.
pub struct RocksDbBackend {
    db: DB,
    // Serializes check-then-write sequences; plain puts and reads go straight through.
    write_lock: Mutex<()>,
}

impl RocksDbBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);

        let db = DB::open(&opts, path.as_ref())
            .map_err(|e| CoreError::Storage(format!("Failed to open database: {}", e)))?;
        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    fn key(collection: &str, id: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(collection.len() + 1 + id.len());
        key.extend_from_slice(collection.as_bytes());
        key.push(0);
        key.extend_from_slice(id.as_bytes());
        key
    }

    fn storage_err(e: rocksdb::Error) -> CoreError {
        CoreError::Storage(e.to_string())
    }
}

#[async_trait]
impl DocumentBackend for RocksDbBackend {
    async fn put(&self, collection: &str, id: &str, doc: Vec<u8>) -> Result<()> {
        self.db
            .put(Self::key(collection, id), doc)
            .map_err(Self::storage_err)
    }

    async fn put_if_absent(&self, collection: &str, id: &str, doc: Vec<u8>) -> Result<bool> {
        let key = Self::key(collection, id);
        let _guard = self.write_lock.lock();
        if self.db.get(&key).map_err(Self::storage_err)?.is_some() {
            return Ok(false);
        }
        self.db.put(&key, doc).map_err(Self::storage_err)?;
        Ok(true)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Vec<u8>>> {
        self.db
            .get(Self::key(collection, id))
            .map_err(Self::storage_err)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let key = Self::key(collection, id);
        let _guard = self.write_lock.lock();
        if self.db.get(&key).map_err(Self::storage_err)?.is_none() {
            return Ok(false);
        }
        self.db.delete(&key).map_err(Self::storage_err)?;
        Ok(true)
    }

    async fn scan(&self, collection: &str) -> Result<Vec<Vec<u8>>> {
        let prefix = Self::key(collection, "");
        let mut docs = Vec::new();
        for item in self
            .db
            .iterator(IteratorMode::From(&prefix, Direction::Forward))
        {
            let (key, value) = item.map_err(Self::storage_err)?;
            if !key.starts_with(&prefix) {
                break;
            }
            docs.push(value.to_vec());
        }
        Ok(docs)
    }

    async fn modify(&self, collection: &str, id: &str, f: &mut ModifyFn<'_>) -> Result<bool> {
        let key = Self::key(collection, id);
        let _guard = self.write_lock.lock();
        let Some(current) = self.db.get(&key).map_err(Self::storage_err)? else {
            return Ok(false);
        };
        let next = f(&current)?;
        self.db.put(&key, next).map_err(Self::storage_err)?;
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "rocksdb"
    }
}
