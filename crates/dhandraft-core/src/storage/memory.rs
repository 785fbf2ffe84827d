use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use super::{DocumentBackend, ModifyFn};
use crate::Result;

/// Process-local backend. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryBackend {
    collections: RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn put(&self, collection: &str, id: &str, doc: Vec<u8>) -> Result<()> {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    async fn put_if_absent(&self, collection: &str, id: &str, doc: Vec<u8>) -> Result<bool> {
        let mut collections = self.collections.write();
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Ok(false);
        }
        docs.insert(id.to_string(), doc);
        Ok(true)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|docs| docs.get(id).cloned()))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        Ok(self
            .collections
            .write()
            .get_mut(collection)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn scan(&self, collection: &str) -> Result<Vec<Vec<u8>>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn modify(&self, collection: &str, id: &str, f: &mut ModifyFn<'_>) -> Result<bool> {
        let mut collections = self.collections.write();
        let Some(slot) = collections.get_mut(collection).and_then(|docs| docs.get_mut(id)) else {
            return Ok(false);
        };
        let next = f(slot.as_slice())?;
        *slot = next;
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_if_absent_keeps_first_writer() {
        let backend = MemoryBackend::new();
        assert!(backend.put_if_absent("c", "k", b"one".to_vec()).await.unwrap());
        assert!(!backend.put_if_absent("c", "k", b"two".to_vec()).await.unwrap());
        assert_eq!(backend.get("c", "k").await.unwrap(), Some(b"one".to_vec()));
    }

    #[tokio::test]
    async fn scan_is_scoped_to_collection() {
        let backend = MemoryBackend::new();
        backend.put("a", "2", b"a2".to_vec()).await.unwrap();
        backend.put("a", "1", b"a1".to_vec()).await.unwrap();
        backend.put("b", "1", b"b1".to_vec()).await.unwrap();
        assert_eq!(
            backend.scan("a").await.unwrap(),
            vec![b"a1".to_vec(), b"a2".to_vec()]
        );
        assert!(backend.scan("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn modify_and_delete() {
        let backend = MemoryBackend::new();
        backend.put("c", "k", b"x".to_vec()).await.unwrap();
        let changed = backend
            .modify("c", "k", &mut |old: &[u8]| {
                let mut next = old.to_vec();
                next.push(b'y');
                Ok(next)
            })
            .await
            .unwrap();
        assert!(changed);
        assert_eq!(backend.get("c", "k").await.unwrap(), Some(b"xy".to_vec()));
        assert!(!backend
            .modify("c", "nope", &mut |old: &[u8]| Ok(old.to_vec()))
            .await
            .unwrap());
        assert!(backend.delete("c", "k").await.unwrap());
        assert!(!backend.delete("c", "k").await.unwrap());
    }
}
