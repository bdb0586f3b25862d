//! In-memory [`KeyValueStore`] implementation backed by [`DashMap`].
//!
//! Each collection keeps its entries in insertion order: `all()` returns
//! keys in the order they were first written, and overwriting a key keeps
//! its original position.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use stowage_core::Blob;

use crate::storage::key_value_store::KeyValueStore;

#[derive(Debug, Default)]
struct Collection {
    entries: HashMap<String, Slot>,
    next_position: u64,
}

#[derive(Debug)]
struct Slot {
    position: u64,
    blob: Blob,
}

/// Process-local store. Shares nothing with other instances.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, Collection>,
}

impl MemoryStore {
    /// Creates a new, empty `MemoryStore`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in a collection.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map_or(0, |c| c.entries.len())
    }

    /// Whether a collection holds no entries.
    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Blob>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|c| c.entries.get(id).map(|slot| slot.blob.clone())))
    }

    async fn put(&self, collection: &str, id: &str, blob: &Blob) -> anyhow::Result<()> {
        let mut entry = self.collections.entry(collection.to_string()).or_default();
        let c = entry.value_mut();
        if let Some(slot) = c.entries.get_mut(id) {
            slot.blob = blob.clone();
        } else {
            let position = c.next_position;
            c.next_position += 1;
            c.entries.insert(
                id.to_string(),
                Slot {
                    position,
                    blob: blob.clone(),
                },
            );
        }
        Ok(())
    }

    async fn remove(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        if let Some(mut c) = self.collections.get_mut(collection) {
            c.entries.remove(id);
        }
        Ok(())
    }

    async fn all(&self, collection: &str) -> anyhow::Result<Vec<(String, Blob)>> {
        let Some(c) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut slots: Vec<(&String, &Slot)> = c.entries.iter().collect();
        slots.sort_by_key(|(_, slot)| slot.position);
        Ok(slots
            .into_iter()
            .map(|(id, slot)| (id.clone(), slot.blob.clone()))
            .collect())
    }

    async fn clear_all(&self, collection: &str) -> anyhow::Result<()> {
        self.collections.remove(collection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(s: &str) -> Blob {
        Blob::from(s.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn put_get_remove_round_trip() {
        let store = MemoryStore::new();
        store.put("posts", "1", &blob("a")).await.unwrap();

        assert_eq!(store.get("posts", "1").await.unwrap(), Some(blob("a")));

        store.remove("posts", "1").await.unwrap();
        assert!(store.get("posts", "1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let store = MemoryStore::new();
        store.put("posts", "1", &blob("a")).await.unwrap();

        assert!(store.get("comments", "1").await.unwrap().is_none());
        assert_eq!(store.len("posts"), 1);
        assert!(store.is_empty("comments"));
    }

    #[tokio::test]
    async fn all_keeps_insertion_order_across_overwrites() {
        let store = MemoryStore::new();
        for id in ["10", "2", "7"] {
            store.put("posts", id, &blob(id)).await.unwrap();
        }
        store.put("posts", "10", &blob("updated")).await.unwrap();

        let all = store.all("posts").await.unwrap();
        let ids: Vec<&str> = all.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["10", "2", "7"]);
        assert_eq!(all[0].1, blob("updated"));
    }

    #[tokio::test]
    async fn remove_missing_key_is_ok() {
        let store = MemoryStore::new();
        assert!(store.remove("posts", "404").await.is_ok());
        assert!(store.all("posts").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_all_drops_only_that_collection() {
        let store = MemoryStore::new();
        store.put("posts", "1", &blob("a")).await.unwrap();
        store.put("posts", "2", &blob("b")).await.unwrap();
        store.put("comments", "1", &blob("c")).await.unwrap();

        store.clear_all("posts").await.unwrap();

        assert!(store.is_empty("posts"));
        assert_eq!(store.len("comments"), 1);
    }

    #[test]
    fn is_not_null() {
        assert!(!MemoryStore::new().is_null());
    }
}
