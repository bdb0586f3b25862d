//! No-op [`KeyValueStore`] implementation.
//!
//! [`NullStore`] discards all writes and returns empty results for reads.
//! Useful for benchmarks and for adapters whose records only need to live as
//! long as the in-memory cache.

use async_trait::async_trait;
use stowage_core::Blob;

use crate::storage::key_value_store::KeyValueStore;

/// No-op `KeyValueStore`.
///
/// All write operations succeed immediately without side effects.
/// All read operations return empty results.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

#[async_trait]
impl KeyValueStore for NullStore {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn get(&self, _collection: &str, _id: &str) -> anyhow::Result<Option<Blob>> {
        Ok(None)
    }

    async fn put(&self, _collection: &str, _id: &str, _blob: &Blob) -> anyhow::Result<()> {
        Ok(())
    }

    async fn remove(&self, _collection: &str, _id: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn all(&self, _collection: &str) -> anyhow::Result<Vec<(String, Blob)>> {
        Ok(Vec::new())
    }

    async fn clear_all(&self, _collection: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn is_null(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_returns_ok() {
        let store = NullStore;
        let blob = Blob::from(b"{}".to_vec());
        assert!(store.put("posts", "1", &blob).await.is_ok());
    }

    #[tokio::test]
    async fn get_returns_none_after_put() {
        let store = NullStore;
        store
            .put("posts", "1", &Blob::from(b"{}".to_vec()))
            .await
            .unwrap();
        assert!(store.get("posts", "1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_returns_ok() {
        let store = NullStore;
        assert!(store.remove("posts", "1").await.is_ok());
    }

    #[tokio::test]
    async fn all_returns_empty_vec() {
        let store = NullStore;
        assert!(store.all("posts").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_all_returns_ok() {
        let store = NullStore;
        assert!(store.clear_all("posts").await.is_ok());
    }

    #[test]
    fn is_null_returns_true() {
        assert!(NullStore.is_null());
        assert_eq!(NullStore.name(), "null");
    }
}
