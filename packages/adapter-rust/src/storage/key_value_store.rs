//! Asynchronous key-value backend trait.
//!
//! Defines [`KeyValueStore`], the persistence layer underneath the
//! [`PersistenceAdapter`](crate::adapter::PersistenceAdapter). The adapter
//! hands it opaque [`Blob`]s keyed by string id within a named collection;
//! the implementation decides how and where they are kept.

use async_trait::async_trait;
use stowage_core::Blob;

/// Asynchronous blob storage partitioned into named collections.
///
/// Collection names arrive already namespaced by the adapter. A collection
/// that was never written behaves like an empty one: reads return nothing
/// and removals succeed.
///
/// Used as `Arc<dyn KeyValueStore>`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Load a single blob. Returns `None` if the key does not exist.
    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Blob>>;

    /// Insert or replace a blob.
    async fn put(&self, collection: &str, id: &str, blob: &Blob) -> anyhow::Result<()>;

    /// Remove a blob. Removing a missing key is not an error.
    async fn remove(&self, collection: &str, id: &str) -> anyhow::Result<()>;

    /// Every `(id, blob)` pair in the collection, in the backend's
    /// enumeration order.
    async fn all(&self, collection: &str) -> anyhow::Result<Vec<(String, Blob)>>;

    /// Drop every entry of the collection.
    async fn clear_all(&self, collection: &str) -> anyhow::Result<()>;

    /// Whether this is a null (no-op) implementation.
    ///
    /// Returns `false` by default. Null implementations override to return
    /// `true`, and identifier seeding then skips enumerating the store.
    fn is_null(&self) -> bool {
        false
    }
}
