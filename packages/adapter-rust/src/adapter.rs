//! Cached record persistence over a [`KeyValueStore`].
//!
//! [`PersistenceAdapter`] is the single gateway between application records
//! and the store. It coordinates:
//! - the [`KeyValueStore`] holding encoded records per namespaced collection
//! - the [`RecordCache`] holding the last synchronized state of each record
//! - the [`IdGenerator`] assigning ids to records saved without one
//! - an [`AdapterObserver`] notified after each completed operation
//!
//! The cache is refreshed only after the store call it mirrors succeeded,
//! so a failed write leaves both untouched and a read that follows a
//! completed write observes it. Lookups of keys the store does not hold
//! resolve to [`Record::empty`]; [`try_find`](PersistenceAdapter::try_find)
//! exposes the same lookup as an `Option`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::try_join_all;
use stowage_core::{Record, RecordId};
use tracing::Instrument;

use crate::config::AdapterConfig;
use crate::error::AdapterError;
use crate::storage::cache::{CacheEntry, RecordCache};
use crate::storage::identifier::{IdGenerator, IdStrategy, SequentialIdGenerator, UuidIdGenerator};
use crate::storage::key_value_store::KeyValueStore;
use crate::storage::observer::{AdapterObserver, CompositeObserver};
use crate::telemetry::metric_names;

/// Record persistence adapter with a consistency-preserving cache.
///
/// One adapter owns its cache; the store is expected to be written only
/// through this adapter for the collections it serves.
pub struct PersistenceAdapter {
    config: AdapterConfig,
    store: Arc<dyn KeyValueStore>,
    cache: RecordCache,
    ids: Arc<dyn IdGenerator>,
    observer: Arc<dyn AdapterObserver>,
}

impl PersistenceAdapter {
    /// Creates an adapter over `store`, picking the id generator named by
    /// `config.id_strategy`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, config: AdapterConfig) -> Self {
        let ids: Arc<dyn IdGenerator> = match config.id_strategy {
            IdStrategy::Sequential => Arc::new(SequentialIdGenerator::new()),
            IdStrategy::Uuid => Arc::new(UuidIdGenerator),
        };
        tracing::debug!(
            store = store.name(),
            namespace = %config.namespace,
            codec = ?config.codec,
            "persistence adapter created"
        );
        Self {
            config,
            store,
            cache: RecordCache::new(),
            ids,
            observer: Arc::new(CompositeObserver::default()),
        }
    }

    /// Replaces the id generator.
    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Replaces the observer. Use a [`CompositeObserver`] for several.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn AdapterObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The adapter's configuration.
    #[must_use]
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Prefix prepended to collection names in the store.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// Read access to the cache, for diagnostics.
    #[must_use]
    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// Name of `collection` in the store.
    #[must_use]
    pub fn store_collection(&self, collection: &str) -> String {
        format!("{}{}", self.config.namespace, collection)
    }

    // --- Writes ---

    /// Persists `record`, assigning an id if it has none, and returns it.
    ///
    /// A truthy `id` is kept verbatim. The record is validated against the
    /// codec before any store call.
    ///
    /// # Errors
    ///
    /// `SerializationFailure` if the record cannot be encoded,
    /// `IdentifierExhaustion` if no id can be generated, `StorageFailure`
    /// if the store rejects the write. On error the cache is untouched.
    pub async fn save(&self, collection: &str, record: Record) -> Result<Record, AdapterError> {
        let span = tracing::debug_span!("save", collection);
        self.save_inner(collection, record).instrument(span).await
    }

    async fn save_inner(&self, collection: &str, mut record: Record) -> Result<Record, AdapterError> {
        record.set_deleted(false);
        self.config.codec.validate(&record)?;

        let store_collection = self.store_collection(collection);
        let (id, generated) = if let Some(id) = record.id() {
            self.ids.observe(collection, &id);
            (id, false)
        } else {
            let id = self
                .ids
                .next(collection, &store_collection, self.store.as_ref())
                .await?;
            tracing::debug!(collection, id = %id, "assigned generated id");
            record.set_id(id.clone());
            (id, true)
        };

        let key = id.to_key();
        let blob = self.config.codec.encode(&record)?;
        self.store_call(collection, "put", self.store.put(&store_collection, &key, &blob))
            .await?;

        let previous = self.cache.put(collection, &key, record.clone());
        let created = generated || !matches!(previous, Some(CacheEntry::Live(_)));
        self.observer.on_save(collection, &record, created);
        Ok(record)
    }

    /// Removes the record from the store and leaves a tombstone in the
    /// cache. Until the cache is cleared, [`find`](Self::find) returns the
    /// record with [`Record::is_deleted`] set; afterwards it resolves to an
    /// empty record. Deleting an unknown id succeeds.
    ///
    /// # Errors
    ///
    /// `StorageFailure` if the store rejects the removal; the cache is
    /// untouched in that case.
    pub async fn delete(
        &self,
        collection: &str,
        id: impl Into<RecordId>,
    ) -> Result<(), AdapterError> {
        let id = id.into();
        let span = tracing::debug_span!("delete", collection, id = %id);
        async {
            let key = id.to_key();
            let store_collection = self.store_collection(collection);
            self.store_call(collection, "remove", self.store.remove(&store_collection, &key))
                .await?;

            let mut fallback = Record::empty();
            fallback.set_id(id.clone());
            let was_cached = self.cache.mark_deleted(collection, &key, fallback);
            tracing::debug!(collection, key = %key, was_cached, "record deleted");
            self.observer.on_delete(collection, &id);
            Ok::<(), AdapterError>(())
        }
        .instrument(span)
        .await
    }

    /// Drops every cached entry of `collection`, tombstones included. The
    /// store is not touched. Returns how many entries were dropped.
    pub fn clear_cache(&self, collection: &str) -> usize {
        let dropped = self.cache.clear(collection);
        tracing::debug!(collection, dropped, "cache cleared");
        self.observer.on_clear_cache(collection, dropped);
        dropped
    }

    /// Empties `collection` in the store, clears its cache and forgets its
    /// id sequence.
    ///
    /// # Errors
    ///
    /// `StorageFailure` if the store cannot be cleared; nothing else is
    /// reset in that case.
    pub async fn purge(&self, collection: &str) -> Result<(), AdapterError> {
        let store_collection = self.store_collection(collection);
        self.store_call(collection, "clear_all", self.store.clear_all(&store_collection))
            .await?;
        self.cache.clear(collection);
        self.ids.reset(collection);
        tracing::info!(collection, store_collection = %store_collection, "collection purged");
        self.observer.on_purge(collection);
        Ok(())
    }

    // --- Reads ---

    /// Looks up one record. Missing keys resolve to [`Record::empty`].
    ///
    /// # Errors
    ///
    /// `StorageFailure` if the store read fails, `SerializationFailure` if
    /// the stored blob cannot be decoded.
    pub async fn find(
        &self,
        collection: &str,
        id: impl Into<RecordId>,
    ) -> Result<Record, AdapterError> {
        Ok(self
            .try_find(collection, id)
            .await?
            .unwrap_or_else(Record::empty))
    }

    /// Looks up one record, returning `None` for missing keys.
    ///
    /// Cached entries (tombstones included) are returned without a store
    /// round-trip.
    ///
    /// # Errors
    ///
    /// Same as [`find`](Self::find).
    pub async fn try_find(
        &self,
        collection: &str,
        id: impl Into<RecordId>,
    ) -> Result<Option<Record>, AdapterError> {
        let key = id.into().to_key();
        let span = tracing::debug_span!("find", collection, key = %key);
        async {
            if let Some(entry) = self.cached(collection, &key) {
                return Ok(Some(entry.into_record()));
            }
            self.load(collection, &key).await
        }
        .instrument(span)
        .await
    }

    /// Every record persisted in `collection`, in store order.
    ///
    /// Keys already cached as live are served from the cache; the rest are
    /// decoded and cached.
    ///
    /// # Errors
    ///
    /// `StorageFailure` if the store enumeration fails,
    /// `SerializationFailure` if a stored blob cannot be decoded.
    pub async fn find_all(&self, collection: &str) -> Result<Vec<Record>, AdapterError> {
        let span = tracing::debug_span!("find_all", collection);
        async {
            let store_collection = self.store_collection(collection);
            let entries = self
                .store_call(collection, "all", self.store.all(&store_collection))
                .await?;

            let mut records = Vec::with_capacity(entries.len());
            for (key, blob) in entries {
                let record = match self.cache.get(collection, &key) {
                    Some(CacheEntry::Live(record)) => record,
                    // A tombstone for a key the store still holds is about
                    // to be replaced by a concurrent save; the store wins.
                    Some(CacheEntry::Deleted(_)) => self.config.codec.decode(&blob)?,
                    None => {
                        let record = self.config.codec.decode(&blob)?;
                        self.admit(collection, &key, record)
                    }
                };
                records.push(record);
            }
            tracing::debug!(collection, count = records.len(), "loaded collection");
            Ok::<_, AdapterError>(records)
        }
        .instrument(span)
        .await
    }

    /// One record per requested id, in request order.
    ///
    /// Cache misses are loaded from the store concurrently; ids the store
    /// does not hold yield [`Record::empty`] at their position.
    ///
    /// # Errors
    ///
    /// Fails with the first store or decode error among the misses.
    pub async fn find_many<I>(&self, collection: &str, ids: I) -> Result<Vec<Record>, AdapterError>
    where
        I: IntoIterator,
        I::Item: Into<RecordId>,
    {
        let keys: Vec<String> = ids.into_iter().map(|id| id.into().to_key()).collect();
        let span = tracing::debug_span!("find_many", collection, requested = keys.len());
        async {
            let mut slots: Vec<Option<Record>> = Vec::with_capacity(keys.len());
            let mut misses: Vec<usize> = Vec::new();
            for (position, key) in keys.iter().enumerate() {
                if let Some(entry) = self.cached(collection, key) {
                    slots.push(Some(entry.into_record()));
                } else {
                    slots.push(None);
                    misses.push(position);
                }
            }

            let mut unique: Vec<&str> = misses.iter().map(|&i| keys[i].as_str()).collect();
            unique.sort_unstable();
            unique.dedup();
            let loaded = try_join_all(unique.iter().map(|key| self.load(collection, key))).await?;
            let by_key: HashMap<&str, Option<Record>> = unique.into_iter().zip(loaded).collect();

            for position in misses {
                slots[position] = by_key.get(keys[position].as_str()).cloned().flatten();
            }
            Ok::<Vec<Record>, AdapterError>(
                slots
                    .into_iter()
                    .map(|slot| slot.unwrap_or_else(Record::empty))
                    .collect(),
            )
        }
        .instrument(span)
        .await
    }

    // --- Internals ---

    fn cached(&self, collection: &str, key: &str) -> Option<CacheEntry> {
        let entry = self.cache.get(collection, key);
        if let Some(ref entry) = entry {
            metrics::counter!(metric_names::CACHE_HITS).increment(1);
            tracing::debug!(collection, key, deleted = entry.is_deleted(), "cache hit");
        } else {
            metrics::counter!(metric_names::CACHE_MISSES).increment(1);
            tracing::debug!(collection, key, "cache miss");
        }
        entry
    }

    async fn load(&self, collection: &str, key: &str) -> Result<Option<Record>, AdapterError> {
        let store_collection = self.store_collection(collection);
        let Some(blob) = self
            .store_call(collection, "get", self.store.get(&store_collection, key))
            .await?
        else {
            tracing::debug!(collection, key, "record not in store");
            return Ok(None);
        };
        let record = self.config.codec.decode(&blob)?;
        Ok(Some(self.admit(collection, key, record)))
    }

    /// Caches a record read from the store unless an entry appeared while
    /// it was being read, and returns whichever entry is resident. Only an
    /// inserted record counts as loaded.
    fn admit(&self, collection: &str, key: &str, record: Record) -> Record {
        let (entry, inserted) = self.cache.put_if_absent(collection, key, record);
        if inserted {
            self.observer.on_load(collection, entry.record());
        } else {
            tracing::debug!(collection, key, "kept entry cached during load");
        }
        entry.into_record()
    }

    async fn store_call<T>(
        &self,
        collection: &str,
        operation: &'static str,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, AdapterError> {
        let result = call.await;
        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(
            metric_names::STORE_OPERATIONS,
            "operation" => operation,
            "outcome" => outcome
        )
        .increment(1);
        result.map_err(|source| {
            tracing::warn!(
                store = self.store.name(),
                collection,
                operation,
                error = %source,
                "store operation failed"
            );
            AdapterError::storage(collection, operation, source)
        })
    }
}
