//! Identifier generation for records saved without an id.
//!
//! [`SequentialIdGenerator`] hands out increasing integers per collection.
//! Its counter is seeded from the largest integer key already in the store
//! the first time a collection asks for an id, and raised whenever the
//! adapter saves a caller-supplied integer id, so a generated id never
//! lands on a key that is known to be taken.
//!
//! [`UuidIdGenerator`] returns random v4 UUID strings and needs no state.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use stowage_core::types::parse_sequence_key;
use stowage_core::RecordId;

use crate::error::AdapterError;
use crate::storage::key_value_store::KeyValueStore;

/// Which built-in generator an adapter uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// [`SequentialIdGenerator`].
    #[default]
    Sequential,
    /// [`UuidIdGenerator`].
    Uuid,
}

/// Produces ids for records saved without one.
///
/// `collection` is the logical collection name; `store_collection` is the
/// namespaced name to read from `store` when the generator needs to look at
/// existing keys.
///
/// Used as `Arc<dyn IdGenerator>`.
#[async_trait]
pub trait IdGenerator: Send + Sync {
    /// Returns an id not known to be in use in `collection`.
    async fn next(
        &self,
        collection: &str,
        store_collection: &str,
        store: &dyn KeyValueStore,
    ) -> Result<RecordId, AdapterError>;

    /// Reports an id the caller supplied, so it is never generated later.
    fn observe(&self, collection: &str, id: &RecordId);

    /// Forgets everything about `collection` (after the store was emptied).
    fn reset(&self, collection: &str);
}

#[derive(Debug, Default, Clone, Copy)]
struct Sequence {
    last: u64,
    seeded: bool,
}

/// Per-collection integer counter seeded from the store.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    sequences: Mutex<HashMap<String, Sequence>>,
}

impl SequentialIdGenerator {
    /// Creates a generator with no collection state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last id handed out or observed for `collection`, 0 if none.
    #[must_use]
    pub fn current(&self, collection: &str) -> u64 {
        self.sequences
            .lock()
            .get(collection)
            .map_or(0, |sequence| sequence.last)
    }

    fn is_seeded(&self, collection: &str) -> bool {
        self.sequences
            .lock()
            .get(collection)
            .is_some_and(|sequence| sequence.seeded)
    }
}

#[async_trait]
impl IdGenerator for SequentialIdGenerator {
    async fn next(
        &self,
        collection: &str,
        store_collection: &str,
        store: &dyn KeyValueStore,
    ) -> Result<RecordId, AdapterError> {
        // Seeding reads the store outside the lock. Concurrent seeds merge
        // with max(), so losing the race only repeats the read.
        let seed = if self.is_seeded(collection) {
            None
        } else if store.is_null() {
            Some(0)
        } else {
            let entries = store.all(store_collection).await.map_err(|source| {
                AdapterError::storage(collection, "seed identifiers", source)
            })?;
            let max = entries
                .iter()
                .filter_map(|(key, _)| parse_sequence_key(key))
                .max()
                .unwrap_or(0);
            tracing::debug!(collection, max, "seeded identifier sequence from store");
            Some(max)
        };

        let mut sequences = self.sequences.lock();
        let sequence = sequences.entry(collection.to_string()).or_default();
        if let Some(max) = seed {
            sequence.last = sequence.last.max(max);
            sequence.seeded = true;
        }

        let next = sequence
            .last
            .checked_add(1)
            .and_then(|n| i64::try_from(n).ok())
            .ok_or_else(|| AdapterError::IdentifierExhaustion {
                collection: collection.to_string(),
            })?;
        sequence.last = next.unsigned_abs();
        Ok(RecordId::Int(next))
    }

    fn observe(&self, collection: &str, id: &RecordId) {
        let Some(n) = id.sequence_number() else {
            return;
        };
        let mut sequences = self.sequences.lock();
        let sequence = sequences.entry(collection.to_string()).or_default();
        sequence.last = sequence.last.max(n);
    }

    fn reset(&self, collection: &str) {
        self.sequences.lock().remove(collection);
    }
}

/// Random v4 UUID ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

#[async_trait]
impl IdGenerator for UuidIdGenerator {
    async fn next(
        &self,
        _collection: &str,
        _store_collection: &str,
        _store: &dyn KeyValueStore,
    ) -> Result<RecordId, AdapterError> {
        Ok(RecordId::Str(uuid::Uuid::new_v4().to_string()))
    }

    fn observe(&self, _collection: &str, _id: &RecordId) {}

    fn reset(&self, _collection: &str) {}
}
