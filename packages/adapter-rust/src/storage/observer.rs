//! Adapter observer trait and composite implementation.
//!
//! Defines [`AdapterObserver`] for reacting to completed adapter operations
//! (the hooks a model layer uses for its own lifecycle callbacks), and
//! [`CompositeObserver`] which fans out notifications to multiple observers.
//!
//! Observers run synchronously after the store and cache have been updated.

use std::sync::Arc;

use stowage_core::{Record, RecordId};

/// Observer for completed adapter operations.
///
/// Used as `Arc<dyn AdapterObserver>`. Every method has an empty default.
pub trait AdapterObserver: Send + Sync {
    /// Called after a record was written to the store.
    ///
    /// `created` is true when the id was generated or the record was not
    /// cached as live before the save.
    fn on_save(&self, _collection: &str, _record: &Record, _created: bool) {}

    /// Called after a record was read from the store into the cache.
    fn on_load(&self, _collection: &str, _record: &Record) {}

    /// Called after a record was removed from the store.
    fn on_delete(&self, _collection: &str, _id: &RecordId) {}

    /// Called after a collection's cache was cleared.
    fn on_clear_cache(&self, _collection: &str, _dropped: usize) {}

    /// Called after a collection was emptied in the store.
    fn on_purge(&self, _collection: &str) {}
}

/// Composite observer that fans out to multiple observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn AdapterObserver>>,
}

impl CompositeObserver {
    /// Creates a composite observer with the given list of observers.
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn AdapterObserver>>) -> Self {
        Self { observers }
    }

    /// Adds an observer after construction.
    pub fn add(&mut self, observer: Arc<dyn AdapterObserver>) {
        self.observers.push(observer);
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl AdapterObserver for CompositeObserver {
    fn on_save(&self, collection: &str, record: &Record, created: bool) {
        for observer in &self.observers {
            observer.on_save(collection, record, created);
        }
    }

    fn on_load(&self, collection: &str, record: &Record) {
        for observer in &self.observers {
            observer.on_load(collection, record);
        }
    }

    fn on_delete(&self, collection: &str, id: &RecordId) {
        for observer in &self.observers {
            observer.on_delete(collection, id);
        }
    }

    fn on_clear_cache(&self, collection: &str, dropped: usize) {
        for observer in &self.observers {
            observer.on_clear_cache(collection, dropped);
        }
    }

    fn on_purge(&self, collection: &str) {
        for observer in &self.observers {
            observer.on_purge(collection);
        }
    }
}
