//! Process-local record cache backed by [`DashMap`].
//!
//! [`RecordCache`] maps `(collection, key)` to the last state the adapter
//! synchronized with its store. It has no eviction policy: entries leave
//! only through [`remove`](RecordCache::remove) or
//! [`clear`](RecordCache::clear). Deleted records stay behind as
//! tombstones until the collection is cleared.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use dashmap::DashMap;
use stowage_core::Record;

/// A cached record state.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    /// Matches what the store holds.
    Live(Record),
    /// Removed from the store. Holds the last known attributes with the
    /// deletion flag set.
    Deleted(Record),
}

impl CacheEntry {
    /// Borrows the cached record.
    #[must_use]
    pub fn record(&self) -> &Record {
        match self {
            CacheEntry::Live(record) | CacheEntry::Deleted(record) => record,
        }
    }

    /// Takes the cached record.
    #[must_use]
    pub fn into_record(self) -> Record {
        match self {
            CacheEntry::Live(record) | CacheEntry::Deleted(record) => record,
        }
    }

    /// Whether this entry is a tombstone.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        matches!(self, CacheEntry::Deleted(_))
    }
}

/// In-memory `(collection, key) -> CacheEntry` map.
///
/// Safe to share across tasks; every method takes `&self`.
#[derive(Debug, Default)]
pub struct RecordCache {
    collections: DashMap<String, HashMap<String, CacheEntry>>,
}

impl RecordCache {
    /// Creates a new, empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an entry.
    #[must_use]
    pub fn get(&self, collection: &str, key: &str) -> Option<CacheEntry> {
        self.collections
            .get(collection)
            .and_then(|entries| entries.get(key).cloned())
    }

    /// Stores a live record, replacing any entry (tombstones included).
    /// Returns the previous entry.
    pub fn put(&self, collection: &str, key: &str, mut record: Record) -> Option<CacheEntry> {
        record.set_deleted(false);
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), CacheEntry::Live(record))
    }

    /// Stores a live record unless an entry already exists. Returns the
    /// entry that is resident afterwards and whether `record` was inserted.
    pub fn put_if_absent(
        &self,
        collection: &str,
        key: &str,
        mut record: Record,
    ) -> (CacheEntry, bool) {
        record.set_deleted(false);
        let mut entries = self.collections.entry(collection.to_string()).or_default();
        match entries.entry(key.to_string()) {
            Entry::Occupied(resident) => (resident.get().clone(), false),
            Entry::Vacant(slot) => (slot.insert(CacheEntry::Live(record)).clone(), true),
        }
    }

    /// Turns the entry for `key` into a tombstone. When nothing is cached,
    /// `fallback` becomes the tombstone. Returns `true` if an entry existed.
    pub fn mark_deleted(&self, collection: &str, key: &str, fallback: Record) -> bool {
        let mut entries = self.collections.entry(collection.to_string()).or_default();
        let (existed, mut record) = match entries.remove(key) {
            Some(entry) => (true, entry.into_record()),
            None => (false, fallback),
        };
        record.set_deleted(true);
        entries.insert(key.to_string(), CacheEntry::Deleted(record));
        existed
    }

    /// Drops the entry for `key`, returning it.
    pub fn remove(&self, collection: &str, key: &str) -> Option<CacheEntry> {
        self.collections
            .get_mut(collection)
            .and_then(|mut entries| entries.remove(key))
    }

    /// Drops every entry of a collection. Returns how many were dropped.
    pub fn clear(&self, collection: &str) -> usize {
        self.collections
            .remove(collection)
            .map_or(0, |(_, entries)| entries.len())
    }

    /// Whether an entry (live or tombstone) exists for `key`.
    #[must_use]
    pub fn contains(&self, collection: &str, key: &str) -> bool {
        self.collections
            .get(collection)
            .is_some_and(|entries| entries.contains_key(key))
    }

    /// Number of entries (tombstones included) in a collection.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map_or(0, |entries| entries.len())
    }

    /// Whether a collection has no entries.
    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[cfg(test)]
mod tests {
    use stowage_core::Value;

    use super::*;

    fn post(id: i64, title: &str) -> Record {
        Record::empty().with("id", id).with("title", title)
    }

    #[test]
    fn put_get_remove_round_trip() {
        let cache = RecordCache::new();
        assert!(cache.put("posts", "1", post(1, "a")).is_none());

        let entry = cache.get("posts", "1").unwrap();
        assert_eq!(entry, CacheEntry::Live(post(1, "a")));

        let removed = cache.remove("posts", "1").unwrap();
        assert_eq!(removed.record().get("title"), Some(&Value::from("a")));
        assert!(cache.get("posts", "1").is_none());
    }

    #[test]
    fn put_replaces_and_returns_previous() {
        let cache = RecordCache::new();
        cache.put("posts", "1", post(1, "a"));
        let previous = cache.put("posts", "1", post(1, "b")).unwrap();
        assert_eq!(previous.record().get("title"), Some(&Value::from("a")));
        assert_eq!(
            cache.get("posts", "1").unwrap().record().get("title"),
            Some(&Value::from("b"))
        );
    }

    #[test]
    fn put_if_absent_keeps_resident_entry() {
        let cache = RecordCache::new();
        cache.put("posts", "1", post(1, "newer"));

        let (resident, inserted) = cache.put_if_absent("posts", "1", post(1, "stale"));
        assert_eq!(resident.record().get("title"), Some(&Value::from("newer")));
        assert!(!inserted);

        let (fresh, inserted) = cache.put_if_absent("posts", "2", post(2, "fresh"));
        assert_eq!(fresh, CacheEntry::Live(post(2, "fresh")));
        assert!(inserted);
    }

    #[test]
    fn mark_deleted_keeps_attributes() {
        let cache = RecordCache::new();
        cache.put("posts", "1", post(1, "a"));

        assert!(cache.mark_deleted("posts", "1", Record::empty()));

        let entry = cache.get("posts", "1").unwrap();
        assert!(entry.is_deleted());
        let record = entry.into_record();
        assert!(record.is_deleted());
        assert_eq!(record.get("title"), Some(&Value::from("a")));
    }

    #[test]
    fn mark_deleted_uses_fallback_when_uncached() {
        let cache = RecordCache::new();
        assert!(!cache.mark_deleted("posts", "9", Record::empty().with("id", 9)));

        let record = cache.get("posts", "9").unwrap().into_record();
        assert!(record.is_deleted());
        assert_eq!(record.get("id"), Some(&Value::Int(9)));
    }

    #[test]
    fn put_revives_tombstone() {
        let cache = RecordCache::new();
        cache.put("posts", "1", post(1, "a"));
        cache.mark_deleted("posts", "1", Record::empty());

        let mut record = post(1, "again");
        record.set_deleted(true);
        cache.put("posts", "1", record);

        let entry = cache.get("posts", "1").unwrap();
        assert!(!entry.is_deleted());
        assert!(!entry.record().is_deleted());
    }

    #[test]
    fn clear_drops_only_one_collection() {
        let cache = RecordCache::new();
        cache.put("posts", "1", post(1, "a"));
        cache.put("posts", "2", post(2, "b"));
        cache.put("comments", "1", post(1, "c"));

        assert_eq!(cache.clear("posts"), 2);
        assert!(cache.is_empty("posts"));
        assert_eq!(cache.len("comments"), 1);
        assert_eq!(cache.clear("posts"), 0);
    }

    #[test]
    fn contains_reflects_state() {
        let cache = RecordCache::new();
        assert!(!cache.contains("posts", "1"));
        cache.put("posts", "1", post(1, "a"));
        assert!(cache.contains("posts", "1"));
        cache.mark_deleted("posts", "1", Record::empty());
        assert!(cache.contains("posts", "1"));
        cache.remove("posts", "1");
        assert!(!cache.contains("posts", "1"));
    }
}
