//! Storage layers behind the persistence adapter.
//!
//! - [`KeyValueStore`]: the external store holding encoded records per
//!   collection, with in-memory, null and `redb` backends in [`stores`]
//! - [`RecordCache`]: per-collection cache of the last synchronized state of
//!   each record, including tombstones for deleted ones
//! - [`IdGenerator`]: identifier assignment for records saved without one
//!
//! Additionally defines [`AdapterObserver`] for reacting to completed
//! operations and [`CompositeObserver`] for fan-out to multiple observers.

pub mod cache;
pub mod identifier;
pub mod key_value_store;
pub mod observer;
pub mod stores;

pub use cache::*;
pub use identifier::*;
pub use key_value_store::*;
pub use observer::*;
