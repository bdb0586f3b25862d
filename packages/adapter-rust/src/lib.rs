//! Stowage adapter: cached, namespaced record persistence over pluggable
//! key-value stores.

pub mod adapter;
pub mod config;
pub mod error;
pub mod storage;
pub mod telemetry;

pub use adapter::PersistenceAdapter;
pub use config::AdapterConfig;
pub use error::AdapterError;
pub use storage::stores;
pub use storage::{
    AdapterObserver, CacheEntry, CompositeObserver, IdGenerator, IdStrategy, KeyValueStore,
    RecordCache, SequentialIdGenerator, UuidIdGenerator,
};
pub use stowage_core::{Blob, CodecError, CodecKind, Record, RecordId, Value, ID_ATTRIBUTE};
pub use telemetry::{init_tracing, LogFormat};
