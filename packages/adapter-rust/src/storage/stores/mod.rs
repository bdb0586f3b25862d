//! `KeyValueStore` implementations.
//!
//! - [`MemoryStore`]: insertion-ordered, process-local
//! - [`NullStore`]: discards writes
//! - [`RedbStore`]: durable single-file store (`redb` feature)

mod memory;
mod null;
#[cfg(feature = "redb")]
mod redb;

pub use memory::MemoryStore;
pub use null::NullStore;
#[cfg(feature = "redb")]
pub use self::redb::RedbStore;
