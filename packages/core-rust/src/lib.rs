//! Stowage core: record values, identifiers, and blob codecs.

pub mod codec;
pub mod record;
pub mod types;

pub use codec::{CodecError, CodecKind};
pub use record::{Record, ID_ATTRIBUTE};
pub use types::{Blob, RecordId, Value};
