use stowage_core::CodecError;

/// Errors returned by [`PersistenceAdapter`](crate::adapter::PersistenceAdapter)
/// operations.
///
/// A missing record is not an error: lookups resolve to an empty record or
/// `None` instead.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The key-value store failed. Never retried by the adapter.
    #[error("storage failure during {operation} on `{collection}`: {source}")]
    StorageFailure {
        collection: String,
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
    /// A record could not be encoded, or a stored blob could not be decoded.
    #[error("serialization failure: {0}")]
    SerializationFailure(#[from] CodecError),
    /// No unused identifier is left for the collection.
    #[error("identifier space exhausted for `{collection}`")]
    IdentifierExhaustion { collection: String },
}

impl AdapterError {
    pub(crate) fn storage(
        collection: &str,
        operation: &'static str,
        source: anyhow::Error,
    ) -> Self {
        AdapterError::StorageFailure {
            collection: collection.to_string(),
            operation,
            source,
        }
    }

    /// Whether the error came from the key-value store.
    #[must_use]
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, AdapterError::StorageFailure { .. })
    }
}
