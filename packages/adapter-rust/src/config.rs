//! Adapter configuration.

use serde::Deserialize;
use stowage_core::CodecKind;

use crate::storage::identifier::IdStrategy;

/// Settings for a [`PersistenceAdapter`](crate::adapter::PersistenceAdapter).
///
/// Deserializes from JSON with every field optional:
///
/// ```
/// use stowage_adapter::AdapterConfig;
///
/// let config = AdapterConfig::from_json_str(r#"{"namespace": "blog-"}"#).unwrap();
/// assert_eq!(config.namespace, "blog-");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Prefix prepended to every collection name in the store, so several
    /// applications can share one physical store. Empty by default.
    pub namespace: String,
    /// Blob encoding for records.
    pub codec: CodecKind,
    /// Built-in identifier generator to use.
    pub id_strategy: IdStrategy,
}

impl AdapterConfig {
    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON or names an
    /// unknown codec or id strategy.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Sets the namespace prefix.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the codec.
    #[must_use]
    pub fn with_codec(mut self, codec: CodecKind) -> Self {
        self.codec = codec;
        self
    }

    /// Sets the id strategy.
    #[must_use]
    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }
}
