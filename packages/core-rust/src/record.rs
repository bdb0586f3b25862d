//! The unit of persistence: an attribute map with an `id`.

use std::collections::BTreeMap;

use crate::types::{RecordId, Value};

/// Name of the attribute holding a record's identifier.
pub const ID_ATTRIBUTE: &str = "id";

/// A record: attribute name to [`Value`], plus a deletion flag.
///
/// The `deleted` flag is lifecycle state observed through a cache, it is
/// never encoded into a blob. Two records are equal when their attributes
/// and their flags match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    attributes: BTreeMap<String, Value>,
    deleted: bool,
}

impl Record {
    /// A record with no attributes. Also what a lookup of a missing key
    /// resolves to.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a record from an attribute map.
    #[must_use]
    pub fn from_attributes(attributes: BTreeMap<String, Value>) -> Self {
        Self {
            attributes,
            deleted: false,
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets an attribute, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.attributes.insert(name.into(), value.into())
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Removes an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    /// Raw value of the `id` attribute.
    #[must_use]
    pub fn id_value(&self) -> Option<&Value> {
        self.attributes.get(ID_ATTRIBUTE)
    }

    /// The record's id, if it holds a usable one.
    ///
    /// Falsy or malformed `id` attributes yield `None`; use
    /// [`RecordId::from_value`] to tell the two apart.
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        self.id_value()
            .and_then(|value| RecordId::from_value(value).ok().flatten())
    }

    /// Sets the `id` attribute.
    pub fn set_id(&mut self, id: RecordId) {
        self.attributes
            .insert(ID_ATTRIBUTE.to_string(), Value::from(id));
    }

    /// All attributes in key order.
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Consumes the record, returning its attributes.
    #[must_use]
    pub fn into_attributes(self) -> BTreeMap<String, Value> {
        self.attributes
    }

    /// Whether the record carries no attributes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Whether the record has been deleted from its store.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Sets the deletion flag.
    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_attributes(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_attributes() {
        let record = Record::empty().with("id", 1).with("title", "Hello world");
        assert_eq!(record.get("title"), Some(&Value::from("Hello world")));
        assert_eq!(record.id(), Some(RecordId::Int(1)));
        assert!(!record.is_empty());
    }

    #[test]
    fn empty_record_has_no_id() {
        let record = Record::empty();
        assert!(record.is_empty());
        assert!(record.id().is_none());
        assert!(record.get("title").is_none());
    }

    #[test]
    fn falsy_id_reads_as_missing() {
        let record = Record::empty().with("id", 0);
        assert!(record.id().is_none());
        assert_eq!(record.id_value(), Some(&Value::Int(0)));
    }

    #[test]
    fn set_id_overwrites() {
        let mut record = Record::empty().with("id", "");
        record.set_id(RecordId::from("abc"));
        assert_eq!(record.id(), Some(RecordId::from("abc")));
    }

    #[test]
    fn deletion_flag_affects_equality() {
        let live = Record::empty().with("id", 1);
        let mut tombstone = live.clone();
        tombstone.set_deleted(true);
        assert!(tombstone.is_deleted());
        assert_ne!(live, tombstone);
    }

    #[test]
    fn collects_from_pairs() {
        let record: Record = vec![("id", Value::Int(2)), ("title", Value::from("b"))]
            .into_iter()
            .collect();
        assert_eq!(record.attributes().len(), 2);
        assert_eq!(record.id(), Some(RecordId::Int(2)));
    }

    #[test]
    fn set_and_remove_return_previous() {
        let mut record = Record::empty();
        assert!(record.set("title", "a").is_none());
        assert_eq!(record.set("title", "b"), Some(Value::from("a")));
        assert_eq!(record.remove("title"), Some(Value::from("b")));
        assert!(record.is_empty());
    }
}
