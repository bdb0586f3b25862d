use std::collections::BTreeMap;
use std::fmt;
use std::num::FpCategory;

use serde::{Deserialize, Serialize};

use crate::codec::CodecError;

/// Opaque encoded record handed to a key-value store.
///
/// Produced by a [`CodecKind`](crate::codec::CodecKind); stores never look
/// inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    /// Raw bytes of the encoded record.
    pub data: Vec<u8>,
}

impl Blob {
    /// Wraps already-encoded bytes.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Borrows the encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of encoded bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the blob holds no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for Blob {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl From<&[u8]> for Blob {
    fn from(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }
}

/// Generic attribute value stored in a [`Record`](crate::record::Record).
///
/// Supports all JSON-compatible types plus binary data. Binary data and
/// non-finite floats are only persistable with the `MessagePack` codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// JSON null.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON integer (signed 64-bit).
    Int(i64),
    /// JSON floating-point (64-bit IEEE 754).
    Float(f64),
    /// JSON string (UTF-8).
    String(String),
    /// Binary data (not directly representable in JSON).
    Bytes(Vec<u8>),
    /// JSON array (ordered sequence of values).
    Array(Vec<Value>),
    /// JSON object. Uses `BTreeMap` for deterministic serialization order.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Whether the value counts as "unset" when used as a record id.
    ///
    /// `null`, `false`, `0`, `0.0`, `NaN` and `""` are falsy. Containers and
    /// binary data are never falsy, even when empty.
    #[must_use]
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => f.is_nan() || f.classify() == FpCategory::Zero,
            Value::String(s) => s.is_empty(),
            Value::Bytes(_) | Value::Array(_) | Value::Map(_) => false,
        }
    }

    /// Returns the string slice if this is a `String` value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Int` value.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<RecordId> for Value {
    fn from(id: RecordId) -> Self {
        match id {
            RecordId::Int(i) => Value::Int(i),
            RecordId::Str(s) => Value::String(s),
        }
    }
}

/// Identifier of a record within its collection.
///
/// Callers may use integers or strings; both are persisted under the
/// string form produced by [`RecordId::to_key`], so `Int(42)` and
/// `Str("42")` address the same stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Integer identifier (decimal key).
    Int(i64),
    /// String identifier (used verbatim as the key).
    Str(String),
}

impl RecordId {
    /// Store key for this id.
    #[must_use]
    pub fn to_key(&self) -> String {
        self.to_string()
    }

    /// Interprets an `id` attribute value.
    ///
    /// Returns `Ok(None)` for falsy values (the record has no id yet).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidId`] for truthy values that cannot be
    /// used as a key (floats, `true`, binary data, containers).
    pub fn from_value(value: &Value) -> Result<Option<Self>, CodecError> {
        if value.is_falsy() {
            return Ok(None);
        }
        match value {
            Value::Int(i) => Ok(Some(RecordId::Int(*i))),
            Value::String(s) => Ok(Some(RecordId::Str(s.clone()))),
            other => Err(CodecError::InvalidId {
                kind: other.kind(),
            }),
        }
    }

    /// Position of this id in an integer sequence, if it is a positive integer.
    ///
    /// String ids whose text is a positive decimal also count, since they
    /// share the key space with integer ids.
    #[must_use]
    pub fn sequence_number(&self) -> Option<u64> {
        match self {
            RecordId::Int(i) => u64::try_from(*i).ok().filter(|n| *n > 0),
            RecordId::Str(s) => parse_sequence_key(s),
        }
    }
}

/// Parses a store key as a positive decimal integer.
#[must_use]
pub fn parse_sequence_key(key: &str) -> Option<u64> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u64>().ok().filter(|n| *n > 0)
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(i) => write!(f, "{i}"),
            RecordId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(i: i64) -> Self {
        RecordId::Int(i)
    }
}

impl From<i32> for RecordId {
    fn from(i: i32) -> Self {
        RecordId::Int(i64::from(i))
    }
}

impl From<u32> for RecordId {
    fn from(i: u32) -> Self {
        RecordId::Int(i64::from(i))
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Str(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Str(s)
    }
}

impl From<&RecordId> for RecordId {
    fn from(id: &RecordId) -> Self {
        id.clone()
    }
}
