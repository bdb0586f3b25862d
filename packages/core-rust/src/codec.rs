//! Blob codecs for records.
//!
//! [`CodecKind::Json`] stores a record as a plain JSON object
//! (`{"id":1,"title":"Hello world"}`), so stores stay readable by other
//! tools. It cannot represent binary data or non-finite floats.
//! [`CodecKind::MsgPack`] encodes the attribute map with `rmp-serde` and can
//! represent every [`Value`].
//!
//! Both codecs reject records whose `id` attribute is truthy but not an
//! integer or string.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::types::{Blob, RecordId, Value};

/// Why a record could not be encoded or a blob could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("attribute `{attribute}` holds a non-finite float")]
    NonFiniteFloat { attribute: String },
    #[error("attribute `{attribute}` holds binary data, which JSON cannot represent")]
    BinaryUnsupported { attribute: String },
    #[error("record id must be an integer or a string, got {kind}")]
    InvalidId { kind: &'static str },
    #[error("stored blob is not a record object")]
    NotAnObject,
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("msgpack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),
    #[error("msgpack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),
}

/// Selects how records are turned into [`Blob`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    /// Plain JSON objects.
    #[default]
    Json,
    /// `MessagePack` via `rmp-serde`.
    MsgPack,
}

impl CodecKind {
    /// Checks that `record` can be encoded, without encoding it.
    ///
    /// # Errors
    ///
    /// Returns the same error [`encode`](Self::encode) would.
    pub fn validate(self, record: &Record) -> Result<(), CodecError> {
        if let Some(id) = record.id_value() {
            RecordId::from_value(id)?;
        }
        match self {
            CodecKind::Json => {
                for (name, value) in record.attributes() {
                    check_json(name, value)?;
                }
                Ok(())
            }
            CodecKind::MsgPack => Ok(()),
        }
    }

    /// Encodes a record's attributes. The deletion flag is not encoded.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if an attribute cannot be represented.
    pub fn encode(self, record: &Record) -> Result<Blob, CodecError> {
        self.validate(record)?;
        let data = match self {
            CodecKind::Json => {
                let mut object = serde_json::Map::new();
                for (name, value) in record.attributes() {
                    object.insert(name.clone(), to_json(name, value)?);
                }
                serde_json::to_vec(&serde_json::Value::Object(object))?
            }
            CodecKind::MsgPack => rmp_serde::to_vec_named(record.attributes())?,
        };
        Ok(Blob::new(data))
    }

    /// Decodes a blob produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the blob is malformed.
    pub fn decode(self, blob: &Blob) -> Result<Record, CodecError> {
        let attributes: BTreeMap<String, Value> = match self {
            CodecKind::Json => {
                let serde_json::Value::Object(object) =
                    serde_json::from_slice::<serde_json::Value>(blob.as_bytes())?
                else {
                    return Err(CodecError::NotAnObject);
                };
                object
                    .into_iter()
                    .map(|(name, value)| (name, from_json(value)))
                    .collect()
            }
            CodecKind::MsgPack => {
                rmp_serde::from_slice::<BTreeMap<String, Value>>(blob.as_bytes())?
            }
        };
        Ok(Record::from_attributes(attributes))
    }
}

fn check_json(attribute: &str, value: &Value) -> Result<(), CodecError> {
    match value {
        Value::Float(f) if !f.is_finite() => Err(CodecError::NonFiniteFloat {
            attribute: attribute.to_string(),
        }),
        Value::Bytes(_) => Err(CodecError::BinaryUnsupported {
            attribute: attribute.to_string(),
        }),
        Value::Array(items) => items.iter().try_for_each(|item| check_json(attribute, item)),
        Value::Map(map) => map
            .iter()
            .try_for_each(|(key, item)| check_json(&format!("{attribute}.{key}"), item)),
        _ => Ok(()),
    }
}

fn to_json(attribute: &str, value: &Value) -> Result<serde_json::Value, CodecError> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| CodecError::NonFiniteFloat {
                attribute: attribute.to_string(),
            })?,
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(_) => {
            return Err(CodecError::BinaryUnsupported {
                attribute: attribute.to_string(),
            })
        }
        Value::Array(items) => serde_json::Value::Array(
            items
                .iter()
                .map(|item| to_json(attribute, item))
                .collect::<Result<_, _>>()?,
        ),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(key, item)| Ok((key.clone(), to_json(attribute, item)?)))
                .collect::<Result<_, CodecError>>()?,
        ),
    })
}

fn from_json(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            // u64 beyond i64::MAX and true floats both land here
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::Array(items.into_iter().map(from_json).collect())
        }
        serde_json::Value::Object(object) => Value::Map(
            object
                .into_iter()
                .map(|(key, item)| (key, from_json(item)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn post() -> Record {
        Record::empty()
            .with("id", 1)
            .with("title", "Hello world")
            .with("rating", 4.5)
            .with("tags", Value::Array(vec![Value::from("a"), Value::Null]))
    }

    #[test]
    fn json_blob_is_a_plain_object() {
        let blob = CodecKind::Json
            .encode(&Record::empty().with("id", 1).with("title", "Hello world"))
            .unwrap();
        let text = String::from_utf8(blob.data).unwrap();
        assert_eq!(text, r#"{"id":1,"title":"Hello world"}"#);
    }

    #[test]
    fn json_preserves_integer_and_float_distinction() {
        let record = Record::empty().with("id", 3).with("score", 1.0);
        let decoded = CodecKind::Json
            .decode(&CodecKind::Json.encode(&record).unwrap())
            .unwrap();
        assert_eq!(decoded.get("id"), Some(&Value::Int(3)));
        assert_eq!(decoded.get("score"), Some(&Value::Float(1.0)));
    }

    #[test]
    fn json_rejects_non_finite_float() {
        let record = Record::empty().with("id", 1).with("score", f64::INFINITY);
        let err = CodecKind::Json.encode(&record).unwrap_err();
        assert!(matches!(err, CodecError::NonFiniteFloat { ref attribute } if attribute == "score"));
    }

    #[test]
    fn json_rejects_nested_bytes() {
        let mut inner = BTreeMap::new();
        inner.insert("raw".to_string(), Value::Bytes(vec![0xff]));
        let record = Record::empty().with("meta", Value::Map(inner));
        let err = CodecKind::Json.validate(&record).unwrap_err();
        assert!(
            matches!(err, CodecError::BinaryUnsupported { ref attribute } if attribute == "meta.raw")
        );
    }

    #[test]
    fn msgpack_accepts_bytes_and_nan() {
        let record = Record::empty()
            .with("id", "blob-1")
            .with("raw", Value::Bytes(vec![1, 2, 3]))
            .with("nan", f64::NAN);
        let decoded = CodecKind::MsgPack
            .decode(&CodecKind::MsgPack.encode(&record).unwrap())
            .unwrap();
        assert_eq!(decoded.get("raw"), Some(&Value::Bytes(vec![1, 2, 3])));
        assert!(matches!(decoded.get("nan"), Some(Value::Float(f)) if f.is_nan()));
    }

    #[test]
    fn both_codecs_reject_float_ids() {
        let record = Record::empty().with("id", 1.5);
        assert!(matches!(
            CodecKind::Json.validate(&record),
            Err(CodecError::InvalidId { kind: "float" })
        ));
        assert!(matches!(
            CodecKind::MsgPack.encode(&record),
            Err(CodecError::InvalidId { kind: "float" })
        ));
    }

    #[test]
    fn decode_rejects_non_object_json() {
        let err = CodecKind::Json.decode(&Blob::from(b"[1,2]".to_vec())).unwrap_err();
        assert!(matches!(err, CodecError::NotAnObject));

        let err = CodecKind::Json.decode(&Blob::from(b"{oops".to_vec())).unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
    }

    #[test]
    fn deleted_flag_is_not_encoded() {
        let mut record = post();
        record.set_deleted(true);
        let decoded = CodecKind::MsgPack
            .decode(&CodecKind::MsgPack.encode(&record).unwrap())
            .unwrap();
        assert!(!decoded.is_deleted());
        assert_eq!(decoded.attributes(), record.attributes());
    }

    #[test]
    fn codec_kind_deserializes_lowercase() {
        let kind: CodecKind = serde_json::from_str("\"msgpack\"").unwrap();
        assert_eq!(kind, CodecKind::MsgPack);
        assert_eq!(CodecKind::default(), CodecKind::Json);
    }

    proptest! {
        #[test]
        fn json_keeps_string_and_int_attributes(title in ".*", id in 1_i64..i64::MAX) {
            let record = Record::empty().with("id", id).with("title", title);
            let decoded = CodecKind::Json
                .decode(&CodecKind::Json.encode(&record).unwrap())
                .unwrap();
            prop_assert_eq!(decoded, record);
        }
    }
}
