//! JSON bridge.
//!
//! Two forms are supported:
//! - plain JSON ([`parse_json`]): every key is data, nothing is metadata;
//! - the annotated exchange form (`Serialize`/`Deserialize` on
//!   [`AnnotatedValue`]): a JSON object may carry string-valued `anchor` and
//!   `referenceOf` keys, which map to [`Mapping::anchor`] and
//!   [`Mapping::reference_of`].
//!
//! Sequences have no place for metadata in the exchange form; their
//! `anchor`/`reference_of` are dropped on output.

use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;
use crate::value::{AnnotatedValue, Mapping, Number, Sequence};

pub(crate) const ANCHOR_KEY: &str = "anchor";
pub(crate) const REFERENCE_KEY: &str = "referenceOf";

/// Parse standard JSON. Keys named `anchor` or `referenceOf` stay ordinary
/// entries.
///
/// ```rust
/// let v = yaml_anchor_codec::parse_json(r#"{"anchor": "x", "n": 1.2e3}"#).unwrap();
/// assert_eq!(v.anchor(), None);
/// assert_eq!(v.get("anchor").and_then(|a| a.as_str()), Some("x"));
/// assert_eq!(v.get("n").and_then(|n| n.as_i128()), Some(1200));
/// ```
pub fn parse_json(text: &str) -> Result<AnnotatedValue, Error> {
    let json: serde_json::Value = serde_json::from_str(text).map_err(Error::from_json_error)?;
    Ok(from_plain(json))
}

/// Read the annotated exchange form.
pub fn from_annotated_json(text: &str) -> Result<AnnotatedValue, Error> {
    serde_json::from_str(text).map_err(Error::from_json_error)
}

/// Write the annotated exchange form, pretty-printed.
pub fn to_annotated_json(value: &AnnotatedValue) -> Result<String, Error> {
    serde_json::to_string_pretty(value).map_err(Error::from_json_error)
}

fn from_plain(json: serde_json::Value) -> AnnotatedValue {
    match json {
        serde_json::Value::Null => AnnotatedValue::Null,
        serde_json::Value::Bool(b) => AnnotatedValue::Bool(b),
        serde_json::Value::Number(n) => AnnotatedValue::Number(json_number(&n)),
        serde_json::Value::String(s) => AnnotatedValue::String(s),
        serde_json::Value::Array(items) => {
            AnnotatedValue::Sequence(Sequence::new(items.into_iter().map(from_plain).collect()))
        }
        serde_json::Value::Object(entries) => AnnotatedValue::Mapping(Mapping {
            entries: entries.into_iter().map(|(k, v)| (k, from_plain(v))).collect(),
            anchor: None,
            reference_of: None,
        }),
    }
}

fn json_number(n: &serde_json::Number) -> Number {
    if let Some(i) = n.as_i64() {
        Number::Int(i128::from(i))
    } else if let Some(u) = n.as_u64() {
        Number::Int(i128::from(u))
    } else {
        Number::from_f64(n.as_f64().unwrap_or(f64::NAN))
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Number::Int(i) => {
                if let Ok(i) = i64::try_from(i) {
                    serializer.serialize_i64(i)
                } else if let Ok(u) = u64::try_from(i) {
                    serializer.serialize_u64(u)
                } else {
                    serializer.serialize_f64(i as f64)
                }
            }
            // serde_json writes non-finite floats as null.
            Number::Float(f) => serializer.serialize_f64(f),
        }
    }
}

impl Serialize for AnnotatedValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            AnnotatedValue::Null => serializer.serialize_unit(),
            AnnotatedValue::Bool(b) => serializer.serialize_bool(*b),
            AnnotatedValue::Number(n) => n.serialize(serializer),
            AnnotatedValue::String(s) => serializer.serialize_str(s),
            AnnotatedValue::Sequence(s) => {
                // Arrays have no slot for `anchor` or `referenceOf`.
                let mut seq = serializer.serialize_seq(Some(s.items.len()))?;
                for item in &s.items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            AnnotatedValue::Mapping(m) => {
                let len = m.entries.len()
                    + usize::from(m.anchor.is_some())
                    + usize::from(m.reference_of.is_some());
                let mut map = serializer.serialize_map(Some(len))?;
                for (key, value) in &m.entries {
                    map.serialize_entry(key, value)?;
                }
                if let Some(anchor) = &m.anchor {
                    map.serialize_entry(ANCHOR_KEY, anchor)?;
                }
                if let Some(reference) = &m.reference_of {
                    map.serialize_entry(REFERENCE_KEY, reference)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for AnnotatedValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AnnotatedVisitor)
    }
}

struct AnnotatedVisitor;

impl<'de> Visitor<'de> for AnnotatedVisitor {
    type Value = AnnotatedValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(AnnotatedValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(AnnotatedValue::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        AnnotatedValue::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(AnnotatedValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(AnnotatedValue::Number(Number::Int(i128::from(v))))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(AnnotatedValue::Number(Number::Int(i128::from(v))))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(AnnotatedValue::Number(Number::from_f64(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(AnnotatedValue::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(AnnotatedValue::String(v))
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(item) = access.next_element()? {
            items.push(item);
        }
        Ok(AnnotatedValue::Sequence(Sequence::new(items)))
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut mapping = Mapping::new();
        while let Some(key) = access.next_key::<String>()? {
            let value: AnnotatedValue = access.next_value()?;
            match (key.as_str(), value) {
                (ANCHOR_KEY, AnnotatedValue::String(name)) => mapping.anchor = Some(name),
                (REFERENCE_KEY, AnnotatedValue::String(name)) => mapping.reference_of = Some(name),
                (_, value) => {
                    mapping.entries.insert(key, value);
                }
            }
        }
        Ok(AnnotatedValue::Mapping(mapping))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_keys_are_read_as_metadata() {
        let v: AnnotatedValue = serde_json::from_value(json!({
            "role": "admin",
            "referenceOf": "user",
            "anchor": "admin",
        }))
        .unwrap();
        let m = v.as_mapping().unwrap();
        assert_eq!(m.reference_of.as_deref(), Some("user"));
        assert_eq!(m.anchor.as_deref(), Some("admin"));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn non_string_metadata_stays_data() {
        let v: AnnotatedValue = serde_json::from_value(json!({"anchor": 5})).unwrap();
        assert_eq!(v.anchor(), None);
        assert_eq!(v.get("anchor").and_then(|a| a.as_i128()), Some(5));
    }

    #[test]
    fn metadata_is_written_after_entries() {
        let v: AnnotatedValue = Mapping::from_iter([("a", 1)])
            .with_anchor("x")
            .with_reference_of("y")
            .into();
        assert_eq!(
            serde_json::to_string(&v).unwrap(),
            r#"{"a":1,"anchor":"x","referenceOf":"y"}"#
        );
    }

    #[test]
    fn sequence_metadata_is_dropped() {
        let v: AnnotatedValue = Sequence::new(vec![AnnotatedValue::from(true)])
            .with_anchor("s")
            .into();
        assert_eq!(serde_json::to_string(&v).unwrap(), "[true]");
    }

    #[test]
    fn large_integers_survive() {
        let v = parse_json("[18446744073709551615, -9223372036854775808]").unwrap();
        assert_eq!(v.get_index(0).and_then(|n| n.as_i128()), Some(u64::MAX as i128));
        assert_eq!(v.get_index(1).and_then(|n| n.as_i128()), Some(i64::MIN as i128));
    }

    #[test]
    fn malformed_json_has_location() {
        let err = parse_json("{\n  \"a\": ,\n}").unwrap_err();
        match err {
            Error::InvalidJson { location, .. } => assert_eq!(location.line(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
