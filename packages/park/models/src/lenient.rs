//! Lenient field deserializers for connector output.
//!
//! The connector lands the same logical field in different shapes depending
//! on the export format: coordinates arrive as numbers in JSON exports but as
//! strings from the parks API, and list-valued fields arrive as native
//! arrays in JSON but as pre-encoded text in CSV. These helpers accept every
//! shape and normalize to the column representation. Empty strings are
//! treated as `NULL`.

use std::fmt;

use serde::Deserializer;
use serde::de::{self, SeqAccess, Visitor};
use serde_json::Value;

#[derive(Clone, Copy)]
enum SeqMode {
    Reject,
    Join,
    Json,
}

struct TextVisitor {
    seq: SeqMode,
}

impl<'de> Visitor<'de> for TextVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.seq {
            SeqMode::Reject => f.write_str("a string, number, or null"),
            SeqMode::Join | SeqMode::Json => f.write_str("a string, list of strings, or null"),
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if v.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(v.to_string()))
        }
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        if v.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(v))
        }
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items: Vec<Value> = Vec::new();
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }

        match self.seq {
            SeqMode::Reject => Err(de::Error::invalid_type(de::Unexpected::Seq, &self)),
            SeqMode::Join => {
                let names: Vec<String> = items.iter().filter_map(list_item_name).collect();
                if names.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(names.join(", ")))
                }
            }
            SeqMode::Json => serde_json::to_string(&items)
                .map(Some)
                .map_err(de::Error::custom),
        }
    }
}

/// Extracts a display name from a list element. The parks API returns
/// activities as `{"id": ..., "name": ...}` objects.
fn list_item_name(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Deserializes a scalar text column.
///
/// # Errors
///
/// Returns a deserialization error if the value is an array or object.
pub fn optional_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    d.deserialize_any(TextVisitor {
        seq: SeqMode::Reject,
    })
}

/// Deserializes a list column into comma-joined text.
///
/// # Errors
///
/// Returns a deserialization error if the value is an object.
pub fn optional_text_list<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    d.deserialize_any(TextVisitor { seq: SeqMode::Join })
}

/// Deserializes a column stored as JSON text. Native arrays are
/// re-encoded; strings are kept verbatim and validated later.
///
/// # Errors
///
/// Returns a deserialization error if the value is an object.
pub fn optional_json_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    d.deserialize_any(TextVisitor { seq: SeqMode::Json })
}

struct F64Visitor;

impl<'de> Visitor<'de> for F64Visitor {
    type Value = Option<f64>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, numeric string, or null")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

/// Deserializes a coordinate that may be a number, a numeric string, an
/// empty string, or null.
///
/// # Errors
///
/// Returns a deserialization error if a string is present but not numeric.
pub fn optional_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    d.deserialize_any(F64Visitor)
}
