// src/record.rs
// Record identifiers and JSON field access helpers

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// Store-assigned unique key for a record
///
/// Untagged so the identifier appears as a plain value on the wire:
/// `{"_id": 2}` or `{"_id": "d6f0..."}`. Absent until the record is
/// persisted, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    String(String),
    ObjectId(String),
}

impl RecordId {
    /// Next auto-increment id after `last_id`
    pub fn new_auto(last_id: u64) -> Self {
        RecordId::Int((last_id + 1) as i64)
    }

    /// Fresh random object id (UUID v4)
    pub fn new_object_id() -> Self {
        RecordId::ObjectId(Uuid::new_v4().to_string())
    }

    /// The identifier as a plain JSON value (wire shape)
    pub fn to_value(&self) -> Value {
        match self {
            RecordId::Int(i) => Value::from(*i),
            RecordId::String(s) | RecordId::ObjectId(s) => Value::String(s.clone()),
        }
    }

    /// Parse an identifier from its wire value
    pub fn from_value(value: &Value) -> Option<RecordId> {
        match value {
            Value::Number(n) => n.as_i64().map(RecordId::Int),
            Value::String(s) => Some(RecordId::String(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(i) => write!(f, "{}", i),
            RecordId::String(s) | RecordId::ObjectId(s) => write!(f, "{}", s),
        }
    }
}

/// Get a field from a JSON object with dot notation support
///
/// Supports simple fields ("year"), nested objects ("label.name") and
/// array indexing ("tracks.0.title").
pub fn get_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    if !path.contains('.') {
        return doc.get(path);
    }

    let mut value = doc;
    for part in path.split('.') {
        match value {
            Value::Object(map) => value = map.get(part)?,
            Value::Array(arr) => {
                if let Ok(index) = part.parse::<usize>() {
                    value = arr.get(index)?;
                } else {
                    return None;
                }
            }
            _ => return None,
        }
    }
    Some(value)
}

/// Compare two JSON values
///
/// Returns `Some(Ordering)` for comparable types (numbers as f64, strings
/// lexicographic, bools with false < true), `None` for incompatible types.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64()?;
            let y = y.as_f64()?;
            x.partial_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_id_new_auto() {
        assert_eq!(RecordId::new_auto(0), RecordId::Int(1));
        assert_eq!(RecordId::new_auto(10), RecordId::Int(11));
        assert_eq!(RecordId::new_auto(99), RecordId::Int(100));
    }

    #[test]
    fn test_record_id_object_id_format() {
        match RecordId::new_object_id() {
            RecordId::ObjectId(s) => {
                // UUID v4 format: 8-4-4-4-12 characters
                assert_eq!(s.len(), 36);
                assert!(s.contains('-'));
            }
            _ => panic!("Expected ObjectId variant"),
        }
    }

    #[test]
    fn test_record_id_wire_shape() {
        assert_eq!(RecordId::Int(42).to_value(), json!(42));
        assert_eq!(
            RecordId::String("abc".to_string()).to_value(),
            json!("abc")
        );

        let id: RecordId = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(id, RecordId::Int(7));
        let id: RecordId = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(id, RecordId::String("abc".to_string()));
    }

    #[test]
    fn test_record_id_from_value() {
        assert_eq!(RecordId::from_value(&json!(5)), Some(RecordId::Int(5)));
        assert_eq!(
            RecordId::from_value(&json!("x")),
            Some(RecordId::String("x".to_string()))
        );
        assert_eq!(RecordId::from_value(&json!([1, 2])), None);
        assert_eq!(RecordId::from_value(&json!(null)), None);
    }

    #[test]
    fn test_record_id_display() {
        assert_eq!(RecordId::Int(3).to_string(), "3");
        assert_eq!(RecordId::String("abc".to_string()).to_string(), "abc");
    }

    #[test]
    fn test_get_path_simple() {
        let doc = json!({"artist": "Queen", "year": 1976});
        assert_eq!(get_path(&doc, "artist"), Some(&json!("Queen")));
        assert_eq!(get_path(&doc, "year"), Some(&json!(1976)));
        assert_eq!(get_path(&doc, "missing"), None);
    }

    #[test]
    fn test_get_path_nested() {
        let doc = json!({
            "label": {"name": "EMI", "country": "UK"},
            "tracks": [{"title": "Tie Your Mother Down"}]
        });
        assert_eq!(get_path(&doc, "label.name"), Some(&json!("EMI")));
        assert_eq!(
            get_path(&doc, "tracks.0.title"),
            Some(&json!("Tie Your Mother Down"))
        );
        assert_eq!(get_path(&doc, "label.missing"), None);
        assert_eq!(get_path(&doc, "tracks.x"), None);
    }

    #[test]
    fn test_compare_values_numbers() {
        assert_eq!(compare_values(&json!(10), &json!(5)), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!(5), &json!(10)), Some(Ordering::Less));
        assert_eq!(compare_values(&json!(5), &json!(5.0)), Some(Ordering::Equal));
    }

    #[test]
    fn test_compare_values_strings_and_bools() {
        assert_eq!(compare_values(&json!("a"), &json!("b")), Some(Ordering::Less));
        assert_eq!(
            compare_values(&json!(true), &json!(false)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_compare_values_incompatible() {
        assert_eq!(compare_values(&json!("a"), &json!(1)), None);
        assert_eq!(compare_values(&json!(null), &json!(1)), None);
        assert_eq!(compare_values(&json!([1]), &json!([1])), None);
    }
}
