//! Recursive JSON key/value traversal.

use serde_json::Value;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::cache::CacheEntry;
use crate::types::buckets::ValueMultimap;

/// Why a payload produced no JSON extraction.
#[derive(Debug, Error)]
pub enum JsonSkip {
    /// The bytes are not JSON.
    #[error("not JSON: {0}")]
    NotJson(#[from] serde_json::Error),

    /// Valid JSON, but the root is not an object.
    #[error("JSON root is not an object")]
    NotObject,

    /// An object with nothing to extract.
    #[error("JSON object has no members")]
    Empty,
}

/// Collect every object key and every scalar leaf of `root`.
///
/// Scalars are attributed to their nearest enclosing key, including scalars
/// inside arrays. A non-object root yields nothing.
pub fn traverse(root: &Value) -> (BTreeSet<String>, ValueMultimap) {
    let mut keys = BTreeSet::new();
    let mut values = ValueMultimap::new();

    if let Value::Object(_) = root {
        walk(root, None, &mut keys, &mut values);
    }

    (keys, values)
}

fn walk(node: &Value, key: Option<&str>, keys: &mut BTreeSet<String>, values: &mut ValueMultimap) {
    match node {
        Value::Object(members) => {
            for (name, value) in members {
                keys.insert(name.clone());
                walk(value, Some(name.as_str()), keys, values);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, key, keys, values);
            }
        }
        scalar => {
            if let Some(key) = key {
                values.insert(key, scalar_text(scalar));
            }
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse `bytes` as JSON and traverse it.
///
/// Invalid UTF-8 sequences are replaced before parsing.
pub fn extract_json(bytes: &[u8]) -> Result<CacheEntry, JsonSkip> {
    let text = String::from_utf8_lossy(bytes);
    let root: Value = serde_json::from_str(&text)?;
    if !root.is_object() {
        return Err(JsonSkip::NotObject);
    }

    let (keys, values) = traverse(&root);
    let entry = CacheEntry::new(keys, values);
    if entry.is_empty() {
        return Err(JsonSkip::Empty);
    }
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_object_and_array() {
        let (keys, values) = traverse(&json!({"a": {"b": "1", "c": [2, 3]}, "d": "x"}));

        assert_eq!(keys, BTreeSet::from(["a", "b", "c", "d"].map(String::from)));
        let pairs: Vec<_> = values.pairs().collect();
        assert_eq!(pairs, vec![("b", "1"), ("c", "2"), ("c", "3"), ("d", "x")]);
    }

    #[test]
    fn test_scalars_are_stringified() {
        let (_, values) = traverse(&json!({"n": null, "t": true, "f": 1.5, "s": "str"}));

        assert!(values.contains("n", "null"));
        assert!(values.contains("t", "true"));
        assert!(values.contains("f", "1.5"));
        assert!(values.contains("s", "str"));
    }

    #[test]
    fn test_array_of_objects_keeps_inner_keys() {
        let (keys, values) = traverse(&json!({"users": [{"id": 1}, {"id": 2, "tags": ["a", ["b"]]}]}));

        assert_eq!(keys, BTreeSet::from(["id", "tags", "users"].map(String::from)));
        assert_eq!(values.get("id").unwrap().len(), 2);
        assert!(values.contains("tags", "b"));
        // Objects inside the array do not produce values for the outer key
        assert!(values.get("users").is_none());
    }

    #[test]
    fn test_empty_object_and_empty_containers() {
        let (keys, values) = traverse(&json!({"list": [], "obj": {}}));
        assert_eq!(keys.len(), 2);
        assert!(values.is_empty());
    }

    #[test]
    fn test_non_object_root() {
        let (keys, values) = traverse(&json!([1, {"a": 1}]));
        assert!(keys.is_empty());
        assert!(values.is_empty());

        assert!(matches!(extract_json(b"[1,2]"), Err(JsonSkip::NotObject)));
        assert!(matches!(extract_json(b"\"text\""), Err(JsonSkip::NotObject)));
    }

    #[test]
    fn test_extract_json_outcomes() {
        assert!(matches!(extract_json(b"<html>"), Err(JsonSkip::NotJson(_))));
        assert!(matches!(extract_json(b"{}"), Err(JsonSkip::Empty)));
        assert!(matches!(extract_json(b""), Err(JsonSkip::NotJson(_))));

        let entry = extract_json(br#"{"token":"abc"}"#).unwrap();
        assert!(entry.json_keys.contains("token"));
        assert!(entry.json_values.contains("token", "abc"));
    }

    #[test]
    fn test_numbers_keep_literal_text() {
        let entry = extract_json(br#"{"id":123456789012345678901234,"e":1e5,"n":-7}"#).unwrap();

        let id: Vec<_> = entry.json_values.get("id").unwrap().iter().collect();
        assert_eq!(id, vec!["123456789012345678901234"]);
        assert!(entry.json_values.contains("e", "1e5"));
        assert!(entry.json_values.contains("n", "-7"));
    }

    #[test]
    fn test_invalid_utf8_is_replaced_not_rejected() {
        let entry = extract_json(b"{\"name\":\"a\xFFb\",\"id\":1}").unwrap();

        assert!(entry.json_keys.contains("name"));
        assert!(entry.json_values.contains("name", "a\u{FFFD}b"));
        assert!(entry.json_values.contains("id", "1"));
    }
}
