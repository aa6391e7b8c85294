//! Conversions between dotted flat keys and nested maps, and the merge
//! algebra that combines two field sets.
//!
//! Everything here operates on [`serde_json::Value`] with insertion-order
//! preserving maps, so callers control precedence through key order.

use serde_json::Value;

/// An ordered map of field names to values. Keys may be plain or
/// dot-delimited (`"log.origin.file.name"`).
pub type FieldMap = serde_json::Map<String, Value>;

fn is_empty_map(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.is_empty())
}

/// Turns a dotted key and a value into a nested single-entry structure,
/// working right to left.
///
/// `de_dot("a.b.c", e)` returns `("a", {"b": {"c": e}})`; a key without a
/// dot is returned unchanged.
pub fn de_dot(path: &str, value: Value) -> (String, Value) {
    match path.rsplit_once('.') {
        None => (path.to_owned(), value),
        Some((rest, last)) => {
            let mut wrapped = FieldMap::new();
            wrapped.insert(last.to_owned(), value);
            de_dot(rest, Value::Object(wrapped))
        }
    }
}

/// Expands a dotted key into a nested single-entry map, recursing left to
/// right on the first dot.
pub fn key_to_dict(path: &str, value: Value) -> FieldMap {
    let mut map = FieldMap::new();
    match path.split_once('.') {
        None => {
            map.insert(path.to_owned(), value);
        }
        Some((first, rest)) => {
            map.insert(first.to_owned(), Value::Object(key_to_dict(rest, value)));
        }
    }
    map
}

/// Adds dots to all nested fields, producing a flat map.
///
/// Entries whose flattened keys collide resolve to whichever came later in
/// iteration order:
///
/// - `{"a": {"b": {"c": 4}}}` becomes `{"a.b.c": 4}`
/// - `{"a": {"b": 1}, "a.b": 2}` becomes `{"a.b": 2}`
pub fn flatten_dict(value: &FieldMap) -> FieldMap {
    let mut top_level = FieldMap::new();
    for (key, val) in value {
        match val {
            Value::Object(map) => {
                for (sub_key, sub_value) in flatten_dict(map) {
                    top_level.insert(format!("{key}.{sub_key}"), sub_value);
                }
            }
            other => {
                top_level.insert(key.clone(), other.clone());
            }
        }
    }
    top_level
}

/// Keys of `dx` in order, then keys of `dy`, deduplicated keeping the first
/// occurrence. Keys whose value is an empty map are ignored on both sides.
pub fn union_keys(dx: &FieldMap, dy: &FieldMap) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(dx.len() + dy.len());
    for (key, value) in dx.iter().chain(dy) {
        if is_empty_map(value) {
            continue;
        }
        if !keys.iter().any(|existing| existing == key) {
            keys.push(key.clone());
        }
    }
    keys
}

/// Merges deeply nested structures. `None` is the "absent" marker for a key
/// missing from one side.
///
/// A map always wins over a non-map, regardless of which side it is on. Two
/// maps merge recursively over [`union_keys`], pruning any entry that merges
/// to an empty map. Two non-map values resolve to `from` — the first
/// argument deliberately takes precedence on scalar collisions, and call
/// sites rely on that to give later/inner context priority.
pub fn merge_values(from: Option<&Value>, into: Option<&Value>) -> Value {
    match (from, into) {
        (Some(Value::Object(from_map)), Some(Value::Object(into_map))) => {
            let mut output = FieldMap::new();
            for key in union_keys(into_map, from_map) {
                let merged = merge_values(from_map.get(&key), into_map.get(&key));
                if !is_empty_map(&merged) {
                    output.insert(key, merged);
                }
            }
            Value::Object(output)
        }
        (Some(Value::Object(map)), _) | (_, Some(Value::Object(map))) => {
            Value::Object(map.clone())
        }
        // Both sides absent should not happen; union_keys only yields keys
        // present on at least one side.
        (None, None) => Value::Null,
        (None, Some(into_value)) => into_value.clone(),
        (Some(from_value), _) => from_value.clone(),
    }
}

/// Expands all dotted names into nested maps.
///
/// Map values are normalized recursively, list values element-wise. Nested
/// paths that collide merge via [`merge_values`] rather than overwrite:
/// `{"a.b": "c", "a.d": "e"}` becomes `{"a": {"b": "c", "d": "e"}}`.
pub fn normalize_dict(value: &FieldMap) -> FieldMap {
    let mut output = FieldMap::new();
    for (key, val) in value {
        let val = normalize_value(val);
        let (key, val) = de_dot(key, val);
        let merged = merge_values(Some(&val), output.get(&key));
        output.insert(key, merged);
    }
    output
}

fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(normalize_dict(map)),
        Value::Array(items) => Value::Array(items.iter().map(normalize_value).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn map(value: serde_json::Value) -> FieldMap {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn test_flatten_dict() {
        assert_eq!(
            flatten_dict(&map(json!({"a": "b", "c": {"d": "e"}}))),
            map(json!({"a": "b", "c.d": "e"}))
        );
        assert_eq!(
            flatten_dict(&map(json!({"a.b": "c", "a.b.d": "e"}))),
            map(json!({"a.b": "c", "a.b.d": "e"}))
        );
        assert_eq!(
            flatten_dict(&map(json!({"a": {"b": 1}, "a.b": 2}))),
            map(json!({"a.b": 2}))
        );
        assert_eq!(
            flatten_dict(&map(json!({"a": {"b": {"c": 4}}}))),
            map(json!({"a.b.c": 4}))
        );
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let nested = map(json!({"a": {"b": {"c": 4}}, "d": 1}));
        let flat = flatten_dict(&nested);
        assert_eq!(flatten_dict(&normalize_dict(&flat)), flat);
        assert_eq!(flatten_dict(&flat), flat);
    }

    #[test]
    fn test_union_keys() {
        assert_eq!(
            union_keys(&map(json!({"a": "b", "c": "d"})), &FieldMap::new()),
            vec!["a", "c"]
        );
        assert_eq!(
            union_keys(&map(json!({"a": "b", "c": "d"})), &map(json!({"e": "f"}))),
            vec!["a", "c", "e"]
        );
        assert_eq!(union_keys(&FieldMap::new(), &map(json!({"e": "f"}))), vec!["e"]);
        assert_eq!(
            union_keys(&map(json!({"a": "b", "c": {}})), &map(json!({"e": "f"}))),
            vec!["a", "e"]
        );
        // Null-valued keys are kept, only empty maps are excluded.
        assert_eq!(
            union_keys(
                &map(json!({"a": "b", "c": "d"})),
                &map(json!({"e": "f", "g": null}))
            ),
            vec!["a", "c", "e", "g"]
        );
    }

    #[test]
    fn test_merge_values() {
        let merge = |from: serde_json::Value, into: serde_json::Value| {
            merge_values(Some(&from), Some(&into))
        };
        assert_eq!(merge(json!({}), json!({})), json!({}));
        assert_eq!(
            merge(json!({"a": "b"}), json!({"c": "d"})),
            json!({"c": "d", "a": "b"})
        );
        assert_eq!(merge(json!({"a": "b"}), json!({"a": "d"})), json!({"a": "b"}));
        assert_eq!(merge(json!({"a": "b"}), json!({"a": {}})), json!({}));
        assert_eq!(
            merge(json!({"a": "b"}), json!({"a": {"c": "d"}})),
            json!({"a": {"c": "d"}})
        );
    }

    #[test]
    fn test_merge_values_absent_sides() {
        assert_eq!(merge_values(Some(&json!("x")), None), json!("x"));
        assert_eq!(merge_values(None, Some(&json!("y"))), json!("y"));
        assert_eq!(merge_values(None, None), Value::Null);
    }

    #[test]
    fn test_de_dot() {
        assert_eq!(
            de_dot("a.b.c", json!("e")),
            ("a".to_owned(), json!({"b": {"c": "e"}}))
        );
        assert_eq!(de_dot("a.b", json!(2)), ("a".to_owned(), json!({"b": 2})));
        assert_eq!(de_dot("a", json!("b")), ("a".to_owned(), json!("b")));
    }

    #[test]
    fn test_key_to_dict() {
        assert_eq!(key_to_dict("a", json!("b")), map(json!({"a": "b"})));
        assert_eq!(
            key_to_dict("a.b.c", json!("e")),
            map(json!({"a": {"b": {"c": "e"}}}))
        );
    }

    #[test]
    fn test_normalize_dict() {
        assert_eq!(
            normalize_dict(&map(json!({"a.b": "c"}))),
            map(json!({"a": {"b": "c"}}))
        );
        assert_eq!(
            normalize_dict(&map(json!({"a.b": "c", "a.d": "e"}))),
            map(json!({"a": {"b": "c", "d": "e"}}))
        );
        assert_eq!(
            normalize_dict(&map(json!({"a.b": "c", "a.b.d": "e"}))),
            map(json!({"a": {"b": {"d": "e"}}}))
        );
        assert_eq!(
            normalize_dict(&map(json!({"a.b": [1, 2, 3]}))),
            map(json!({"a": {"b": [1, 2, 3]}}))
        );
        assert_eq!(
            normalize_dict(&map(json!({"a.b": [1, 2, {"c.d": "e"}]}))),
            map(json!({"a": {"b": [1, 2, {"c": {"d": "e"}}]}}))
        );
    }
}
