//! Canonical JSON serialization.
//!
//! Produces compact JSON with object keys sorted lexicographically at every
//! nesting level. This is the foundation of the hashing protocol: two
//! semantically identical payloads must always serialize to the same byte
//! sequence, regardless of the order in which their keys were inserted.
//!
//! Rules:
//! - Compact: no whitespace between tokens.
//! - Object keys sorted lexicographically (recursive at every depth).
//! - Arrays preserve element order.
//! - Strings escaped with the minimal JSON escape set.

use serde_json::Value;

/// Produce a canonical JSON string from a [`serde_json::Value`].
///
/// Keys at every object level are sorted lexicographically. Output is compact
/// (no extraneous whitespace).
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use witness_core::canonical::canonical_json;
///
/// let val = json!({"tool": ["editor"], "student": ["Alice"]});
/// assert_eq!(canonical_json(&val), r#"{"student":["Alice"],"tool":["editor"]}"#);
/// ```
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    emit(value, &mut out);
    out
}

fn emit(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => emit_string(s, out),
        Value::Array(items) => {
            out.push('[');
            let mut first = true;
            for item in items {
                if !first {
                    out.push(',');
                }
                first = false;
                emit(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by_key(|(key, _)| *key);

            out.push('{');
            let mut first = true;
            for (key, val) in entries {
                if !first {
                    out.push(',');
                }
                first = false;
                emit_string(key, out);
                out.push(':');
                emit(val, out);
            }
            out.push('}');
        }
    }
}

/// Write a JSON string literal with the minimal escape set.
///
/// Escapes `"`, `\`, and control characters below U+0020. Everything else
/// (including non-ASCII) is emitted verbatim as UTF-8.
fn emit_string(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c < '\u{20}' => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn scalars() {
        assert_eq!(canonical_json(&json!(null)), "null");
        assert_eq!(canonical_json(&json!(true)), "true");
        assert_eq!(canonical_json(&json!(false)), "false");
        assert_eq!(canonical_json(&json!(42)), "42");
        assert_eq!(canonical_json(&json!("hello")), "\"hello\"");
    }

    #[test]
    fn object_keys_sorted() {
        let val = json!({"z": 1, "a": 2, "m": 3});
        assert_eq!(canonical_json(&val), r#"{"a":2,"m":3,"z":1}"#);
    }

    #[test]
    fn nested_object_keys_sorted() {
        let val = json!({"z": 1, "a": {"c": 3, "b": 2}});
        assert_eq!(canonical_json(&val), r#"{"a":{"b":2,"c":3},"z":1}"#);
    }

    #[test]
    fn arrays_preserve_order() {
        assert_eq!(canonical_json(&json!([3, 1, 2])), "[3,1,2]");
        assert_eq!(
            canonical_json(&json!([{"b": 1, "a": 2}])),
            r#"[{"a":2,"b":1}]"#
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            canonical_json(&json!("she said \"hi\"")),
            "\"she said \\\"hi\\\"\""
        );
        assert_eq!(canonical_json(&json!("a\tb\nc")), "\"a\\tb\\nc\"");
        assert_eq!(canonical_json(&json!("\u{01}")), "\"\\u0001\"");
    }

    #[test]
    fn unicode_passes_through() {
        let out = canonical_json(&json!({"name": "日本語", "emoji": "🎉"}));
        assert!(out.contains("日本語"));
        assert!(out.contains("🎉"));
    }

    #[test]
    fn no_whitespace_outside_strings() {
        let out = canonical_json(&json!({"key": [1, 2], "other": null}));
        assert!(!out.contains(' '));
        assert!(!out.contains('\n'));
    }

    #[test]
    fn session_descriptor_key_shape() {
        let val = json!({"tool": ["editor"], "student": ["Alice"]});
        assert_eq!(
            canonical_json(&val),
            r#"{"student":["Alice"],"tool":["editor"]}"#
        );
    }

    #[test]
    fn agrees_with_serde_parse() {
        // Canonical output must itself be valid JSON with the same meaning.
        let val = json!({"b": {"d": [1, "two", null], "c": true}, "a": 3.5});
        let out = canonical_json(&val);
        let reparsed: Value = serde_json::from_str(&out).expect("canonical output parses");
        assert_eq!(reparsed, val);
    }

    // Strategy for arbitrary JSON values of bounded depth.
    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 \t\n\"\\\\]{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| json!(m)),
            ]
        })
    }

    proptest! {
        #[test]
        fn idempotent(val in arb_json()) {
            let first = canonical_json(&val);
            let reparsed: Value = serde_json::from_str(&first).expect("valid JSON");
            let second = canonical_json(&reparsed);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn equal_values_serialize_identically(val in arb_json()) {
            // Round-tripping through serde_json (which may reorder object
            // internals) must not change the canonical form.
            let text = serde_json::to_string(&val).expect("serialize");
            let other: Value = serde_json::from_str(&text).expect("parse");
            prop_assert_eq!(canonical_json(&val), canonical_json(&other));
        }
    }
}
