//! Canonical JSON Serialization
//!
//! Deterministic, key-order-independent rendering of arbitrary JSON values.
//! Both payload hashing and reproducible signing messages are built on this:
//! two semantically equal values must always serialize to the same text.

use alloy::primitives::keccak256;
use serde_json::Value;

/// Serialize a JSON value to a single deterministic string.
///
/// Object keys are sorted lexicographically (byte order) before emission;
/// array order is preserved because it is semantically significant. No
/// insignificant whitespace is emitted. Numbers with an integral value are
/// rendered without a fractional part, so `1` and `1.0` produce the same
/// text (and the same payload hash).
pub fn stable_json_stringify(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// Keccak-256 over the canonical serialization of `payload`, rendered as a
/// `0x`-prefixed lowercase hex string. Used to derive a challenge's
/// `payload_hash` when the issuer did not supply one.
pub fn hash_payload(payload: &Value) -> String {
    let canonical = stable_json_stringify(payload);
    let digest = keccak256(canonical.as_bytes());
    format!("0x{}", hex::encode(digest))
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();

            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // serde_json handles JSON string escaping for the key.
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_value(out, &map[key.as_str()]);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Number(num) => {
            // JSON does not distinguish 1 from 1.0, but serde_json renders
            // them differently. Fold integral floats onto the integer form
            // so equal values always hash alike. Above 2^53 the float form
            // is no longer exact, so it keeps serde_json's rendering.
            match num.as_f64() {
                Some(f)
                    if num.as_i64().is_none()
                        && num.as_u64().is_none()
                        && f.fract() == 0.0
                        && f.abs() < 9_007_199_254_740_992.0 =>
                {
                    out.push_str(&(f as i64).to_string());
                }
                _ => out.push_str(&num.to_string()),
            }
        }
        // Null, booleans, and strings already have exactly one serde_json
        // rendering per value.
        primitive => out.push_str(&primitive.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"b":1,"a":{"y":2,"x":3}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a":{"x":3,"y":2},"b":1}"#).unwrap();
        assert_eq!(stable_json_stringify(&a), stable_json_stringify(&b));
        assert_eq!(stable_json_stringify(&a), r#"{"a":{"x":3,"y":2},"b":1}"#);
    }

    #[test]
    fn test_array_order_is_preserved() {
        let v = json!({"items": [3, 1, 2]});
        assert_eq!(stable_json_stringify(&v), r#"{"items":[3,1,2]}"#);
    }

    #[test]
    fn test_nested_arrays_of_objects() {
        let v = json!([{"b": 1, "a": 2}, {"d": 3, "c": 4}]);
        assert_eq!(stable_json_stringify(&v), r#"[{"a":2,"b":1},{"c":4,"d":3}]"#);
    }

    #[test]
    fn test_string_escaping_round_trips() {
        let v = json!({"msg": "line1\nline2 \"quoted\""});
        let text = stable_json_stringify(&v);
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_primitives() {
        assert_eq!(stable_json_stringify(&json!(null)), "null");
        assert_eq!(stable_json_stringify(&json!(true)), "true");
        assert_eq!(stable_json_stringify(&json!(42)), "42");
        assert_eq!(stable_json_stringify(&json!(-0.5)), "-0.5");
        assert_eq!(stable_json_stringify(&json!("hi")), "\"hi\"");
    }

    #[test]
    fn test_integral_floats_fold_to_integer_form() {
        assert_eq!(stable_json_stringify(&json!(1.0)), "1");
        assert_eq!(stable_json_stringify(&json!(-7.0)), "-7");
        assert_eq!(stable_json_stringify(&json!(0.25)), "0.25");
        assert_eq!(
            stable_json_stringify(&json!({"amount": 1.0})),
            stable_json_stringify(&json!({"amount": 1}))
        );
        assert_eq!(
            hash_payload(&json!({"amount": 1.0})),
            hash_payload(&json!({"amount": 1}))
        );
    }

    #[test]
    fn test_hash_is_stable_under_key_reordering() {
        let a: Value = serde_json::from_str(r#"{"n":"1","m":"2"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"m":"2","n":"1"}"#).unwrap();
        assert_eq!(hash_payload(&a), hash_payload(&b));
        assert!(hash_payload(&a).starts_with("0x"));
        assert_eq!(hash_payload(&a).len(), 2 + 64);
    }
}
