//! Canonical JSON and the content fingerprints derived from it.
//!
//! The action service fingerprints a proposal as the SHA-256 of its payload
//! serialized with sorted object keys, no insignificant whitespace and
//! non-ASCII text left unescaped. Signed events are identified by the
//! SHA-256 of the compact array `[0, pubkey, created_at, kind, tags, content]`.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Serialize `value` with object keys sorted at every depth.
pub fn canonical_json(value: &Value) -> Result<String> {
    let mut out = String::new();
    write_canonical(value, &mut out)?;
    Ok(out)
}

/// Canonical JSON of any serializable value.
pub fn canonical_json_of<T: Serialize>(value: &T) -> Result<String> {
    canonical_json(&serde_json::to_value(value)?)
}

fn write_canonical(value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_canonical(&map[key], out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Fingerprint of a proposal payload, as computed by the action service.
pub fn action_hash<T: Serialize>(payload: &T) -> Result<String> {
    Ok(sha256_hex(canonical_json_of(payload)?.as_bytes()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted_at_every_depth() {
        let v = json!({"b": 1, "a": {"z": true, "y": null}, "c": [{"k": 2, "j": 1}]});
        assert_eq!(
            canonical_json(&v).unwrap(),
            r#"{"a":{"y":null,"z":true},"b":1,"c":[{"j":1,"k":2}]}"#
        );
    }

    #[test]
    fn non_ascii_is_not_escaped() {
        let v = json!({"content": "héllo ✓"});
        assert_eq!(canonical_json(&v).unwrap(), r#"{"content":"héllo ✓"}"#);
    }

    #[test]
    fn hash_ignores_key_order() {
        let a = json!({"kind": 1, "content": "hello"});
        let b = json!({"content": "hello", "kind": 1});
        assert_eq!(action_hash(&a).unwrap(), action_hash(&b).unwrap());
    }

    #[test]
    fn hash_is_sha256_of_canonical_form() {
        // sha256('{"a":1}')
        assert_eq!(
            action_hash(&json!({"a": 1})).unwrap(),
            "015abd7f5cc57a2dd94b7590f04ad8084273905ee33ec5cebeae62276a97f862"
        );
    }

    #[test]
    fn sha256_hex_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
