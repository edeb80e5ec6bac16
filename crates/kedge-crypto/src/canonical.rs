//! RFC 8785 (JCS) canonical JSON serialisation.
//!
//! Object keys are sorted by UTF-16 code units at every depth, strings use
//! serde_json's escaper (which emits the RFC 8785 escape set), and there is
//! no insignificant whitespace. Protocol objects never contain non-integer
//! numbers, so serde_json's integer formatting is already canonical.

use kedge_core::ProtocolError;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

/// Serialise `value` to canonical JSON bytes.
pub fn canonicalize<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    let json = serde_json::to_value(value)
        .map_err(|e| ProtocolError::CanonicalizationFailure(e.to_string()))?;
    let mut out = String::new();
    write_value(&json, &mut out);
    Ok(out.into_bytes())
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            out.push_str(&serde_json::to_string(s).expect("string serialization is infallible"))
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| utf16_cmp(a, b));
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(
                    &serde_json::to_string(key).expect("string serialization is infallible"),
                );
                out.push(':');
                write_value(&map[key.as_str()], out);
            }
            out.push('}');
        }
    }
}

// RFC 8785 §3.2.3 sorts keys by UTF-16 code units, not Unicode scalar
// values; the two differ for supplementary-plane characters.
fn utf16_cmp(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}
