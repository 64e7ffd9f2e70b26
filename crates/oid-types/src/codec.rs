//! Byte-array JSON field codec.
//!
//! On-chain configuration objects carry their payload as a Move
//! `vector<u8>` field named `json`, which surfaces through the RPC layer as
//! a JSON array of byte values. The bytes are UTF-8-encoded JSON text.
//! An empty vector decodes to `{}` rather than an error, so a freshly
//! published (not yet written) config object is usable.

use serde_json::Value;

use crate::error::OidError;

/// Decode a byte-array JSON field into the configuration value it encodes.
///
/// The input must be a JSON array of numbers in `0..=255`. An empty array
/// decodes to an empty object.
pub fn decode_json_field(field: &Value) -> Result<Value, OidError> {
    let items = field
        .as_array()
        .ok_or_else(|| OidError::Codec("expected a byte array".to_string()))?;

    if items.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    let mut bytes = Vec::with_capacity(items.len());
    for item in items {
        let byte = item
            .as_u64()
            .filter(|&b| b <= u8::MAX as u64)
            .ok_or_else(|| OidError::Codec(format!("non-byte value in byte array: {item}")))?;
        bytes.push(byte as u8);
    }

    let text = String::from_utf8(bytes)
        .map_err(|e| OidError::Codec(format!("byte array is not valid UTF-8: {e}")))?;

    serde_json::from_str(&text)
        .map_err(|e| OidError::Codec(format!("byte array is not valid JSON: {e}")))
}

/// Encode a JSON value as a byte-array field (the inverse of
/// [`decode_json_field`]).
pub fn encode_json_field(value: &Value) -> Value {
    let text = value.to_string();
    Value::Array(
        text.into_bytes()
            .into_iter()
            .map(|b| Value::from(b as u64))
            .collect(),
    )
}
