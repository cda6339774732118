//! Decoding of note bodies.
//!
//! Note content normally arrives as plain markdown. Some server builds wrap
//! it in a serialized byte buffer, `{"type":"Buffer","data":[72,105]}`,
//! which must be turned back into UTF-8 text.

use serde::Deserialize;

use crate::error::ApiError;

#[derive(Deserialize)]
struct ByteBuffer {
    data: Vec<u8>,
}

/// Return the text of a note body, unwrapping a byte-buffer envelope.
pub fn decode_note_body(body: &str) -> Result<String, ApiError> {
    if !body.trim_start().starts_with('{') {
        return Ok(body.to_string());
    }
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return Ok(body.to_string()),
    };
    if value.get("type").and_then(|kind| kind.as_str()) != Some("Buffer") {
        return Ok(body.to_string());
    }

    let buffer: ByteBuffer = serde_json::from_value(value)
        .map_err(|e| ApiError::Decode(format!("malformed byte buffer: {e}")))?;
    String::from_utf8(buffer.data)
        .map_err(|e| ApiError::Decode(format!("byte buffer is not UTF-8: {e}")))
}
