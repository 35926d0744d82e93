//! Wire codec for the editor bridge.
//!
//! One request or response is a single self-delimiting frame on the TCP
//! stream: a 4-byte big-endian length prefix followed by that many bytes of
//! UTF-8 JSON. Requests carry `{"type": <command>, "params": {...}}`;
//! responses carry `{"status": "success", "result": ...}` or
//! `{"status": "error", "message": "..."}`.
//!
//! The command set is open-ended and defined by callers, so the codec never
//! assumes a per-command schema — params and results travel as raw
//! `serde_json::Value` trees.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::error::EditorError;

/// Length of the frame header (big-endian u32 body length).
pub const FRAME_HEADER_LEN: usize = 4;

/// Frames larger than this are treated as stream corruption rather than a
/// legitimate payload.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

// ─── Encoding ────────────────────────────────────────────────────────────────

/// Encode one command request as a complete frame (header + JSON body).
///
/// `params` may be omitted; the editor receives an empty object in that case.
pub fn encode_request(command: &str, params: Option<&Map<String, Value>>) -> Vec<u8> {
    let empty = Map::new();
    let body = json!({
        "type": command,
        "params": params.unwrap_or(&empty),
    })
    .to_string();

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(body.as_bytes());
    frame
}

// ─── Decoding ────────────────────────────────────────────────────────────────

/// A decoded editor response: the opaque success payload, or the editor's
/// own error message.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorReply {
    Success(Value),
    Error(String),
}

#[derive(Deserialize)]
struct WireResponse {
    status: String,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

fn malformed(detail: impl std::fmt::Display) -> EditorError {
    EditorError::Connection(format!("malformed response frame: {detail}"))
}

/// Validate a frame header, rejecting absurd lengths before any allocation.
pub fn frame_len(header: [u8; FRAME_HEADER_LEN]) -> Result<usize, EditorError> {
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(malformed(format!("length {len} exceeds {MAX_FRAME_LEN} byte cap")));
    }
    Ok(len)
}

/// Decode one response body (the bytes after the length prefix).
///
/// Anything that is not a well-formed response object is a malformed-response
/// fault, never a false success.
pub fn decode_response(body: &[u8]) -> Result<EditorReply, EditorError> {
    let resp: WireResponse = serde_json::from_slice(body).map_err(malformed)?;
    match resp.status.as_str() {
        "success" => Ok(EditorReply::Success(resp.result.unwrap_or(Value::Null))),
        "error" => Ok(EditorReply::Error(resp.message.unwrap_or_else(|| {
            "editor reported an unspecified error".to_string()
        }))),
        other => Err(malformed(format!("unknown status {other:?}"))),
    }
}

/// Decode a complete response frame (header + body) from a byte buffer.
///
/// The live connection reads the header and body in two steps; this entry
/// point exists for peers replaying a raw byte log and for tests.
pub fn decode_frame(bytes: &[u8]) -> Result<EditorReply, EditorError> {
    if bytes.len() < FRAME_HEADER_LEN {
        return Err(malformed("truncated header"));
    }
    let mut header = [0u8; FRAME_HEADER_LEN];
    header.copy_from_slice(&bytes[..FRAME_HEADER_LEN]);
    let len = frame_len(header)?;
    let body = &bytes[FRAME_HEADER_LEN..];
    if body.len() < len {
        return Err(malformed(format!(
            "truncated body: expected {len} bytes, got {}",
            body.len()
        )));
    }
    if body.len() > len {
        return Err(malformed(format!(
            "trailing bytes after frame: expected {len} bytes, got {}",
            body.len()
        )));
    }
    decode_response(body)
}
