//! Workflow argument envelope.
//!
//! The workflow invocation expects `{"argument": <string>}` where the string
//! holds JSON text rather than a nested object, so the payload is encoded
//! twice: once to JSON text, then again as a JSON string literal.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::payload::JobPayload;

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    argument: Option<serde_json::Value>,
}

/// Encodes `payload` as `{"argument": "<escaped payload JSON>"}`.
///
/// # Errors
///
/// Returns an error if the payload cannot be serialized.
pub fn encode_envelope(payload: &JobPayload) -> Result<String> {
    let json = payload.to_json()?;
    let argument =
        serde_json::to_string(&json).map_err(|e| Error::serialization(e.to_string()))?;
    Ok(format!("{{\"argument\": {argument}}}"))
}

/// Decodes an envelope produced by [`encode_envelope`].
///
/// # Errors
///
/// Returns an error if the text is not a JSON object, if `argument` is
/// missing or not a string, or if the argument is not a job payload.
pub fn decode_envelope(text: &str) -> Result<JobPayload> {
    let raw: RawEnvelope =
        serde_json::from_str(text).map_err(|e| Error::envelope(format!("outer JSON: {e}")))?;

    let argument = match raw.argument {
        Some(serde_json::Value::String(argument)) => argument,
        Some(other) => {
            return Err(Error::envelope(format!(
                "argument must be a string, got {other}"
            )))
        }
        None => return Err(Error::envelope("missing argument field")),
    };

    serde_json::from_str(&argument).map_err(|e| Error::envelope(format!("argument JSON: {e}")))
}
