//! Decoding the device's JSON response envelope.
//!
//! The device answers with one object: `rc` (integer, required), `msg`
//! (string, optional) and `data` (object, optional). A field of the wrong JSON
//! type counts as absent.

use serde_json::{Map, Value};
use thiserror::Error;

/// A well-formed device response.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceResponse {
    /// `rc == 0`.
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<Map<String, Value>>,
}

/// The response could not be decoded. Distinct from a device-reported failure.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response is empty")]
    Empty,
    #[error("response is not a JSON object")]
    NotAnObject,
    #[error("response carries no integer rc")]
    MissingResultCode,
}

/// Decode the raw bytes of one device reply.
pub fn decode(raw: &[u8]) -> Result<DeviceResponse, DecodeError> {
    // Only the first value counts; whatever follows it in the buffer is ignored.
    let value = serde_json::Deserializer::from_slice(trim(raw))
        .into_iter::<Value>()
        .next()
        .ok_or(DecodeError::Empty)??;
    let Value::Object(mut fields) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let rc = fields
        .get("rc")
        .and_then(Value::as_i64)
        .and_then(|rc| i32::try_from(rc).ok())
        .ok_or(DecodeError::MissingResultCode)?;

    let message = match fields.remove("msg") {
        Some(Value::String(message)) => Some(message),
        _ => None,
    };
    let data = match fields.remove("data") {
        Some(Value::Object(data)) => Some(data),
        _ => None,
    };

    Ok(DeviceResponse {
        success: rc == 0,
        message,
        data,
    })
}

/// Drop line endings and NUL padding around the reply.
fn trim(raw: &[u8]) -> &[u8] {
    let noise = |b: &u8| b.is_ascii_whitespace() || *b == 0;
    let start = raw.iter().position(|b| !noise(b)).unwrap_or(raw.len());
    let end = raw.iter().rposition(|b| !noise(b)).map_or(start, |i| i + 1);
    &raw[start..end]
}
