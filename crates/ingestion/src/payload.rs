//! Payload decoding: raw transport bytes -> `SensorSample`

use contracts::{RawMessage, SensorSample};

use crate::error::{IngestionError, Result};

/// Decode the payload as UTF-8 text
pub fn decode_payload(message: &RawMessage) -> Result<&str> {
    std::str::from_utf8(&message.payload).map_err(|e| IngestionError::DecodeFailed {
        topic: message.topic.clone(),
        message: e.to_string(),
    })
}

/// Decode and strictly parse a sample
///
/// Unknown or missing fields, non-numeric readings and malformed
/// timestamps are all parse failures.
pub fn parse_sample(message: &RawMessage) -> Result<SensorSample> {
    let text = decode_payload(message)?;
    serde_json::from_str(text).map_err(|e| IngestionError::ParseFailed {
        topic: message.topic.clone(),
        message: e.to_string(),
    })
}
