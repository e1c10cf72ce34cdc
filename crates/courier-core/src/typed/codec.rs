//! JSON conversions for callback payloads and line-delimited wire messages.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("json decode: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("json encode: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("wire line must not contain a newline")]
    EmbeddedNewline,
}

/// Decode a JSON payload into a callback's input type.
pub fn decode_payload<T: DeserializeOwned>(payload: Value) -> Result<T, CodecError> {
    serde_json::from_value(payload).map_err(CodecError::Decode)
}

/// Encode a callback's output (or a typed input) as a JSON payload.
pub fn encode_payload<T: Serialize>(value: &T) -> Result<Value, CodecError> {
    serde_json::to_value(value).map_err(CodecError::Encode)
}

/// One JSON document per line, without the trailing `\n`.
pub fn encode_line<T: Serialize>(value: &T) -> Result<String, CodecError> {
    let line = serde_json::to_string(value).map_err(CodecError::Encode)?;
    // serde_json escapes newlines inside strings; compact output never has raw ones
    if line.contains('\n') {
        return Err(CodecError::EmbeddedNewline);
    }
    Ok(line)
}

pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T, CodecError> {
    serde_json::from_str(line.trim_end_matches(['\r', '\n'])).map_err(CodecError::Decode)
}
