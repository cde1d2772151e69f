//! JSON payload decoding for FFI callers.
//!
//! # Invariants
//! - Only a JSON object of primitive values is accepted.
//! - Blank input decodes to an empty payload.

use pocketa_core::{CommandPayload, PayloadValue};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadDecodeError {
    InvalidJson(String),
    NotAnObject,
    NonPrimitive { key: String },
    IntegerOutOfRange { key: String },
}

impl Display for PayloadDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(message) => write!(f, "payload is not valid JSON: {message}"),
            Self::NotAnObject => write!(f, "payload must be a JSON object"),
            Self::NonPrimitive { key } => {
                write!(f, "payload value for `{key}` must be a bool, number or string")
            }
            Self::IntegerOutOfRange { key } => {
                write!(f, "payload integer for `{key}` does not fit in 64-bit signed range")
            }
        }
    }
}

impl Error for PayloadDecodeError {}

pub(crate) fn decode_payload(raw: &str) -> Result<CommandPayload, PayloadDecodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(CommandPayload::new());
    }

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|err| PayloadDecodeError::InvalidJson(err.to_string()))?;
    let Value::Object(entries) = value else {
        return Err(PayloadDecodeError::NotAnObject);
    };

    entries
        .into_iter()
        .map(|(key, value)| {
            let primitive = match value {
                Value::Bool(flag) => PayloadValue::Bool(flag),
                // Integers past i64 would silently lose precision as floats.
                Value::Number(number) => match (number.as_i64(), number.as_f64()) {
                    (Some(int), _) => PayloadValue::Int(int),
                    (None, Some(float)) if number.is_f64() => PayloadValue::Float(float),
                    _ => return Err(PayloadDecodeError::IntegerOutOfRange { key }),
                },
                Value::String(text) => PayloadValue::Text(text),
                Value::Null | Value::Array(_) | Value::Object(_) => {
                    return Err(PayloadDecodeError::NonPrimitive { key })
                }
            };
            Ok((key, primitive))
        })
        .collect()
}

pub(crate) fn encode_payload(payload: &CommandPayload) -> String {
    serde_json::to_string(payload).unwrap_or_else(|err| {
        log::error!("event=payload_encode module=ffi status=error error={err}");
        "{}".to_string()
    })
}
