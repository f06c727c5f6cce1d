// Method-call codec: JSON envelopes in the shape Flutter's JSONMethodCodec uses
//
//   call:            {"method": "<name>", "args": <any>}
//   success reply:   [<result>]
//   error reply:     ["<code>", <message|null>, <details|null>]
//   not implemented: empty reply

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Maximum accepted encoded call or reply: 64 KB
pub const MAX_ENVELOPE_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Envelope too large: {0} bytes")]
    TooLarge(usize),
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),
    #[error("Malformed method call: {0}")]
    MalformedCall(String),
}

/// A decoded method call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub args: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, args: Value) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    /// Call without arguments
    pub fn bare(method: impl Into<String>) -> Self {
        Self::new(method, Value::Null)
    }
}

/// Result of handling a method call
#[derive(Debug, Clone, PartialEq)]
pub enum MethodReply {
    Success(Value),
    Error {
        code: String,
        message: Option<String>,
        details: Value,
    },
    NotImplemented,
}

impl MethodReply {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        MethodReply::Error {
            code: code.into(),
            message: Some(message.into()),
            details: Value::Null,
        }
    }
}

fn check_size(len: usize) -> Result<(), CodecError> {
    if len > MAX_ENVELOPE_SIZE {
        return Err(CodecError::TooLarge(len));
    }
    Ok(())
}

/// Serialize a method call
pub fn encode_method_call(call: &MethodCall) -> Result<Vec<u8>, CodecError> {
    let bytes = serde_json::to_vec(call)?;
    check_size(bytes.len())?;
    Ok(bytes)
}

/// Deserialize a method call
pub fn decode_method_call(bytes: &[u8]) -> Result<MethodCall, CodecError> {
    check_size(bytes.len())?;

    let value: Value = serde_json::from_slice(bytes)?;
    let object = value
        .as_object()
        .ok_or_else(|| CodecError::MalformedCall("expected a JSON object".to_string()))?;

    let method = object
        .get("method")
        .and_then(Value::as_str)
        .ok_or_else(|| CodecError::MalformedCall("missing method name".to_string()))?;

    Ok(MethodCall {
        method: method.to_string(),
        args: object.get("args").cloned().unwrap_or(Value::Null),
    })
}

/// Serialize a reply envelope
pub fn encode_reply(reply: &MethodReply) -> Result<Vec<u8>, CodecError> {
    let envelope = match reply {
        MethodReply::NotImplemented => return Ok(Vec::new()),
        MethodReply::Success(result) => Value::Array(vec![result.clone()]),
        MethodReply::Error {
            code,
            message,
            details,
        } => Value::Array(vec![
            Value::String(code.clone()),
            message.clone().map(Value::String).unwrap_or(Value::Null),
            details.clone(),
        ]),
    };

    let bytes = serde_json::to_vec(&envelope)?;
    check_size(bytes.len())?;
    Ok(bytes)
}

/// Deserialize a reply envelope
pub fn decode_reply(bytes: &[u8]) -> Result<MethodReply, CodecError> {
    if bytes.is_empty() {
        return Ok(MethodReply::NotImplemented);
    }
    check_size(bytes.len())?;

    let value: Value = serde_json::from_slice(bytes)?;
    let mut items = match value {
        Value::Array(items) => items,
        other => {
            return Err(CodecError::MalformedEnvelope(format!(
                "expected an array, got {}",
                other
            )))
        }
    };

    match items.len() {
        1 => Ok(MethodReply::Success(items.remove(0))),
        3 => {
            let details = items.pop().unwrap_or(Value::Null);
            let message = match items.pop() {
                Some(Value::String(message)) => Some(message),
                Some(Value::Null) | None => None,
                Some(other) => {
                    return Err(CodecError::MalformedEnvelope(format!(
                        "error message must be a string, got {}",
                        other
                    )))
                }
            };
            let code = match items.pop() {
                Some(Value::String(code)) => code,
                _ => {
                    return Err(CodecError::MalformedEnvelope(
                        "error code must be a string".to_string(),
                    ))
                }
            };
            Ok(MethodReply::Error {
                code,
                message,
                details,
            })
        }
        n => Err(CodecError::MalformedEnvelope(format!(
            "unexpected envelope length {}",
            n
        ))),
    }
}
