//! Backend response envelope handling
//!
//! Every backend endpoint wraps its payload as
//! `{success: bool, data?: ..., error?: {message, detail}}`. Unwrapping
//! happens once here so no caller ever branches on envelope shape.

use crate::error::{AppError, Result};
use serde_json::Value;

/// Unwrap the `{success, data, error}` envelope.
///
/// - `{success: true, data: X}` yields `X`.
/// - `{success: false, ...}` yields `AppError::Backend` carrying
///   `error.detail`, falling back to `error.message`.
/// - Any body that is not envelope-shaped is returned unchanged, so plain
///   payloads pass through transparently.
pub fn unwrap_envelope(body: Value) -> Result<Value> {
    if !body.is_object() {
        return Ok(body);
    }

    match body.get("success").and_then(Value::as_bool) {
        Some(true) if body.get("data").is_some() => match body {
            Value::Object(mut map) => Ok(map.remove("data").unwrap_or(Value::Null)),
            _ => unreachable!("checked is_object above"),
        },
        Some(false) => {
            let error = body.get("error");
            let message = error
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("request rejected")
                .to_string();
            let detail = error
                .and_then(|e| e.get("detail"))
                .and_then(Value::as_str)
                .map(|s| s.to_string());
            Err(AppError::Backend { message, detail })
        }
        // `success: true` without `data`, or no `success` key at all:
        // not an envelope, pass the body through.
        _ => Ok(body),
    }
}
