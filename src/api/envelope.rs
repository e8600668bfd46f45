//! Backend response envelope normalization.
//!
//! Frappe wraps successful payloads in `{"message": ...}`; older
//! deployments return them bare or under `data`. All three shapes are
//! accepted here so the rest of the crate only ever sees typed
//! models. Error replies (Frappe throws as HTTP 417) carry any of
//! `_server_messages`, `exception`, `exc_type`, `message`,
//! `_error_message`; the most specific human-readable message wins.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, Result};

/// Deserialize the payload of a success reply, unwrapping the
/// `message`/`data` envelope when one is present.
pub(crate) fn typed<T: DeserializeOwned>(body: Value) -> Result<T> {
    if let Value::Object(map) = &body {
        for key in ["message", "data"] {
            // Plain-string `message` fields are info text, not payload
            if let Some(inner @ (Value::Object(_) | Value::Array(_))) = map.get(key) {
                return from_value(inner.clone());
            }
        }
    }
    from_value(body)
}

/// Deserialize a named field of the payload, probing `message.<key>`,
/// `data.<key>`, then `<key>` on the bare body.
pub(crate) fn typed_at<T: DeserializeOwned>(body: Value, key: &str) -> Result<T> {
    let field = body
        .get("message")
        .and_then(|m| m.get(key))
        .or_else(|| body.get("data").and_then(|d| d.get(key)))
        .or_else(|| body.get(key))
        .cloned()
        .ok_or_else(|| AppError::parse(format!("response has no `{key}` field")))?;
    from_value(field)
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| AppError::parse(format!("unexpected response shape: {e}")))
}

/// Map a non-2xx reply to the error it represents.
pub(crate) fn parse_error(status: StatusCode, body: &str) -> AppError {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return AppError::remote(format!("Request failed with status {status}"));
    };

    if value.get("exc_type").and_then(Value::as_str) == Some("AuthenticationError") {
        return AppError::SessionExpired;
    }

    if let Some(message) = server_message(&value)
        .or_else(|| string_field(&value, "_error_message"))
        .or_else(|| string_field(&value, "message"))
        .or_else(|| exception_text(&value))
    {
        return AppError::remote(message);
    }

    AppError::remote(format!("Request failed with status {status}"))
}

/// `_server_messages` is a JSON-encoded array of JSON-encoded objects,
/// each carrying a `message`. The first entry is the one shown.
fn server_message(value: &Value) -> Option<String> {
    let raw = value.get("_server_messages")?.as_str()?;
    let entries: Vec<String> = serde_json::from_str(raw).ok()?;
    let first = entries.first()?;
    match serde_json::from_str::<Value>(first) {
        Ok(inner) => inner
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .or_else(|| Some(first.clone())),
        // Some deployments skip the inner encoding
        Err(_) => Some(first.clone()),
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Last-resort fallback: the tail of the Python exception repr.
fn exception_text(value: &Value) -> Option<String> {
    let exc = value.get("exception")?.as_str()?;
    let tail = exc.rsplit_once(": ").map_or(exc, |(_, t)| t);
    (!tail.is_empty()).then(|| tail.to_owned())
}
