//! Response envelope handling
//!
//! Success bodies come wrapped as `{ "data": ... }`; failures carry a human-readable
//! `message` or `error` field.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Decode a success body, unwrapping `data` when present
pub fn decode_data<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(body)?
    };

    let value = match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };

    Ok(serde_json::from_value(value)?)
}

/// Build the error for a non-success response
pub fn decode_error(status: StatusCode, body: &[u8]) -> Error {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    Error::Api {
        status: status.as_u16(),
        message,
    }
}
