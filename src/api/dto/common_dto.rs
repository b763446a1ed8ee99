//! Error body shared by every endpoint.

use reqwest::StatusCode;
use serde::Deserialize;

/// Longest text body echoed back in an error message.
const MAX_TEXT_MESSAGE: usize = 200;

/// JSON error body returned by the server on failure.
///
/// The server is not consistent about the shape: `error` may be a plain
/// string or an object with a `message` field, and some handlers use a
/// top-level `message` instead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    /// Error string or structured error object.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    /// Alternative top-level message.
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Returns the most specific non-empty message in the body.
    #[must_use]
    pub fn best_message(&self) -> Option<String> {
        let from_error = match &self.error {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Object(obj)) => obj
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
            _ => None,
        };
        from_error
            .or_else(|| self.message.clone())
            .filter(|m| !m.trim().is_empty())
    }
}

/// Builds the operator-facing message for a failed response.
///
/// Prefers the JSON error fields, then a non-empty text body, then
/// `HTTP {status}`.
#[must_use]
pub fn error_message(status: StatusCode, is_json: bool, body: &str) -> String {
    if is_json {
        if let Some(message) = serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.best_message())
        {
            return message;
        }
    } else {
        let text = body.trim();
        if !text.is_empty() {
            return text.chars().take(MAX_TEXT_MESSAGE).collect();
        }
    }
    format!("HTTP {}", status.as_u16())
}
