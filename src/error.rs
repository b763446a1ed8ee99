//! Client error types with stable numeric codes.
//!
//! [`QueueError`] is the central error type of the crate. Every fallible
//! operation returns it; the admin queue converts it into a
//! [`crate::domain::Notice`] at the operation boundary, so none escapes to
//! the operator as an unhandled fault.

use reqwest::StatusCode;

/// Client-side error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category          | Examples                              |
/// |-----------|-------------------|---------------------------------------|
/// | 1000–1999 | Local validation  | confirmation phrase, cancelled delete |
/// | 2000–2999 | Remote rejection  | HTTP error status, bad credential     |
/// | 3000–3999 | Transport         | timeout, network, push channel, decode |
/// | 4000–4999 | Configuration     | invalid origin                        |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Api {
        /// HTTP status code returned by the server.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The server rejected the admin credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The request failed before a response was received.
    #[error("network error: {0}")]
    Network(String),

    /// A response body or push frame was not the expected JSON.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Delete-all was attempted without the exact confirmation phrase.
    #[error("type the confirmation phrase to delete every request")]
    ConfirmationRequired,

    /// The operator declined to confirm a delete.
    #[error("delete cancelled")]
    Cancelled,

    /// The push channel failed or closed.
    #[error("push channel error: {0}")]
    Channel(String),

    /// Configuration could not be built.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl QueueError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::ConfirmationRequired => 1001,
            Self::Cancelled => 1002,
            Self::Api { .. } => 2001,
            Self::Unauthorized(_) => 2002,
            Self::Timeout => 3001,
            Self::Network(_) => 3002,
            Self::Decode(_) => 3003,
            Self::Channel(_) => 3004,
            Self::InvalidConfig(_) => 4001,
        }
    }

    /// Returns the HTTP status attached to this error, if it came from a
    /// server response.
    #[must_use]
    pub fn http_status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => StatusCode::from_u16(*status).ok(),
            _ => None,
        }
    }

    /// Returns `true` for transport failures that a manual retry may fix.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network(_) | Self::Channel(_))
    }

    /// Builds the error for a non-success HTTP response.
    ///
    /// 401 and 403 become [`QueueError::Unauthorized`].
    #[must_use]
    pub fn from_status(status: StatusCode, message: String) -> Self {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Self::Unauthorized(message)
        } else {
            Self::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

impl From<reqwest::Error> for QueueError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for QueueError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Channel(error.to_string())
    }
}
