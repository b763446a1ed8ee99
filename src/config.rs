//! Client configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::time::Duration;

use crate::error::QueueError;

/// Default HTTP origin of the karaoke server.
pub const DEFAULT_API_ORIGIN: &str = "http://localhost:4000";

/// Default header carrying the admin credential.
pub const DEFAULT_ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Default phrase that unlocks delete-all.
pub const DEFAULT_DELETE_ALL_PHRASE: &str = "ELIMINAR";

/// Top-level client configuration.
///
/// Loaded once at startup via [`ClientConfig::from_env`], or built directly
/// with [`ClientConfig::new`] and adjusted field by field.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// HTTP base URL of the server, without a trailing slash.
    pub api_origin: String,

    /// WebSocket URL of the push channel.
    pub ws_url: String,

    /// Admin credential attached to every admin-scoped request.
    pub admin_key: String,

    /// Name of the header that carries [`ClientConfig::admin_key`].
    pub admin_key_header: String,

    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,

    /// Capacity of the [`crate::domain::EventBus`] broadcast channel.
    pub event_bus_capacity: usize,

    /// Window over which new-request notices are coalesced.
    pub notice_batch_window: Duration,

    /// Phrase the operator must type to enable delete-all.
    pub delete_all_phrase: String,
}

impl ClientConfig {
    /// Creates a configuration for `api_origin` with every other setting at
    /// its default. The push channel URL is derived from the origin.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidConfig`] if `api_origin` is not an
    /// `http://` or `https://` URL.
    pub fn new(api_origin: &str, admin_key: impl Into<String>) -> Result<Self, QueueError> {
        let api_origin = normalize_origin(api_origin)?;
        let ws_url = derive_ws_url(&api_origin)?;
        Ok(Self {
            api_origin,
            ws_url,
            admin_key: admin_key.into(),
            admin_key_header: DEFAULT_ADMIN_KEY_HEADER.to_string(),
            request_timeout: Duration::from_millis(10_000),
            event_bus_capacity: 1024,
            notice_batch_window: Duration::from_millis(700),
            delete_all_phrase: DEFAULT_DELETE_ALL_PHRASE.to_string(),
        })
    }

    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidConfig`] if `API_ORIGIN` or `WS_URL` is
    /// set but has the wrong scheme.
    pub fn from_env() -> Result<Self, QueueError> {
        dotenvy::dotenv().ok();

        let api_origin =
            std::env::var("API_ORIGIN").unwrap_or_else(|_| DEFAULT_API_ORIGIN.to_string());
        let admin_key = std::env::var("ADMIN_KEY").unwrap_or_default();
        let mut config = Self::new(&api_origin, admin_key)?;

        if let Ok(ws_url) = std::env::var("WS_URL") {
            if !(ws_url.starts_with("ws://") || ws_url.starts_with("wss://")) {
                return Err(QueueError::InvalidConfig(format!(
                    "WS_URL must start with ws:// or wss://, got {ws_url}"
                )));
            }
            config.ws_url = ws_url;
        }
        if let Ok(header) = std::env::var("ADMIN_KEY_HEADER")
            && !header.trim().is_empty()
        {
            config.admin_key_header = header.trim().to_string();
        }
        if let Ok(phrase) = std::env::var("DELETE_ALL_PHRASE")
            && !phrase.trim().is_empty()
        {
            config.delete_all_phrase = phrase.trim().to_string();
        }

        config.request_timeout = Duration::from_millis(parse_env("REQUEST_TIMEOUT_MS", 10_000));
        config.event_bus_capacity = parse_env("EVENT_BUS_CAPACITY", 1024);
        config.notice_batch_window = Duration::from_millis(parse_env("NOTICE_BATCH_MS", 700));

        Ok(config)
    }
}

/// Trims whitespace and trailing slashes and checks the scheme.
fn normalize_origin(raw: &str) -> Result<String, QueueError> {
    let origin = raw.trim().trim_end_matches('/');
    if origin.starts_with("http://") || origin.starts_with("https://") {
        Ok(origin.to_string())
    } else {
        Err(QueueError::InvalidConfig(format!(
            "API_ORIGIN must start with http:// or https://, got {raw:?}"
        )))
    }
}

/// Maps `http(s)://host` to `ws(s)://host/ws`.
fn derive_ws_url(origin: &str) -> Result<String, QueueError> {
    let rest = origin
        .strip_prefix("https://")
        .map(|rest| format!("wss://{rest}"))
        .or_else(|| origin.strip_prefix("http://").map(|rest| format!("ws://{rest}")))
        .ok_or_else(|| QueueError::InvalidConfig(format!("cannot derive ws url from {origin}")))?;
    Ok(format!("{rest}/ws"))
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_derives_ws_url_and_defaults() {
        let Ok(config) = ClientConfig::new("http://localhost:4000/", "secret") else {
            panic!("valid origin");
        };
        assert_eq!(config.api_origin, "http://localhost:4000");
        assert_eq!(config.ws_url, "ws://localhost:4000/ws");
        assert_eq!(config.admin_key_header, "x-admin-key");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.notice_batch_window, Duration::from_millis(700));
        assert_eq!(config.delete_all_phrase, "ELIMINAR");
    }

    #[test]
    fn https_origin_maps_to_wss() {
        let Ok(config) = ClientConfig::new("https://karaoke.example.com", "") else {
            panic!("valid origin");
        };
        assert_eq!(config.ws_url, "wss://karaoke.example.com/ws");
    }

    #[test]
    fn rejects_origin_without_scheme() {
        let result = ClientConfig::new("localhost:4000", "");
        assert!(matches!(result, Err(QueueError::InvalidConfig(_))));
    }

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        let value: u64 = parse_env("KARAOKE_QUEUE_TEST_SURELY_UNSET", 42);
        assert_eq!(value, 42);
    }
}
