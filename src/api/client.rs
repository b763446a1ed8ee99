//! HTTP implementation of [`QueueBackend`].

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use super::QueueBackend;
use super::dto::{SnapshotResponse, StatusChangeBody, error_message};
use crate::config::ClientConfig;
use crate::domain::{RequestId, RequestStatus, SongRequest};
use crate::error::QueueError;

/// REST client for the admin endpoints.
///
/// Every request carries `Accept: application/json` and, when configured,
/// the admin credential header. Failures are normalized into
/// [`QueueError`] with the server's own message when it sent one.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidConfig`] if the origin is not a valid
    /// URL, the credential header name or value is not a valid HTTP header,
    /// or the underlying client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, QueueError> {
        let base = Url::parse(&config.api_origin).map_err(|error| {
            QueueError::InvalidConfig(format!("API_ORIGIN is not a valid url: {error}"))
        })?;
        if base.cannot_be_a_base() {
            return Err(QueueError::InvalidConfig(format!(
                "API_ORIGIN cannot be used as a base url: {base}"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if !config.admin_key.is_empty() {
            let name = HeaderName::from_bytes(config.admin_key_header.as_bytes()).map_err(
                |error| QueueError::InvalidConfig(format!("ADMIN_KEY_HEADER is invalid: {error}")),
            )?;
            let mut value = HeaderValue::from_str(&config.admin_key).map_err(|error| {
                QueueError::InvalidConfig(format!("ADMIN_KEY is invalid: {error}"))
            })?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|error| {
                QueueError::InvalidConfig(format!("failed to build HTTP client: {error}"))
            })?;

        Ok(Self { client, base })
    }

    /// Checks that the configured admin credential is accepted.
    ///
    /// Performs the same protected fetch as a snapshot load and returns how
    /// many requests the server holds.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Unauthorized`] when the server rejects the
    /// credential, or any other [`QueueError`] if the fetch fails.
    pub async fn verify_credentials(&self) -> Result<usize, QueueError> {
        let snapshot = self.fetch_snapshot().await?;
        tracing::info!(requests = snapshot.len(), "admin credential accepted");
        Ok(snapshot.len())
    }

    /// Builds `{origin}/api/admin/requests[/segments...]`, percent-encoding
    /// each extra segment.
    fn endpoint(&self, extra: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "admin", "requests"])
                .extend(extra);
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, QueueError> {
        let response = request.send().await?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        let body = response.text().await?;

        if status.is_success() {
            Ok(body)
        } else {
            let message = error_message(status, is_json, &body);
            tracing::debug!(%status, %message, "admin request rejected");
            Err(QueueError::from_status(status, message))
        }
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, QueueError> {
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn request_status_only(&self, request: RequestBuilder) -> Result<(), QueueError> {
        self.send(request).await.map(|_| ())
    }
}

impl QueueBackend for HttpBackend {
    async fn fetch_snapshot(&self) -> Result<Vec<SongRequest>, QueueError> {
        let request = self.client.get(self.endpoint(&[]));
        let response: SnapshotResponse = self.request_json(request).await?;
        Ok(response.data)
    }

    async fn set_status(&self, id: &RequestId, status: RequestStatus) -> Result<(), QueueError> {
        let request = self
            .client
            .patch(self.endpoint(&[id.as_str(), "status"]))
            .json(&StatusChangeBody { status });
        self.request_status_only(request).await
    }

    async fn delete_one(&self, id: &RequestId) -> Result<(), QueueError> {
        let request = self.client.delete(self.endpoint(&[id.as_str()]));
        self.request_status_only(request).await
    }

    async fn delete_all(&self) -> Result<(), QueueError> {
        let request = self.client.delete(self.endpoint(&[]));
        self.request_status_only(request).await
    }
}
