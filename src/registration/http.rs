//! # HTTP transport for registration requests.
//!
//! [`HttpClient`] is the single seam between a delivery and the network.
//! [`ReqwestClient`] (feature `reqwest-client`, on by default) is the stock
//! implementation; tests substitute scripted fakes.

use async_trait::async_trait;

use crate::error::HttpError;

/// Status and body of a completed HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses.
    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one registration request.
///
/// Implementations return:
/// - `Ok(response)` whenever the endpoint answered, whatever the status;
/// - [`HttpError::Transport`] when no response was obtained;
/// - [`HttpError::Request`] when the request itself is invalid.
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: String,
    ) -> Result<HttpResponse, HttpError>;
}

/// [`HttpClient`] backed by [`reqwest`].
#[cfg(feature = "reqwest-client")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

#[cfg(feature = "reqwest-client")]
impl ReqwestClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a preconfigured client (timeouts, proxies, TLS roots).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn classify(e: reqwest::Error) -> HttpError {
        if e.is_builder() {
            HttpError::Request(e.to_string())
        } else {
            HttpError::Transport(e.to_string())
        }
    }
}

#[cfg(feature = "reqwest-client")]
#[async_trait]
impl HttpClient for ReqwestClient {
    async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: String,
    ) -> Result<HttpResponse, HttpError> {
        let mut request = self.client.post(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.body(body).send().await.map_err(Self::classify)?;
        let status = response.status().as_u16();
        if response.status().is_success() {
            return Ok(HttpResponse::new(status, String::new()));
        }
        // Body of a rejection is diagnostic only.
        let body = response.text().await.unwrap_or_default();
        Ok(HttpResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
        assert!(!HttpResponse::new(300, "").is_success());
        assert!(!HttpResponse::new(500, "Server error").is_success());
    }

    #[cfg(feature = "reqwest-client")]
    #[tokio::test]
    async fn test_reqwest_invalid_url_is_a_request_error() {
        let client = ReqwestClient::new();
        let err = client.post("not a url", &[], String::new()).await.unwrap_err();
        assert!(matches!(err, HttpError::Request(_)), "got {err:?}");
    }

    #[cfg(feature = "reqwest-client")]
    #[tokio::test]
    async fn test_reqwest_refused_connection_is_transport() {
        let client = ReqwestClient::new();
        let err = client
            .post("http://127.0.0.1:1/", &[("content-type", "application/json")], "{}".into())
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Transport(_)), "got {err:?}");
    }
}
