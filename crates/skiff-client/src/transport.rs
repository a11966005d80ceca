//! HTTP transport for bucket operations
//!
//! The bucket client only needs one capability from the network: send a
//! fully signed request and hand back status, headers and body. That
//! capability is the [`HttpClient`] trait; [`ReqwestClient`] is the default
//! implementation and tests substitute in-memory stubs.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use reqwest::{Client, ClientBuilder};
use tracing::debug;

use skiff_core::{Error, Result};

/// A signed request ready for the wire
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    /// `None` leaves the call unbounded
    pub timeout: Option<Duration>,
}

/// Reply from the storage service
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse::<http::HeaderValue>() {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Capability to perform one HTTP exchange
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Network and timeout failures surface as [`Error::Transport`]; any
    /// status code, including errors, is a successful fetch.
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// [`HttpClient`] backed by a pooled `reqwest` client
#[derive(Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| Error::transport(e.to_string()))?;

        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!("{} {}", request.method, request.url);

        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            // reqwest derives the length from the body
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient").finish_non_exhaustive()
    }
}

fn map_reqwest_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::timeout(e.to_string())
    } else {
        Error::transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_builder() {
        let response = HttpResponse::new(StatusCode::NO_CONTENT)
            .with_header("etag", "\"abc\"")
            .with_body("payload");

        assert!(response.is_success());
        assert_eq!(response.headers.get("etag").unwrap(), "\"abc\"");
        assert_eq!(response.body, Bytes::from_static(b"payload"));
        assert!(!HttpResponse::new(StatusCode::NOT_FOUND).is_success());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client = ReqwestClient::new().unwrap();
        let result = client
            .fetch(HttpRequest {
                url: "http://127.0.0.1:1/bucket/key".to_string(),
                method: Method::GET,
                headers: Vec::new(),
                body: None,
                timeout: Some(Duration::from_secs(5)),
            })
            .await;

        assert!(matches!(result, Err(Error::Transport { .. })));
    }
}
