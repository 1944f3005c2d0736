//! Upstream HTTP transport.
//!
//! # Responsibilities
//! - Issue GET calls with bearer auth and query parameters
//! - Issue form-encoded POSTs (optionally with HTTP Basic auth) for OAuth
//! - Enforce the configured connect/total timeouts
//! - Classify failures as timeout vs connection problems
//!
//! The `UpstreamTransport` trait is the seam the orchestrator and token
//! exchanger are written against; `ReqwestTransport` is the production
//! implementation.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use reqwest::Method;
use std::time::Duration;
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::upstream::response::UpstreamResponse;

/// Transport-level failures (no HTTP response was obtained).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The call exceeded its deadline.
    #[error("upstream request timed out after {0} seconds")]
    Timeout(u64),

    /// The connection could not be established.
    #[error("failed to connect to upstream: {0}")]
    Connect(String),

    /// Any other failure while sending or reading the response.
    #[error("upstream request failed: {0}")]
    Request(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl TransportError {
    /// True for deadline expiry, which maps to 504 rather than 502.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

/// One outbound call.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub query: Vec<(String, String)>,
    pub form: Option<Vec<(String, String)>>,
    pub basic_auth: Option<(String, String)>,
}

impl UpstreamRequest {
    /// A GET request with no auth or parameters yet.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            bearer: None,
            query: Vec::new(),
            form: None,
            basic_auth: None,
        }
    }

    /// A form-encoded POST.
    pub fn post_form(url: impl Into<String>, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            bearer: None,
            query: Vec::new(),
            form: Some(form),
            basic_auth: None,
        }
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query = pairs;
        self
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((username.into(), password.into()));
        self
    }

    /// Value of a form field, if this is a form request.
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .as_ref()?
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP transport interface (for dependency injection).
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    /// Send a request and return the raw response, whatever its status.
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError>;
}

/// Default reqwest-based transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl ReqwestTransport {
    /// Build a client honoring the upstream timeouts and user agent.
    pub fn new(config: &UpstreamConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout_secs)
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl UpstreamTransport for ReqwestTransport {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .header(ACCEPT, "application/json");

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }
        if let Some((username, password)) = &request.basic_auth {
            builder = builder.basic_auth(username, Some(password));
        }

        let response = builder.send().await.map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let content_type = header_value(response.headers(), CONTENT_TYPE);
        let retry_after = header_value(response.headers(), RETRY_AFTER);

        let body = response.text().await.map_err(|e| self.classify(e))?;

        Ok(UpstreamResponse {
            status,
            content_type,
            retry_after,
            body,
        })
    }
}

fn header_value(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
