//! Upstream response normalization.
//!
//! # Responsibilities
//! - Decide whether a body is structured (JSON content type)
//! - Wrap non-JSON success bodies under a `raw` field
//! - Produce the error detail forwarded to callers on rejection

use serde_json::{json, Value};

/// A buffered upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub retry_after: Option<String>,
    pub body: String,
}

impl UpstreamResponse {
    /// Build a JSON response (mostly for tests and mocks).
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            retry_after: None,
            body: body.to_string(),
        }
    }

    /// Build a plain-text response.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("text/plain".to_string()),
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// True when the content type announces JSON (`application/json` or `+json`).
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| {
                let essence = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
                essence == "application/json" || essence.ends_with("+json")
            })
            .unwrap_or(false)
    }

    /// Parsed body, if the content type says JSON and it parses.
    pub fn parsed(&self) -> Option<Value> {
        if !self.is_json() {
            return None;
        }
        serde_json::from_str(&self.body).ok()
    }

    /// Success payload: parsed JSON, else the text under `raw`.
    pub fn payload(&self) -> Value {
        self.parsed().unwrap_or_else(|| json!({ "raw": self.body }))
    }

    /// Error detail: parsed JSON, else the text, else `HTTP <status>`.
    pub fn error_detail(&self) -> Value {
        match self.parsed() {
            Some(value) => value,
            None if !self.body.is_empty() => Value::String(self.body.clone()),
            None => Value::String(format!("HTTP {}", self.status)),
        }
    }
}
