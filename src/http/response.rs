//! Mapping of proxy results onto HTTP responses.
//!
//! Errors are rendered as `{"detail": ...}`, where detail is either a message
//! or the upstream's own error body. Rate-limit errors carry `Retry-After`.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::error::ProxyError;
use crate::orchestrator::ProxiedResponse;

impl ProxyError {
    /// Value of the `detail` field in the error body.
    pub fn detail(&self) -> Value {
        match self {
            ProxyError::RateLimited { detail, .. } => detail.clone(),
            ProxyError::UpstreamRejected { body, .. } => body.clone(),
            other => Value::String(other.to_string()),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "detail": self.detail() }));
        let mut response = (status, body).into_response();

        if let ProxyError::RateLimited { retry_after_secs, .. } = &self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
        }
        response
    }
}

impl IntoResponse for ProxiedResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self.payload)).into_response()
    }
}
