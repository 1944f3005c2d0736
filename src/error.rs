//! Errors surfaced to BFF callers.
//!
//! Every variant maps to exactly one HTTP status; the mapping to a response
//! body lives in `http::response`.

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::upstream::TransportError;

/// Failure of a proxied operation.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The upstream access token is not configured.
    #[error("{0} is not set")]
    MissingCredential(String),

    /// The credential is inside a backoff window.
    #[error("rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64, detail: Value },

    /// The upstream answered with an error status.
    #[error("upstream rejected the request with status {status}")]
    UpstreamRejected { status: u16, body: Value },

    /// No response was obtained from the upstream.
    #[error(transparent)]
    UpstreamUnreachable(#[from] TransportError),

    /// OAuth client id and/or secret are not configured.
    #[error("{id_var}/{secret_var} is not set")]
    MissingClientCredentials { id_var: String, secret_var: String },

    /// A refresh was requested without a refresh token.
    #[error("refresh_token is required")]
    MissingRefreshToken,

    /// A request parameter failed type or range checks.
    #[error("invalid parameter '{field}': {reason}")]
    InvalidParameter { field: String, reason: String },
}

/// Result type for proxied operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

impl ProxyError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ProxyError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MissingCredential(_) | ProxyError::MissingClientCredentials { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::UpstreamRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ProxyError::UpstreamUnreachable(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            ProxyError::MissingRefreshToken | ProxyError::InvalidParameter { .. } => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}
