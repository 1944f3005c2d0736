//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate URLs, addresses and value ranges
//! - Keep the inbound ceiling above the upstream timeout
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{ProxyConfig, ResourceConfig};

/// Upper bound for any single upstream call.
const MAX_UPSTREAM_TIMEOUT_SECS: u64 = 300;

/// Longest a cached response may be served.
const MAX_CACHE_TTL_SECS: u64 = 86_400;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be > 0"));
    }

    check_http_url(&mut errors, "upstream.base_url", &config.upstream.base_url);
    check_http_url(&mut errors, "oauth.token_url", &config.oauth.token_url);
    check_http_url(&mut errors, "oauth.authorize_url", &config.oauth.authorize_url);
    check_http_url(&mut errors, "oauth.redirect_uri", &config.oauth.redirect_uri);

    let upstream = &config.upstream;
    if upstream.timeout_secs == 0 || upstream.timeout_secs > MAX_UPSTREAM_TIMEOUT_SECS {
        errors.push(ValidationError::new(
            "upstream.timeout_secs",
            format!("must be within 1..={}", MAX_UPSTREAM_TIMEOUT_SECS),
        ));
    }
    if upstream.connect_timeout_secs == 0 || upstream.connect_timeout_secs > upstream.timeout_secs {
        errors.push(ValidationError::new(
            "upstream.connect_timeout_secs",
            "must be > 0 and not exceed upstream.timeout_secs",
        ));
    }
    if config.timeouts.request_secs <= upstream.timeout_secs {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must exceed upstream.timeout_secs",
        ));
    }

    check_resource(&mut errors, "items", &config.items);
    check_resource(&mut errors, "orders", &config.orders);

    if config.cache.max_entries == 0 {
        errors.push(ValidationError::new("cache.max_entries", "must be > 0"));
    }

    let credentials = &config.credentials;
    for (field, name) in [
        ("credentials.access_token_var", &credentials.access_token_var),
        ("credentials.client_id_var", &credentials.client_id_var),
        ("credentials.client_secret_var", &credentials.client_secret_var),
    ] {
        if name.trim().is_empty() {
            errors.push(ValidationError::new(field, "must name an environment variable"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}

fn check_resource(errors: &mut Vec<ValidationError>, name: &str, resource: &ResourceConfig) {
    if resource.default_backoff_secs == 0 {
        errors.push(ValidationError::new(
            format!("{}.default_backoff_secs", name),
            "must be > 0",
        ));
    }
    if resource.cache_ttl_secs > MAX_CACHE_TTL_SECS {
        errors.push(ValidationError::new(
            format!("{}.cache_ttl_secs", name),
            format!("must be within 0..={}", MAX_CACHE_TTL_SECS),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.upstream.base_url = "ftp://example.com".into();
        config.upstream.timeout_secs = 0;
        config.items.default_backoff_secs = 0;
        config.listener.bind_address = "not-an-address".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();

        assert!(fields.contains(&"upstream.base_url"));
        assert!(fields.contains(&"upstream.timeout_secs"));
        assert!(fields.contains(&"items.default_backoff_secs"));
        assert!(fields.contains(&"listener.bind_address"));
    }

    #[test]
    fn test_request_ceiling_must_exceed_upstream_timeout() {
        let mut config = ProxyConfig::default();
        config.timeouts.request_secs = config.upstream.timeout_secs;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");
    }

    #[test]
    fn test_cache_ttl_is_bounded() {
        let mut config = ProxyConfig::default();
        config.orders.cache_ttl_secs = MAX_CACHE_TTL_SECS;
        assert!(validate_config(&config).is_ok());

        config.orders.cache_ttl_secs = u64::MAX;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "orders.cache_ttl_secs");
    }
}
