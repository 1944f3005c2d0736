//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the BFF.
//! All types derive Serde traits for deserialization from config files.
//! Secrets (access token, OAuth client credentials) are deliberately absent:
//! only the names of the environment variables holding them live here.

use serde::{Deserialize, Serialize};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Inbound timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Upstream platform API settings.
    pub upstream: UpstreamConfig,

    /// Names of the environment variables carrying secrets.
    pub credentials: CredentialConfig,

    /// OAuth endpoints and defaults.
    pub oauth: OAuthConfig,

    /// Item listing cache/backoff settings.
    pub items: ResourceConfig,

    /// Order listing cache/backoff settings (also governs order detail backoff).
    pub orders: ResourceConfig,

    /// Response cache bounds.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Ceiling on the whole inbound request in seconds.
    /// Must exceed the upstream timeout so upstream failures surface as 502/504.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 45 }
    }
}

/// Upstream platform API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the platform API (without the `/1/...` resource path).
    pub base_url: String,

    /// Total timeout for one upstream call in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// User-Agent sent upstream.
    pub user_agent: String,

    /// Error markers signalling an exhausted quota.
    pub quota: QuotaMarkers,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.thebase.in".to_string(),
            timeout_secs: 15,
            connect_timeout_secs: 5,
            user_agent: concat!("storefront-bff/", env!("CARGO_PKG_VERSION")).to_string(),
            quota: QuotaMarkers::default(),
        }
    }
}

/// Values of the upstream body's `"error"` field that mean a quota ran out.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuotaMarkers {
    /// Quota resetting at the top of the next UTC hour.
    pub hourly: Vec<String>,

    /// Quota resetting at UTC midnight.
    pub daily: Vec<String>,
}

impl Default for QuotaMarkers {
    fn default() -> Self {
        Self {
            hourly: vec!["hour_api_limit".to_string()],
            daily: vec!["day_api_limit".to_string()],
        }
    }
}

/// Environment variable names for secrets, read on every request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialConfig {
    pub access_token_var: String,
    pub client_id_var: String,
    pub client_secret_var: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            access_token_var: "BASE_ACCESS_TOKEN".to_string(),
            client_id_var: "BASE_CLIENT_ID".to_string(),
            client_secret_var: "BASE_CLIENT_SECRET".to_string(),
        }
    }
}

/// OAuth endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Token endpoint for code/refresh exchanges.
    pub token_url: String,

    /// Authorization endpoint users are redirected to.
    pub authorize_url: String,

    /// Redirect URI used when the caller does not supply one.
    pub redirect_uri: String,

    /// Scopes requested on the authorization redirect.
    pub scopes: Vec<String>,
}

pub const DEFAULT_REDIRECT_URI: &str = "https://ec-live.onrender.com/callback";

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            token_url: "https://api.thebase.in/1/oauth/token".to_string(),
            authorize_url: "https://api.thebase.in/1/oauth/authorize".to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: vec![
                "read_users".to_string(),
                "read_items".to_string(),
                "read_orders".to_string(),
            ],
        }
    }
}

/// Per-resource caching and backoff settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Seconds a successful response stays fresh. 0 disables caching.
    pub cache_ttl_secs: u64,

    /// Backoff applied when the upstream rate-limits without saying for how long.
    pub default_backoff_secs: u64,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 30,
            default_backoff_secs: 60,
        }
    }
}

/// Response cache bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum entries held per resource cache.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 10_000 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProxyConfig::default();
        assert_eq!(config.items.cache_ttl_secs, 30);
        assert_eq!(config.orders.default_backoff_secs, 60);
        assert_eq!(config.upstream.timeout_secs, 15);
        assert_eq!(config.credentials.access_token_var, "BASE_ACCESS_TOKEN");
        assert_eq!(config.oauth.redirect_uri, "https://ec-live.onrender.com/callback");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [upstream]
            base_url = "http://localhost:9999"

            [orders]
            cache_ttl_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.base_url, "http://localhost:9999");
        assert_eq!(config.upstream.timeout_secs, 15);
        assert_eq!(config.orders.cache_ttl_secs, 5);
        assert_eq!(config.orders.default_backoff_secs, 60);
        assert_eq!(config.upstream.quota.hourly, vec!["hour_api_limit"]);
    }
}
