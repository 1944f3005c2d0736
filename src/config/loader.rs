//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::config::vars::VarSource;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { name: String, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { name, value } => {
                write!(f, "Environment variable {} has invalid value '{}'", name, value)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration: optional TOML file, then environment overrides, then validation.
pub fn load_config(path: Option<&Path>, vars: &dyn VarSource) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, vars)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay well-known environment variables onto a parsed config.
///
/// Orders settings fall back to the items variables when their own are unset.
pub fn apply_env_overrides(config: &mut ProxyConfig, vars: &dyn VarSource) -> Result<(), ConfigError> {
    if let Some(v) = vars.get("BASE_API_URL") {
        config.upstream.base_url = v;
    }
    if let Some(v) = vars.get("BASE_OAUTH_TOKEN_URL") {
        config.oauth.token_url = v;
    }
    if let Some(v) = vars.get("BASE_OAUTH_AUTHORIZE_URL") {
        config.oauth.authorize_url = v;
    }
    if let Some(v) = vars.get("BASE_REDIRECT_URI") {
        config.oauth.redirect_uri = v;
    }
    if let Some(v) = vars.get("BFF_BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = vars.get("BFF_LOG_LEVEL") {
        config.observability.log_level = v;
    }

    if let Some(ttl) = parse_var::<u64>(vars, &["ITEMS_CACHE_TTL_SECONDS"])? {
        config.items.cache_ttl_secs = ttl;
    }
    if let Some(secs) = parse_var::<u64>(vars, &["ITEMS_DEFAULT_BACKOFF_SECONDS"])? {
        config.items.default_backoff_secs = secs;
    }
    if let Some(ttl) = parse_var::<u64>(vars, &["ORDERS_CACHE_TTL_SECONDS", "ITEMS_CACHE_TTL_SECONDS"])? {
        config.orders.cache_ttl_secs = ttl;
    }
    if let Some(secs) = parse_var::<u64>(
        vars,
        &["ORDERS_DEFAULT_BACKOFF_SECONDS", "ITEMS_DEFAULT_BACKOFF_SECONDS"],
    )? {
        config.orders.default_backoff_secs = secs;
    }

    Ok(())
}

/// Parse the first set variable out of `names`.
fn parse_var<T: FromStr>(vars: &dyn VarSource, names: &[&str]) -> Result<Option<T>, ConfigError> {
    for name in names {
        if let Some(value) = vars.get(name) {
            return value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::Env {
                    name: (*name).to_string(),
                    value,
                });
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::vars::StaticVars;

    #[test]
    fn test_env_overrides_apply() {
        let vars = StaticVars::new()
            .with("BASE_API_URL", "http://127.0.0.1:1234")
            .with("BASE_REDIRECT_URI", "https://app.example.com/callback")
            .with("ITEMS_CACHE_TTL_SECONDS", "10")
            .with("ITEMS_DEFAULT_BACKOFF_SECONDS", "90");

        let config = load_config(None, &vars).unwrap();

        assert_eq!(config.upstream.base_url, "http://127.0.0.1:1234");
        assert_eq!(config.oauth.redirect_uri, "https://app.example.com/callback");
        assert_eq!(config.items.cache_ttl_secs, 10);
        // Orders inherit the items values when their own are unset.
        assert_eq!(config.orders.cache_ttl_secs, 10);
        assert_eq!(config.orders.default_backoff_secs, 90);
    }

    #[test]
    fn test_orders_vars_take_precedence() {
        let vars = StaticVars::new()
            .with("ITEMS_CACHE_TTL_SECONDS", "10")
            .with("ORDERS_CACHE_TTL_SECONDS", "3");

        let config = load_config(None, &vars).unwrap();
        assert_eq!(config.items.cache_ttl_secs, 10);
        assert_eq!(config.orders.cache_ttl_secs, 3);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let vars = StaticVars::new().with("ITEMS_CACHE_TTL_SECONDS", "soon");

        match load_config(None, &vars) {
            Err(ConfigError::Env { name, .. }) => assert_eq!(name, "ITEMS_CACHE_TTL_SECONDS"),
            other => panic!("expected env error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_runs_after_overrides() {
        let vars = StaticVars::new().with("BASE_API_URL", "not a url");

        assert!(matches!(
            load_config(None, &vars),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let vars = StaticVars::new();
        let result = load_config(Some(Path::new("does-not-exist.toml")), &vars);
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
