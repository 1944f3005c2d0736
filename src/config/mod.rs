//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides: BASE_API_URL, ITEMS_CACHE_TTL_SECONDS, ...)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//!
//! Per request:
//!     vars.rs (VarSource) → access token / OAuth client credentials
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - Secrets never enter ProxyConfig; they are looked up by name at call time
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod vars;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CacheConfig, CredentialConfig, ListenerConfig, OAuthConfig, ObservabilityConfig, ProxyConfig,
    QuotaMarkers, ResourceConfig, TimeoutConfig, UpstreamConfig,
};
pub use vars::{ProcessEnv, StaticVars, VarSource};
