//! Environment variable lookup.
//!
//! Secrets are resolved through `VarSource` on every request instead of being
//! copied into `ProxyConfig`, so rotating a token in the environment takes
//! effect without a restart. Empty values count as unset.

use std::collections::HashMap;

/// Lookup of named variables.
pub trait VarSource: Send + Sync {
    /// Returns the value if set and non-empty.
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads the process environment at call time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl VarSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }
}

/// Fixed set of variables, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticVars {
    vars: HashMap<String, String>,
}

impl StaticVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl VarSource for StaticVars {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).filter(|v| !v.is_empty()).cloned()
    }
}
