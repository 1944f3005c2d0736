//! Per-call request and response types.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::cache::CachedResponse;

/// Bearer token identifying the caller upstream.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Normalized query parameters, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl ToString) {
        self.0.insert(name.to_string(), value.to_string());
    }

    /// Insert only present values; blank strings count as absent.
    pub fn insert_opt<T: ToString>(&mut self, name: &str, value: Option<T>) {
        if let Some(value) = value {
            let value = value.to_string();
            if !value.trim().is_empty() {
                self.0.insert(name.to_string(), value.trim().to_string());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// One orchestration call.
#[derive(Debug, Clone)]
pub struct ProxiedRequest {
    pub params: QueryParams,
    pub credential: Option<Credential>,
}

impl ProxiedRequest {
    pub fn new(params: QueryParams, credential: Option<Credential>) -> Self {
        Self { params, credential }
    }
}

/// Payload returned to the caller, with the upstream status.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxiedResponse {
    pub status: u16,
    pub payload: Value,
    pub cached: bool,
}

impl From<CachedResponse> for ProxiedResponse {
    fn from(entry: CachedResponse) -> Self {
        Self {
            status: entry.status,
            payload: entry.payload,
            cached: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_opt_drops_absent_and_blank() {
        let mut params = QueryParams::new();
        params.insert_opt("status", Some("  "));
        params.insert_opt::<u32>("limit", None);
        params.insert_opt("offset", Some(0));
        params.insert_opt("order", Some(" desc "));

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("offset"), Some("0"));
        assert_eq!(params.get("order"), Some("desc"));
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let cred = Credential::new("super-secret");
        assert_eq!(format!("{:?}", cred), "Credential(***)");
    }
}
