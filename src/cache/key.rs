//! Deterministic cache keys.
//!
//! `<resource>|<credential>|name=value&name=value` with parameters sorted by
//! name. `QueryParams` is ordered, so logically equal parameter sets always
//! produce the same key no matter how they were assembled. Every component is
//! form-encoded, so separators inside values cannot merge distinct sets.

use std::fmt;
use url::form_urlencoded::byte_serialize;

use crate::orchestrator::QueryParams;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(resource: &str, credential: &str, params: &QueryParams) -> Self {
        let joined = params
            .iter()
            .map(|(name, value)| format!("{}={}", encode(name), encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        Self(format!("{}|{}|{}", encode(resource), encode(credential), joined))
    }
}

fn encode(component: &str) -> String {
    byte_serialize(component.as_bytes()).collect()
}

// Keys embed the credential; keep it out of logs.
impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resource = self.0.split('|').next().unwrap_or_default();
        write!(f, "CacheKey({}|***)", resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut a = QueryParams::new();
        a.insert("limit", 10);
        a.insert("offset", 20);
        a.insert("sort", "name");

        let mut b = QueryParams::new();
        b.insert("sort", "name");
        b.insert("offset", 20);
        b.insert("limit", 10);

        assert_eq!(CacheKey::new("items", "tok", &a), CacheKey::new("items", "tok", &b));
    }

    #[test]
    fn test_key_layout() {
        let mut params = QueryParams::new();
        params.insert("offset", 0);
        params.insert("limit", 5);
        params.insert_opt::<u32>("category_id", None);

        let key = CacheKey::new("orders", "tok", &params);
        assert_eq!(key.0, "orders|tok|limit=5&offset=0");
    }

    #[test]
    fn test_credential_and_resource_partition_keys() {
        let params = QueryParams::new();
        let base = CacheKey::new("items", "tok-a", &params);
        assert_ne!(base, CacheKey::new("items", "tok-b", &params));
        assert_ne!(base, CacheKey::new("orders", "tok-a", &params));
    }

    #[test]
    fn test_separators_inside_values_do_not_collide() {
        let mut split = QueryParams::new();
        split.insert("order", "a");
        split.insert("sort", "b");

        let mut smuggled = QueryParams::new();
        smuggled.insert("order", "a&sort=b");

        let a = CacheKey::new("items", "tok", &split);
        let b = CacheKey::new("items", "tok", &smuggled);
        assert_ne!(a, b);
        assert_eq!(b.0, "items|tok|order=a%26sort%3Db");

        assert_ne!(
            CacheKey::new("items", "a|b", &QueryParams::new()),
            CacheKey::new("items|a", "b", &QueryParams::new())
        );
    }

    #[test]
    fn test_debug_hides_credential() {
        let key = CacheKey::new("items", "secret-token", &QueryParams::new());
        let rendered = format!("{:?}", key);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("items"));
    }
}
