//! Query parameter schemas for each proxied resource.
//!
//! Deserialization (via axum's `Query`) does the type checks; `into_params`
//! does the range checks and produces normalized `QueryParams`.

use serde::Deserialize;
use std::fmt::Display;

use crate::error::{ProxyError, ProxyResult};
use crate::orchestrator::request::QueryParams;

/// Conversion of a typed query into upstream parameters.
pub trait ResourceQuery {
    fn into_params(self) -> ProxyResult<QueryParams>;
}

/// `GET /items`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemsQuery {
    pub visible: Option<u8>,
    pub order: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub category_id: Option<u64>,
    pub max_image_no: Option<u32>,
    /// Comma-separated sizes (origin, 76, 146, 300, 500, 640, sp_480, sp_640).
    pub image_size: Option<String>,
}

impl ResourceQuery for ItemsQuery {
    fn into_params(self) -> ProxyResult<QueryParams> {
        check_range("visible", self.visible, 0, 1)?;
        check_range("limit", self.limit, 1, 100)?;
        check_range("category_id", self.category_id, 1, u64::MAX)?;
        check_range("max_image_no", self.max_image_no, 1, 20)?;

        let mut params = QueryParams::new();
        params.insert_opt("visible", self.visible);
        params.insert_opt("order", self.order);
        params.insert_opt("sort", self.sort);
        params.insert_opt("limit", self.limit);
        params.insert_opt("offset", self.offset);
        params.insert_opt("category_id", self.category_id);
        params.insert_opt("max_image_no", self.max_image_no);
        params.insert_opt("image_size", self.image_size);
        Ok(params)
    }
}

/// `GET /orders`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ResourceQuery for OrdersQuery {
    fn into_params(self) -> ProxyResult<QueryParams> {
        check_range("limit", self.limit, 1, 100)?;

        let mut params = QueryParams::new();
        params.insert_opt("status", self.status);
        params.insert_opt("limit", self.limit);
        params.insert_opt("offset", self.offset);
        Ok(params)
    }
}

/// `GET /orders/detail`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderDetailQuery {
    pub order_id: Option<u64>,
}

impl ResourceQuery for OrderDetailQuery {
    fn into_params(self) -> ProxyResult<QueryParams> {
        let order_id = self
            .order_id
            .ok_or_else(|| ProxyError::invalid("order_id", "is required"))?;
        check_range("order_id", Some(order_id), 1, u64::MAX)?;

        let mut params = QueryParams::new();
        params.insert("order_id", order_id);
        Ok(params)
    }
}

fn check_range<T>(field: &str, value: Option<T>, min: T, max: T) -> ProxyResult<()>
where
    T: PartialOrd + Display + Copy,
{
    match value {
        Some(v) if v < min || v > max => Err(ProxyError::invalid(
            field,
            format!("must be between {} and {}", min, max),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_ranges() {
        let query = ItemsQuery { limit: Some(101), ..Default::default() };
        assert!(matches!(
            query.into_params(),
            Err(ProxyError::InvalidParameter { field, .. }) if field == "limit"
        ));

        let query = ItemsQuery { visible: Some(2), ..Default::default() };
        assert!(query.into_params().is_err());

        let query = ItemsQuery { max_image_no: Some(0), ..Default::default() };
        assert!(query.into_params().is_err());

        let query = ItemsQuery { category_id: Some(0), ..Default::default() };
        assert!(query.into_params().is_err());
    }

    #[test]
    fn test_items_params_drop_nulls() {
        let query = ItemsQuery {
            visible: Some(1),
            limit: Some(10),
            offset: Some(0),
            image_size: Some("origin,76".into()),
            ..Default::default()
        };
        let params = query.into_params().unwrap();

        assert_eq!(params.len(), 4);
        assert_eq!(params.get("visible"), Some("1"));
        assert_eq!(params.get("offset"), Some("0"));
        assert_eq!(params.get("image_size"), Some("origin,76"));
        assert!(params.get("sort").is_none());
    }

    #[test]
    fn test_orders_params() {
        let query = OrdersQuery { status: Some("ordered".into()), limit: Some(5), offset: None };
        let params = query.into_params().unwrap();
        assert_eq!(params.get("status"), Some("ordered"));
        assert_eq!(params.get("limit"), Some("5"));

        let query = OrdersQuery { limit: Some(0), ..Default::default() };
        assert!(query.into_params().is_err());
    }

    #[test]
    fn test_order_detail_requires_positive_id() {
        assert!(matches!(
            OrderDetailQuery { order_id: None }.into_params(),
            Err(ProxyError::InvalidParameter { field, .. }) if field == "order_id"
        ));
        assert!(OrderDetailQuery { order_id: Some(0) }.into_params().is_err());

        let params = OrderDetailQuery { order_id: Some(123) }.into_params().unwrap();
        assert_eq!(params.get("order_id"), Some("123"));
    }
}
