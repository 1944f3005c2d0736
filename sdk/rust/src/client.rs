//! Client for the storefront BFF HTTP API.

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_image_no: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrdersParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeBody {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    pub use_basic_auth: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub use_basic_auth: bool,
}

/// A BFF response, whatever its status.
#[derive(Debug, Clone)]
pub struct BffResponse {
    pub status: u16,
    /// Seconds from the `Retry-After` header, on 429s.
    pub retry_after: Option<u64>,
    pub request_id: Option<String>,
    /// JSON body, or `Value::Null` when the body was empty or not JSON.
    pub body: Value,
}

impl BffResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `detail` field of an error body.
    pub fn detail(&self) -> Option<&Value> {
        self.body.get("detail")
    }
}

pub struct BffClient {
    client: Client,
    base_url: String,
}

impl BffClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn root(&self) -> Result<BffResponse, reqwest::Error> {
        self.send(self.client.get(self.url("/"))).await
    }

    pub async fn health(&self) -> Result<BffResponse, reqwest::Error> {
        self.send(self.client.get(self.url("/health"))).await
    }

    pub async fn items(&self, params: &ItemsParams) -> Result<BffResponse, reqwest::Error> {
        self.send(self.client.get(self.url("/items")).query(params)).await
    }

    pub async fn orders(&self, params: &OrdersParams) -> Result<BffResponse, reqwest::Error> {
        self.send(self.client.get(self.url("/orders")).query(params)).await
    }

    /// `order_id` is optional so callers can observe the validation error.
    pub async fn order_detail(&self, order_id: Option<u64>) -> Result<BffResponse, reqwest::Error> {
        let mut request = self.client.get(self.url("/orders/detail"));
        if let Some(id) = order_id {
            request = request.query(&[("order_id", id)]);
        }
        self.send(request).await
    }

    pub async fn exchange(&self, body: &ExchangeBody) -> Result<BffResponse, reqwest::Error> {
        self.send(self.client.post(self.url("/auth/exchange")).json(body)).await
    }

    pub async fn refresh(&self, body: &RefreshBody) -> Result<BffResponse, reqwest::Error> {
        self.send(self.client.post(self.url("/auth/refresh")).json(body)).await
    }

    pub async fn callback(&self, code: Option<&str>, state: Option<&str>) -> Result<BffResponse, reqwest::Error> {
        let mut query = Vec::new();
        if let Some(code) = code {
            query.push(("code", code));
        }
        if let Some(state) = state {
            query.push(("state", state));
        }
        self.send(self.client.get(self.url("/callback")).query(&query)).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<BffResponse, reqwest::Error> {
        let resp = request.send().await?;
        let status = resp.status().as_u16();
        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        let request_id = resp
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let text = resp.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);

        Ok(BffResponse {
            status,
            retry_after,
            request_id,
            body,
        })
    }
}
