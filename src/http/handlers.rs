//! Resource and utility handlers.
//!
//! Handlers only extract and validate input; orchestration lives in
//! `crate::orchestrator`.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ProxyError, ProxyResult};
use crate::http::server::AppState;
use crate::orchestrator::{
    ItemsQuery, OrderDetailQuery, OrdersQuery, Orchestrator, ProxiedRequest, ProxiedResponse, ResourceQuery,
};

/// Convert a query extraction failure into a 400.
pub(crate) fn query_rejection(rejection: QueryRejection) -> ProxyError {
    ProxyError::invalid("query", rejection.body_text())
}

async fn proxy<Q: ResourceQuery>(
    state: &AppState,
    orchestrator: &Orchestrator,
    query: Result<Query<Q>, QueryRejection>,
) -> ProxyResult<ProxiedResponse> {
    let Query(query) = query.map_err(query_rejection)?;
    let params = query.into_params()?;
    orchestrator
        .serve(ProxiedRequest::new(params, state.credential()))
        .await
}

/// `GET /items`
pub async fn items(
    State(state): State<AppState>,
    query: Result<Query<ItemsQuery>, QueryRejection>,
) -> ProxyResult<ProxiedResponse> {
    proxy(&state, &state.items, query).await
}

/// `GET /orders`
pub async fn orders(
    State(state): State<AppState>,
    query: Result<Query<OrdersQuery>, QueryRejection>,
) -> ProxyResult<ProxiedResponse> {
    proxy(&state, &state.orders, query).await
}

/// `GET /orders/detail`
pub async fn order_detail(
    State(state): State<AppState>,
    query: Result<Query<OrderDetailQuery>, QueryRejection>,
) -> ProxyResult<ProxiedResponse> {
    proxy(&state, &state.order_detail, query).await
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// `GET /callback`: echo what the provider sent back.
pub async fn callback(query: Result<Query<CallbackQuery>, QueryRejection>) -> ProxyResult<Json<Value>> {
    let Query(query) = query.map_err(query_rejection)?;
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ProxyError::invalid("code", "missing 'code' query parameter"))?;

    tracing::info!(has_state = query.state.is_some(), "OAuth callback received");
    Ok(Json(json!({
        "received": true,
        "code": code,
        "state": query.state,
    })))
}

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "EC-LIVE storefront BFF is running" }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "upstream": state.config.upstream.base_url,
        "credentials": {
            "access_token": state.credential().is_some(),
            "client_credentials": state.tokens.has_client_credentials(),
        },
        "cache": {
            "items": state.items.cache().len(),
            "orders": state.orders.cache().len(),
        },
        "backoff": {
            "items": state.items.guard().active_count(),
            "orders": state.orders.guard().active_count(),
        },
    }))
}
