//! OAuth handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::Json;
use serde::Deserialize;

use crate::error::{ProxyError, ProxyResult};
use crate::http::handlers::query_rejection;
use crate::http::server::AppState;
use crate::oauth::{ExchangeRequest, RefreshRequest};
use crate::orchestrator::ProxiedResponse;

fn json_rejection(rejection: JsonRejection) -> ProxyError {
    ProxyError::invalid("body", rejection.body_text())
}

/// `POST /auth/exchange`
pub async fn exchange(
    State(state): State<AppState>,
    body: Result<Json<ExchangeRequest>, JsonRejection>,
) -> ProxyResult<ProxiedResponse> {
    let Json(request) = body.map_err(json_rejection)?;
    state.tokens.exchange(request).await
}

/// `POST /auth/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> ProxyResult<ProxiedResponse> {
    let Json(request) = body.map_err(json_rejection)?;
    state.tokens.refresh(request).await
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub state: Option<String>,
}

/// `GET /auth/authorize`: redirect the user to the provider's consent page.
pub async fn authorize(
    State(state): State<AppState>,
    query: Result<Query<AuthorizeQuery>, QueryRejection>,
) -> ProxyResult<Redirect> {
    let Query(query) = query.map_err(query_rejection)?;
    let redirect = state.tokens.authorize_url(query.state)?;
    Ok(Redirect::temporary(redirect.url.as_str()))
}
