//! Authorization-code and refresh-token exchange.

use serde::Deserialize;
use std::sync::Arc;
use url::Url;

use crate::config::{CredentialConfig, OAuthConfig, VarSource};
use crate::error::{ProxyError, ProxyResult};
use crate::oauth::authorize::{build_authorize_url, generate_state, AuthorizeRedirect};
use crate::observability::metrics;
use crate::orchestrator::ProxiedResponse;
use crate::upstream::{UpstreamRequest, UpstreamTransport};

fn default_true() -> bool {
    true
}

/// Body of `POST /auth/exchange`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeRequest {
    pub code: String,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default = "default_true")]
    pub use_basic_auth: bool,
}

/// Body of `POST /auth/refresh`.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_true")]
    pub use_basic_auth: bool,
}

/// Stateless client of the upstream token endpoint.
pub struct TokenExchanger {
    transport: Arc<dyn UpstreamTransport>,
    vars: Arc<dyn VarSource>,
    oauth: OAuthConfig,
    credentials: CredentialConfig,
    authorize_endpoint: Url,
}

impl TokenExchanger {
    pub fn new(
        transport: Arc<dyn UpstreamTransport>,
        vars: Arc<dyn VarSource>,
        oauth: OAuthConfig,
        credentials: CredentialConfig,
    ) -> Result<Self, url::ParseError> {
        let authorize_endpoint = Url::parse(&oauth.authorize_url)?;
        Ok(Self {
            transport,
            vars,
            oauth,
            credentials,
            authorize_endpoint,
        })
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange(&self, request: ExchangeRequest) -> ProxyResult<ProxiedResponse> {
        let (client_id, client_secret) = self.client_credentials()?;
        let redirect_uri = request
            .redirect_uri
            .filter(|uri| !uri.trim().is_empty())
            .unwrap_or_else(|| self.oauth.redirect_uri.clone());

        let form = vec![
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("code".to_string(), request.code),
            ("redirect_uri".to_string(), redirect_uri),
            ("client_id".to_string(), client_id.clone()),
            ("client_secret".to_string(), client_secret.clone()),
        ];
        self.post_token("authorization_code", form, request.use_basic_auth, client_id, client_secret)
            .await
    }

    /// Trade a refresh token for a new access token.
    pub async fn refresh(&self, request: RefreshRequest) -> ProxyResult<ProxiedResponse> {
        let refresh_token = request
            .refresh_token
            .filter(|token| !token.trim().is_empty())
            .ok_or(ProxyError::MissingRefreshToken)?;
        let (client_id, client_secret) = self.client_credentials()?;

        let form = vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("refresh_token".to_string(), refresh_token),
            ("client_id".to_string(), client_id.clone()),
            ("client_secret".to_string(), client_secret.clone()),
        ];
        self.post_token("refresh_token", form, request.use_basic_auth, client_id, client_secret)
            .await
    }

    /// Build the provider authorization URL; a fresh state is generated when none is given.
    pub fn authorize_url(&self, state: Option<String>) -> ProxyResult<AuthorizeRedirect> {
        let client_id = self
            .vars
            .get(&self.credentials.client_id_var)
            .ok_or_else(|| ProxyError::MissingCredential(self.credentials.client_id_var.clone()))?;
        let state = state
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(generate_state);
        let url = build_authorize_url(
            &self.authorize_endpoint,
            &client_id,
            &self.oauth.redirect_uri,
            &self.oauth.scopes,
            &state,
        );
        Ok(AuthorizeRedirect { url, state })
    }

    /// Whether both client id and secret are currently available.
    pub fn has_client_credentials(&self) -> bool {
        self.client_credentials().is_ok()
    }

    fn client_credentials(&self) -> ProxyResult<(String, String)> {
        let id = self.vars.get(&self.credentials.client_id_var);
        let secret = self.vars.get(&self.credentials.client_secret_var);
        match (id, secret) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(ProxyError::MissingClientCredentials {
                id_var: self.credentials.client_id_var.clone(),
                secret_var: self.credentials.client_secret_var.clone(),
            }),
        }
    }

    async fn post_token(
        &self,
        grant: &'static str,
        form: Vec<(String, String)>,
        use_basic_auth: bool,
        client_id: String,
        client_secret: String,
    ) -> ProxyResult<ProxiedResponse> {
        let mut request = UpstreamRequest::post_form(self.oauth.token_url.clone(), form);
        if use_basic_auth {
            request = request.basic_auth(client_id, client_secret);
        }

        tracing::debug!(grant, basic_auth = use_basic_auth, "Requesting token");
        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                metrics::record_token_request(grant, 0);
                tracing::error!(grant, error = %err, "Token endpoint unreachable");
                return Err(err.into());
            }
        };
        metrics::record_token_request(grant, response.status);

        if response.is_error() {
            tracing::info!(grant, status = response.status, "Token request rejected");
            return Err(ProxyError::UpstreamRejected {
                status: response.status,
                body: response.error_detail(),
            });
        }

        Ok(ProxiedResponse {
            status: response.status,
            payload: response.payload(),
            cached: false,
        })
    }
}
