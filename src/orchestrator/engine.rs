//! The generic request orchestrator.
//!
//! One `Orchestrator` per resource composes the backoff guard, the response
//! cache, the upstream transport and error translation:
//!
//! ```text
//! credential? ──no──▶ MissingCredential
//!     │
//! guard blocked? ──yes──▶ RateLimited (upstream untouched)
//!     │
//! cache fresh? ──yes──▶ cached payload
//!     │
//! upstream call ──transport error──▶ UpstreamUnreachable
//!     │
//! status ≥ 400 ──rate limit──▶ record backoff, RateLimited
//!     │        └─otherwise──▶ UpstreamRejected(status, body)
//!     ▼
//! store in cache, return payload
//! ```
//!
//! A call performs one guard read, at most one cache read, and then at most
//! one of {guard write, cache write}. No lock is held across the upstream call.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::{CacheKey, ResponseCache};
use crate::clock::Clock;
use crate::error::{ProxyError, ProxyResult};
use crate::observability::metrics;
use crate::orchestrator::request::{Credential, ProxiedRequest, ProxiedResponse, QueryParams};
use crate::resilience::{backoff_for, BackoffGuard, GuardDecision, QuotaDetector};
use crate::upstream::{TransportError, UpstreamRequest, UpstreamResponse, UpstreamTransport};

/// Static description of a proxied resource.
#[derive(Debug, Clone)]
pub struct ResourceSettings {
    /// Short name used in cache keys, logs and metrics.
    pub name: String,
    /// Upstream path appended to the base URL (e.g. `/1/items`).
    pub path: String,
    /// Environment variable the credential comes from (for error messages).
    pub credential_var: String,
    /// Backoff used when the upstream rate-limits without saying for how long.
    pub default_backoff_secs: u64,
}

/// Classified result of one upstream call.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamOutcome {
    Success { status: u16, payload: Value },
    ClientError { status: u16, body: Value },
    RateLimited { retry_after_secs: u64, body: Value },
    TransportFailure(TransportError),
}

/// Guard → Cache → Upstream → translation, for one resource.
pub struct Orchestrator {
    settings: ResourceSettings,
    base_url: String,
    guard: Arc<BackoffGuard>,
    cache: Arc<ResponseCache>,
    transport: Arc<dyn UpstreamTransport>,
    detector: Arc<dyn QuotaDetector>,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    pub fn new(
        settings: ResourceSettings,
        base_url: impl Into<String>,
        guard: Arc<BackoffGuard>,
        cache: Arc<ResponseCache>,
        transport: Arc<dyn UpstreamTransport>,
        detector: Arc<dyn QuotaDetector>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            base_url: base_url.into(),
            guard,
            cache,
            transport,
            detector,
            clock,
        }
    }

    pub fn settings(&self) -> &ResourceSettings {
        &self.settings
    }

    pub fn guard(&self) -> &BackoffGuard {
        &self.guard
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Serve one proxied request.
    pub async fn serve(&self, request: ProxiedRequest) -> ProxyResult<ProxiedResponse> {
        let resource = self.settings.name.as_str();
        let ProxiedRequest { params, credential } = request;
        let credential = credential
            .ok_or_else(|| ProxyError::MissingCredential(self.settings.credential_var.clone()))?;

        if let GuardDecision::Blocked { retry_after_secs } = self.guard.check_allowed(credential.as_str()) {
            tracing::info!(resource, retry_after_secs, "Backing off, upstream not contacted");
            metrics::record_backoff_event(resource, "rejected");
            return Err(ProxyError::RateLimited {
                retry_after_secs,
                detail: json!({ "error": "rate_limited", "retry_after": retry_after_secs }),
            });
        }

        let cache_key = self
            .cache
            .is_enabled()
            .then(|| CacheKey::new(resource, credential.as_str(), &params));
        if let Some(key) = &cache_key {
            if let Some(hit) = self.cache.lookup(key) {
                tracing::debug!(resource, "Serving cached response");
                metrics::record_cache_lookup(resource, true);
                return Ok(hit.into());
            }
            metrics::record_cache_lookup(resource, false);
        }

        match self.call_upstream(&credential, &params).await {
            UpstreamOutcome::Success { status, payload } => {
                if let Some(key) = cache_key {
                    self.cache.store(key, status, payload.clone());
                }
                Ok(ProxiedResponse { status, payload, cached: false })
            }
            UpstreamOutcome::RateLimited { retry_after_secs, body } => {
                self.guard.record_backoff(credential.as_str(), retry_after_secs);
                tracing::warn!(resource, retry_after_secs, "Upstream rate limit, backoff recorded");
                metrics::record_backoff_event(resource, "recorded");
                Err(ProxyError::RateLimited { retry_after_secs, detail: body })
            }
            UpstreamOutcome::ClientError { status, body } => {
                tracing::info!(resource, status, "Upstream rejected request");
                Err(ProxyError::UpstreamRejected { status, body })
            }
            UpstreamOutcome::TransportFailure(err) => {
                tracing::error!(resource, error = %err, "Upstream unreachable");
                Err(ProxyError::UpstreamUnreachable(err))
            }
        }
    }

    async fn call_upstream(&self, credential: &Credential, params: &QueryParams) -> UpstreamOutcome {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), self.settings.path);
        let upstream_request = UpstreamRequest::get(url)
            .bearer(credential.as_str())
            .query(params.to_pairs());

        tracing::debug!(
            resource = %self.settings.name,
            params = params.len(),
            "Calling upstream"
        );

        let started = Instant::now();
        let result = self.transport.send(upstream_request).await;
        let elapsed = started.elapsed();

        match result {
            Ok(response) => {
                metrics::record_upstream(&self.settings.name, response.status, elapsed);
                self.classify(&response)
            }
            Err(err) => {
                metrics::record_upstream(&self.settings.name, 0, elapsed);
                UpstreamOutcome::TransportFailure(err)
            }
        }
    }

    /// Turn a response into an outcome, applying the backoff policy to errors.
    pub fn classify(&self, response: &UpstreamResponse) -> UpstreamOutcome {
        if !response.is_error() {
            return UpstreamOutcome::Success {
                status: response.status,
                payload: response.payload(),
            };
        }

        let parsed = response.parsed();
        let backoff = backoff_for(
            response,
            parsed.as_ref(),
            self.detector.as_ref(),
            self.clock.now(),
            self.settings.default_backoff_secs,
        );
        let body = parsed.unwrap_or_else(|| response.error_detail());

        match backoff {
            Some(retry_after_secs) => UpstreamOutcome::RateLimited { retry_after_secs, body },
            None => UpstreamOutcome::ClientError {
                status: response.status,
                body,
            },
        }
    }

    /// Cache TTL currently in force (zero when disabled).
    pub fn cache_ttl(&self) -> Duration {
        self.cache.ttl()
    }
}
