//! Operational HTTP Endpoint
//!
//! Serves liveness, readiness, a JSON status report and Prometheus metrics
//! on the health port. No market data is served here.
//!
//! # Endpoints
//!
//! - `GET /health` - JSON status report
//! - `GET /healthz` - Liveness probe (plain `OK`)
//! - `GET /readyz` - Readiness probe (a non-empty catalog)
//! - `GET /metrics` - Prometheus text exposition

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::services::MarketDataService;
use crate::domain::market::MarketId;
use crate::domain::subscription::SubscriptionStats;
use crate::infrastructure::metrics::get_metrics_handle;

/// Content type of the Prometheus text format.
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

// =============================================================================
// Reports
// =============================================================================

/// Overall status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Markets loaded and trade streaming accepting subscriptions.
    Healthy,
    /// Markets loaded, trade streaming shut down.
    Degraded,
    /// No markets to serve.
    Unhealthy,
}

impl HealthStatus {
    /// Grade the simulator from its catalog size and streaming state.
    #[must_use]
    pub const fn assess(markets: usize, streaming: bool) -> Self {
        match (markets, streaming) {
            (0, _) => Self::Unhealthy,
            (_, true) => Self::Healthy,
            (_, false) => Self::Degraded,
        }
    }

    const fn http_status(self) -> StatusCode {
        match self {
            Self::Healthy | Self::Degraded => StatusCode::OK,
            Self::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// JSON body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Overall status.
    pub status: HealthStatus,
    /// Simulator version.
    pub version: String,
    /// Seconds since the endpoint state was created.
    pub uptime_secs: u64,
    /// Wall-clock time of the report.
    pub current_time: DateTime<Utc>,
    /// Markets in the catalog.
    pub markets: usize,
    /// Whether new trade subscriptions are accepted.
    pub streaming: bool,
    /// Markets with at least one live trade subscription.
    pub streaming_markets: Vec<MarketId>,
    /// Live trade subscription counts.
    pub subscriptions: SubscriptionStats,
}

/// JSON body of `GET /readyz`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReadinessReport {
    /// Whether the simulator can answer lookups.
    pub ready: bool,
    /// Markets in the catalog.
    pub markets: usize,
}

// =============================================================================
// State
// =============================================================================

/// Shared state behind the endpoint.
pub struct HealthServerState {
    version: String,
    started_at: Instant,
    service: Arc<MarketDataService>,
}

impl HealthServerState {
    /// Create endpoint state over `service`.
    #[must_use]
    pub fn new(version: String, service: Arc<MarketDataService>) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            service,
        }
    }

    /// Current status report.
    #[must_use]
    pub fn report(&self) -> HealthReport {
        let markets = self.service.catalog().len();
        let streaming = !self.service.is_shut_down();

        HealthReport {
            status: HealthStatus::assess(markets, streaming),
            version: self.version.clone(),
            uptime_secs: self.started_at.elapsed().as_secs(),
            current_time: Utc::now(),
            markets,
            streaming,
            streaming_markets: self.service.streaming_markets(),
            subscriptions: self.service.subscription_stats(),
        }
    }

    /// Current readiness.
    #[must_use]
    pub fn readiness(&self) -> ReadinessReport {
        let markets = self.service.catalog().len();
        ReadinessReport {
            ready: markets > 0,
            markets,
        }
    }
}

// =============================================================================
// Server
// =============================================================================

/// Operational HTTP server.
pub struct HealthServer {
    port: u16,
    state: Arc<HealthServerState>,
    cancel: CancellationToken,
}

impl HealthServer {
    /// Create a server for `port` that stops when `cancel` fires.
    #[must_use]
    pub const fn new(port: u16, state: Arc<HealthServerState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Routes served by the endpoint.
    #[must_use]
    pub fn router(state: Arc<HealthServerState>) -> Router {
        Router::new()
            .route("/health", get(report))
            .route("/healthz", get(live))
            .route("/readyz", get(ready))
            .route("/metrics", get(prometheus))
            .with_state(state)
    }

    /// Serve until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HealthServerError` if the port cannot be bound or the
    /// server fails while running.
    pub async fn run(self) -> Result<(), HealthServerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HealthServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(%addr, "Health endpoint listening");

        axum::serve(listener, Self::router(self.state))
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HealthServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Health endpoint stopped");
        Ok(())
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn report(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    let report = state.report();
    (report.status.http_status(), Json(report))
}

async fn live() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn ready(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    let readiness = state.readiness();
    let code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(readiness))
}

async fn prometheus() -> impl IntoResponse {
    match get_metrics_handle() {
        Some(handle) => (
            StatusCode::OK,
            [("content-type", PROMETHEUS_CONTENT_TYPE)],
            handle.render(),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [("content-type", "text/plain")],
            "Metrics not initialized".to_string(),
        ),
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Health endpoint errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::application::ports::NoOpTradeSink;

    #[test_case(12, true, HealthStatus::Healthy, "healthy" ; "streaming")]
    #[test_case(12, false, HealthStatus::Degraded, "degraded" ; "shut down")]
    #[test_case(0, true, HealthStatus::Unhealthy, "unhealthy" ; "empty catalog")]
    fn status_assessment(markets: usize, streaming: bool, expected: HealthStatus, json: &str) {
        let status = HealthStatus::assess(markets, streaming);
        assert_eq!(status, expected);
        assert_eq!(serde_json::to_value(status).unwrap(), json);
    }

    #[test]
    fn only_unhealthy_is_unavailable() {
        assert_eq!(HealthStatus::Healthy.http_status(), StatusCode::OK);
        assert_eq!(HealthStatus::Degraded.http_status(), StatusCode::OK);
        assert_eq!(
            HealthStatus::Unhealthy.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn report_follows_service_lifecycle() {
        let service = Arc::new(MarketDataService::standard());
        let state = HealthServerState::new("0.1.0".to_string(), Arc::clone(&service));

        let report = state.report();
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.markets, 12);
        assert!(report.streaming_markets.is_empty());
        assert_eq!(report.subscriptions, SubscriptionStats::default());

        service.shutdown();
        let report = state.report();
        assert_eq!(report.status, HealthStatus::Degraded);
        assert!(!report.streaming);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["subscriptions"]["active_subscriptions"], 0);
    }

    #[test]
    fn ready_with_standard_catalog() {
        let state = HealthServerState::new(
            "0.1.0".to_string(),
            Arc::new(MarketDataService::standard()),
        );

        let readiness = state.readiness();
        assert!(readiness.ready);
        assert_eq!(readiness.markets, 12);
    }

    #[tokio::test]
    async fn streaming_markets_are_reported() {
        let service = Arc::new(MarketDataService::standard());
        let state = HealthServerState::new("0.1.0".to_string(), Arc::clone(&service));

        let _subscription = service.subscribe_trades("MKT3", NoOpTradeSink);

        let report = state.report();
        assert_eq!(report.streaming_markets, vec![MarketId::new("MKT3")]);
        assert_eq!(report.subscriptions.active_subscriptions, 1);
    }
}
