//! Infrastructure Layer - Adapters and external integrations.
//!
//! Process-level concerns around the simulation engine: configuration,
//! logging, metrics and the operational HTTP endpoint.

/// Configuration loading.
pub mod config;

/// Health check HTTP endpoint.
pub mod health;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// OpenTelemetry tracing integration.
pub mod telemetry;
