//! Health check handlers
//!
//! Provides health and readiness endpoints for monitoring and orchestration.

use axum::Json;
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status, always "healthy" while the process serves requests
    pub status: &'static str,
    /// Server version from Cargo.toml
    pub version: &'static str,
    /// Service name
    pub service: &'static str,
    /// Current time in RFC 3339
    pub timestamp: String,
}

/// GET /health - Health check endpoint
///
/// Used for monitoring and load balancer health checks. Liveness only;
/// whether a search snapshot is loaded is reported by /status.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "framefind-server",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Readiness response for Kubernetes
#[derive(Serialize)]
pub struct ReadyResponse {
    /// Whether the service is ready to accept traffic
    pub ready: bool,
}

/// GET /ready - Kubernetes readiness probe
///
/// Returns 200 as soon as the server is up. Unlike /health, this is a
/// simple yes/no check.
pub async fn ready() -> Json<ReadyResponse> {
    Json(ReadyResponse { ready: true })
}
