//! Health check handler.

use axum::Json;
use serde_json::{json, Value};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy")
    ),
    tag = "health"
)]
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "pharmacare-server",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
    }))
}

/// Version information endpoint
#[utoipa::path(
    get,
    path = "/health/version",
    responses(
        (status = 200, description = "Build version")
    ),
    tag = "health"
)]
pub async fn version() -> Json<Value> {
    Json(json!({
        "service": "pharmacare-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
