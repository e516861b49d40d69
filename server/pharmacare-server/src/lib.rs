//! PharmaCare server: HTTP surface over the prescription engine.
//!
//! Routing, request validation, Postgres persistence, the payment provider
//! client, and notification delivery live here; all lifecycle rules live in
//! the `prescription-engine` crate.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod integrations;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod types;
pub mod validation;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResponse, ApiResult};
pub use server::PharmacareServer;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router with all routes and middleware.
pub fn create_app(server: PharmacareServer) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::prescription_routes())
        .merge(routes::webhook_routes())
        .merge(routes::order_routes())
        .merge(routes::complaint_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(server)
}
