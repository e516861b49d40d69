//! Route definitions for the PharmaCare API.
//!
//! Grouped by resource; each group returns a `Router` that `create_app`
//! merges and equips with the shared server state.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers;
use crate::server::PharmacareServer;

/// Route path constants
pub mod paths {
    pub const HEALTH: &str = "/health";
    pub const HEALTH_VERSION: &str = "/health/version";

    pub const PRESCRIPTIONS: &str = "/api/v1/prescriptions";
    pub const PRESCRIPTION_BY_ID: &str = "/api/v1/prescriptions/:prescription_id";
    pub const PRESCRIPTION_STATUS: &str = "/api/v1/prescriptions/:prescription_id/status";
    pub const PRESCRIPTION_ASSIGN: &str = "/api/v1/prescriptions/:prescription_id/assign";
    pub const PRESCRIPTIONS_ASSIGN_UNASSIGNED: &str = "/api/v1/prescriptions/assign-unassigned";
    pub const PRESCRIPTION_PAYMENT: &str = "/api/v1/prescriptions/:prescription_id/payment";

    pub const PAYMENT_WEBHOOK: &str = "/api/v1/webhooks/payment";

    pub const ORDERS: &str = "/api/v1/orders";
    pub const ORDER_BY_ID: &str = "/api/v1/orders/:order_id";
    pub const ORDER_DISPATCH: &str = "/api/v1/orders/:order_id/dispatch";
    pub const ORDER_DELIVER: &str = "/api/v1/orders/:order_id/deliver";
    pub const ORDER_COMPLETE: &str = "/api/v1/orders/:order_id/complete";

    pub const COMPLAINTS: &str = "/api/v1/complaints";
    pub const COMPLAINT_ASSIGN: &str = "/api/v1/complaints/:complaint_id/assign";
}

/// Health check routes
pub fn health_routes() -> Router<PharmacareServer> {
    Router::new()
        .route(paths::HEALTH, get(handlers::health::health_check))
        .route(paths::HEALTH_VERSION, get(handlers::health::version))
}

/// Prescription lifecycle routes
pub fn prescription_routes() -> Router<PharmacareServer> {
    Router::new()
        .route(
            paths::PRESCRIPTIONS,
            post(handlers::prescriptions::submit_prescription)
                .get(handlers::prescriptions::list_prescriptions),
        )
        .route(
            paths::PRESCRIPTIONS_ASSIGN_UNASSIGNED,
            post(handlers::prescriptions::assign_unassigned),
        )
        .route(
            paths::PRESCRIPTION_BY_ID,
            get(handlers::prescriptions::get_prescription),
        )
        .route(
            paths::PRESCRIPTION_STATUS,
            put(handlers::prescriptions::change_prescription_status),
        )
        .route(
            paths::PRESCRIPTION_ASSIGN,
            put(handlers::prescriptions::assign_prescription),
        )
        .route(
            paths::PRESCRIPTION_PAYMENT,
            post(handlers::payments::initiate_payment),
        )
}

/// Payment provider webhook routes
pub fn webhook_routes() -> Router<PharmacareServer> {
    Router::new().route(paths::PAYMENT_WEBHOOK, post(handlers::payments::payment_webhook))
}

/// Order fulfillment routes
pub fn order_routes() -> Router<PharmacareServer> {
    Router::new()
        .route(paths::ORDERS, get(handlers::orders::list_orders))
        .route(paths::ORDER_BY_ID, get(handlers::orders::get_order))
        .route(paths::ORDER_DISPATCH, put(handlers::orders::dispatch_order))
        .route(paths::ORDER_DELIVER, put(handlers::orders::deliver_order))
        .route(paths::ORDER_COMPLETE, put(handlers::orders::complete_order))
}

/// Complaint routes
pub fn complaint_routes() -> Router<PharmacareServer> {
    Router::new()
        .route(
            paths::COMPLAINTS,
            post(handlers::complaints::create_complaint)
                .get(handlers::complaints::list_complaints),
        )
        .route(
            paths::COMPLAINT_ASSIGN,
            put(handlers::complaints::assign_complaint),
        )
}
