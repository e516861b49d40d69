//! Order fulfillment handlers.
//!
//! Dispatch, delivery, and completion move the order and its prescription
//! together in one transaction, locking the order row first and the
//! prescription row second.

use axum::extract::{Path, Query, State};
use axum::Json;
use prescription_engine::{fulfillment, state, EngineError, Prescription, TransitionRequest};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgConnection;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db;
use crate::error::{api_success, api_success_with_meta, ApiError, ApiResponse, ApiResult};
use crate::extract::ActorContext;
use crate::handlers::dto::OrderResponse;
use crate::server::PharmacareServer;
use crate::types::pagination::PaginationParams;
use crate::validation::RequestValidation;
use crate::{validate_field, validate_required};

/// Courier handoff details
#[derive(Debug, Deserialize, ToSchema)]
pub struct DispatchOrderRequest {
    pub tracking_number: String,
    pub courier_name: Option<String>,
}

impl RequestValidation for DispatchOrderRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.tracking_number, "Tracking number is required");
        Ok(())
    }
}

/// List orders. Customers see orders on their own prescriptions.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(PaginationParams),
    responses(
        (status = 200, description = "Orders page", body = [OrderResponse])
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(server): State<PharmacareServer>,
    actor: ActorContext,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Json<ApiResponse<Vec<OrderResponse>>>> {
    let owner = if actor.role.is_staff() {
        None
    } else {
        Some(actor.user_id)
    };
    let (orders, total) =
        db::list_orders(&server.db_pool, owner, pagination.limit(), pagination.offset()).await?;

    let data = orders.into_iter().map(OrderResponse::from).collect();
    Ok(Json(api_success_with_meta(
        data,
        pagination.to_metadata(total),
    )))
}

/// Fetch a single order
#[utoipa::path(
    get,
    path = "/api/v1/orders/{order_id}",
    params(("order_id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 404, description = "Unknown order")
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(server): State<PharmacareServer>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<OrderResponse>>> {
    let mut conn = server.db_pool.acquire().await?;
    let order = db::find_order(&mut conn, order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("order"))?;

    if !actor.role.is_staff() {
        let owns = db::find_prescription(&mut conn, order.prescription_id)
            .await?
            .is_some_and(|p| p.user_id == actor.user_id);
        if !owns {
            return Err(ApiError::not_found("order"));
        }
    }
    Ok(Json(api_success(OrderResponse::from(order))))
}

/// Record courier handoff on a confirmed order
#[utoipa::path(
    put,
    path = "/api/v1/orders/{order_id}/dispatch",
    params(("order_id" = Uuid, Path, description = "Order id")),
    request_body = DispatchOrderRequest,
    responses(
        (status = 200, description = "Order dispatched", body = OrderResponse),
        (status = 400, description = "Missing tracking number"),
        (status = 409, description = "Order not in confirmed state")
    ),
    tag = "orders"
)]
pub async fn dispatch_order(
    State(server): State<PharmacareServer>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
    Json(request): Json<DispatchOrderRequest>,
) -> ApiResult<Json<ApiResponse<OrderResponse>>> {
    actor.require_staff()?;
    request.validate()?;

    let mut tx = server.db_pool.begin().await?;
    let mut order = db::order_for_update(&mut tx, order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("order"))?;
    let mut prescription = locked_prescription(&mut tx, order.prescription_id).await?;

    fulfillment::dispatch(
        &mut order,
        &request.tracking_number,
        request.courier_name.as_deref(),
    )?;
    state::apply_transition(
        &mut prescription,
        TransitionRequest::Dispatch {
            tracking_number: request.tracking_number,
            courier_name: request.courier_name,
        },
    )?;

    db::update_order(&mut tx, &order).await?;
    db::update_prescription(&mut tx, &prescription).await?;
    tx.commit().await?;

    server.notify(
        "order.dispatched",
        json!({
            "order_id": order.id,
            "tracking_number": order.tracking_number,
        }),
    );
    Ok(Json(api_success(OrderResponse::from(order))))
}

/// Record delivery of a dispatched order
#[utoipa::path(
    put,
    path = "/api/v1/orders/{order_id}/deliver",
    params(("order_id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order delivered", body = OrderResponse),
        (status = 409, description = "Order not in dispatched state")
    ),
    tag = "orders"
)]
pub async fn deliver_order(
    State(server): State<PharmacareServer>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<OrderResponse>>> {
    actor.require_staff()?;

    let mut tx = server.db_pool.begin().await?;
    let mut order = db::order_for_update(&mut tx, order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("order"))?;
    let mut prescription = locked_prescription(&mut tx, order.prescription_id).await?;

    fulfillment::deliver(&mut order)?;
    state::apply_transition(&mut prescription, TransitionRequest::MarkDelivered)?;

    db::update_order(&mut tx, &order).await?;
    db::update_prescription(&mut tx, &prescription).await?;
    tx.commit().await?;

    server.notify("order.delivered", json!({ "order_id": order.id }));
    Ok(Json(api_success(OrderResponse::from(order))))
}

/// Administrative close-out of a delivered order
#[utoipa::path(
    put,
    path = "/api/v1/orders/{order_id}/complete",
    params(("order_id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order completed", body = OrderResponse),
        (status = 409, description = "Order not in delivered state")
    ),
    tag = "orders"
)]
pub async fn complete_order(
    State(server): State<PharmacareServer>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<OrderResponse>>> {
    actor.require_staff()?;

    let mut tx = server.db_pool.begin().await?;
    let mut order = db::order_for_update(&mut tx, order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("order"))?;
    let mut prescription = locked_prescription(&mut tx, order.prescription_id).await?;

    fulfillment::complete(&mut order)?;
    state::apply_transition(&mut prescription, TransitionRequest::Complete)?;

    db::update_order(&mut tx, &order).await?;
    db::update_prescription(&mut tx, &prescription).await?;
    tx.commit().await?;

    server.notify("order.completed", json!({ "order_id": order.id }));
    Ok(Json(api_success(OrderResponse::from(order))))
}

/// An order always points at an existing prescription; a missing one means
/// the data is corrupt, not that the caller got an id wrong.
async fn locked_prescription(
    conn: &mut PgConnection,
    prescription_id: Uuid,
) -> Result<Prescription, ApiError> {
    db::prescription_for_update(conn, prescription_id)
        .await?
        .ok_or_else(|| {
            ApiError::from(EngineError::Repository(format!(
                "order references missing prescription {prescription_id}"
            )))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_request_requires_tracking() {
        let blank = DispatchOrderRequest {
            tracking_number: "   ".to_string(),
            courier_name: None,
        };
        assert!(blank.validate().is_err());

        let ok = DispatchOrderRequest {
            tracking_number: "RM123456789GB".to_string(),
            courier_name: Some("Royal Mail".to_string()),
        };
        assert!(ok.validate().is_ok());
    }
}
