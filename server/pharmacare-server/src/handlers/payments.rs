//! Payment gate handlers: checkout initiation and the provider webhook.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use prescription_engine::{payment, PaymentGate, PaymentWebhook, WebhookStatus};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{self, PgOrderRepository, PgPrescriptionRepository};
use crate::error::{api_success, ApiError, ApiResponse, ApiResult};
use crate::extract::ActorContext;
use crate::handlers::dto::{OrderResponse, PaymentSessionResponse, PaymentWebhookRequest};
use crate::server::PharmacareServer;

/// Start a checkout session for a payable prescription.
///
/// Read-only: the prescription stays `approved/unpaid` until the provider
/// webhook confirms, so a customer can abandon and retry checkout freely.
#[utoipa::path(
    post,
    path = "/api/v1/prescriptions/{prescription_id}/payment",
    params(("prescription_id" = Uuid, Path, description = "Prescription id")),
    responses(
        (status = 200, description = "Checkout session created", body = PaymentSessionResponse),
        (status = 400, description = "Prescription not payable or provider failure"),
        (status = 404, description = "Unknown or foreign prescription")
    ),
    tag = "payments"
)]
pub async fn initiate_payment(
    State(server): State<PharmacareServer>,
    actor: ActorContext,
    Path(prescription_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<PaymentSessionResponse>>> {
    let gate = PaymentGate::new(
        PgPrescriptionRepository::new(server.db_pool.clone()),
        PgOrderRepository::new(server.db_pool.clone()),
        Arc::clone(&server.payment_client),
        server.config.fulfillment_policy(),
    );
    let session = gate
        .initiate(
            prescription_id,
            actor.user_id,
            &server.config.payment_success_url,
            &server.config.payment_cancel_url,
        )
        .await?;
    Ok(Json(api_success(PaymentSessionResponse::from(session))))
}

/// Consume a payment provider webhook.
///
/// Success marks the prescription paid and derives the order inside one
/// transaction, with the prescription row locked so a replayed webhook
/// racing the first either sees the existing order or trips the unique
/// session constraint. Replays return the existing order unchanged.
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/payment",
    request_body = PaymentWebhookRequest,
    responses(
        (status = 200, description = "Order for this payment", body = OrderResponse),
        (status = 400, description = "Declined or unpayable"),
        (status = 404, description = "Unknown prescription"),
        (status = 409, description = "Lost a webhook race; retry")
    ),
    tag = "payments"
)]
pub async fn payment_webhook(
    State(server): State<PharmacareServer>,
    Json(request): Json<PaymentWebhookRequest>,
) -> ApiResult<Json<ApiResponse<OrderResponse>>> {
    let webhook = PaymentWebhook::from(request);

    let mut tx = server.db_pool.begin().await?;
    if let Some(existing) = db::find_order_by_session(&mut tx, &webhook.session_id).await? {
        tracing::info!(
            session_id = %webhook.session_id,
            order_id = %existing.id,
            "payment webhook replayed; returning existing order"
        );
        return Ok(Json(api_success(OrderResponse::from(existing))));
    }

    if webhook.status == WebhookStatus::Failed {
        tracing::info!(
            session_id = %webhook.session_id,
            prescription_id = %webhook.prescription_id,
            "payment declined; prescription left payable"
        );
        return Err(ApiError::Payment {
            message: "Payment provider reported a decline".to_string(),
        });
    }

    let mut prescription = db::prescription_for_update(&mut tx, webhook.prescription_id)
        .await?
        .ok_or_else(|| ApiError::not_found("prescription"))?;

    let now = Utc::now();
    payment::mark_paid(&mut prescription, now)?;
    let order = payment::derive_order(
        &prescription,
        &webhook.session_id,
        now,
        &server.config.fulfillment_policy(),
    )?;

    db::update_prescription(&mut tx, &prescription).await?;
    db::insert_order(&mut tx, &order).await?;
    tx.commit().await?;

    tracing::info!(
        prescription_id = %prescription.id,
        order_id = %order.id,
        order_number = %order.order_number,
        total_amount = %order.total_amount,
        "order derived from paid prescription"
    );
    server.notify(
        "order.created",
        json!({
            "order_id": order.id,
            "order_number": order.order_number,
            "prescription_id": order.prescription_id,
        }),
    );
    Ok(Json(api_success(OrderResponse::from(order))))
}
