//! OpenAPI document for the PharmaCare API.

use utoipa::OpenApi;

use crate::handlers;
use crate::handlers::dto;
use crate::types::pagination::PaginationParams;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PharmaCare API",
        description = "Prescription lifecycle, payment, and fulfillment engine",
        license(name = "AGPL-3.0-only")
    ),
    paths(
        handlers::health::health_check,
        handlers::health::version,
        handlers::prescriptions::submit_prescription,
        handlers::prescriptions::list_prescriptions,
        handlers::prescriptions::get_prescription,
        handlers::prescriptions::change_prescription_status,
        handlers::prescriptions::assign_prescription,
        handlers::prescriptions::assign_unassigned,
        handlers::payments::initiate_payment,
        handlers::payments::payment_webhook,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::dispatch_order,
        handlers::orders::deliver_order,
        handlers::orders::complete_order,
        handlers::complaints::create_complaint,
        handlers::complaints::list_complaints,
        handlers::complaints::assign_complaint,
    ),
    components(schemas(
        dto::MedicineLineDto,
        dto::FileReferenceDto,
        dto::PrescriptionResponse,
        dto::OrderResponse,
        dto::ComplaintResponse,
        dto::PaymentSessionResponse,
        dto::PaymentWebhookRequest,
        dto::WebhookStatusDto,
        dto::AssignmentSweepResponse,
        handlers::prescriptions::SubmitPrescriptionRequest,
        handlers::prescriptions::StatusChangeRequest,
        handlers::prescriptions::AssignStaffRequest,
        handlers::orders::DispatchOrderRequest,
        handlers::complaints::CreateComplaintRequest,
        PaginationParams,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "prescriptions", description = "Prescription lifecycle"),
        (name = "payments", description = "Checkout and webhooks"),
        (name = "orders", description = "Order fulfillment"),
        (name = "complaints", description = "Customer complaints")
    )
)]
pub struct ApiDoc;
