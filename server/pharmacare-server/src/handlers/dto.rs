//! Wire-facing request/response types.
//!
//! Domain types stay inside the engine crate; everything serialized over
//! HTTP goes through these mirrors so the OpenAPI document and the wire
//! format can evolve without touching domain code.

use chrono::{DateTime, Utc};
use prescription_engine::{
    AssignmentSweep, Complaint, FileReference, MedicineLine, Order, PaymentSession,
    PaymentWebhook, Prescription, WebhookStatus,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One medicine line as submitted and echoed back
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MedicineLineDto {
    pub name: String,
    pub dosage: String,
    pub quantity: i32,
    #[serde(default)]
    pub instructions: String,
}

impl From<MedicineLine> for MedicineLineDto {
    fn from(line: MedicineLine) -> Self {
        Self {
            name: line.name,
            dosage: line.dosage,
            quantity: line.quantity,
            instructions: line.instructions,
        }
    }
}

impl From<MedicineLineDto> for MedicineLine {
    fn from(dto: MedicineLineDto) -> Self {
        Self {
            name: dto.name,
            dosage: dto.dosage,
            quantity: dto.quantity,
            instructions: dto.instructions,
        }
    }
}

/// Uploaded evidence file reference
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileReferenceDto {
    pub url: String,
    pub declared_mime_type: String,
}

impl From<FileReference> for FileReferenceDto {
    fn from(file: FileReference) -> Self {
        Self {
            url: file.url,
            declared_mime_type: file.declared_mime_type,
        }
    }
}

impl From<FileReferenceDto> for FileReference {
    fn from(dto: FileReferenceDto) -> Self {
        Self {
            url: dto.url,
            declared_mime_type: dto.declared_mime_type,
        }
    }
}

/// Full prescription view returned by every prescription endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrescriptionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub assigned_staff_id: Option<Uuid>,
    pub medicines: Vec<MedicineLineDto>,
    pub total_quantity: i32,
    pub amount: Option<Decimal>,
    pub delivery_address: String,
    pub status: String,
    pub payment_status: String,
    pub files: Vec<FileReferenceDto>,
    pub primary_filename: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub tracking_number: Option<String>,
    pub courier_name: Option<String>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Prescription> for PrescriptionResponse {
    fn from(p: Prescription) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            assigned_staff_id: p.assigned_staff_id,
            total_quantity: p.quantity,
            medicines: p.medicines.into_iter().map(MedicineLineDto::from).collect(),
            amount: p.amount,
            delivery_address: p.delivery_address,
            status: p.status.to_string(),
            payment_status: p.payment_status.to_string(),
            files: p.files.into_iter().map(FileReferenceDto::from).collect(),
            primary_filename: p.primary_filename,
            approved_by: p.approved_by,
            approved_at: p.approved_at,
            rejection_reason: p.rejection_reason,
            tracking_number: p.tracking_number,
            courier_name: p.courier_name,
            dispatched_at: p.dispatched_at,
            delivered_at: p.delivered_at,
            paid_at: p.paid_at,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Order view returned by order endpoints and the payment webhook
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub prescription_id: Uuid,
    pub total_amount: Decimal,
    pub delivery_address: String,
    pub status: String,
    pub tracking_number: Option<String>,
    pub courier_name: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            order_number: o.order_number,
            prescription_id: o.prescription_id,
            total_amount: o.total_amount,
            delivery_address: o.delivery_address,
            status: o.status.to_string(),
            tracking_number: o.tracking_number,
            courier_name: o.courier_name,
            paid_at: o.paid_at,
            estimated_delivery: o.estimated_delivery,
            dispatched_at: o.dispatched_at,
            delivered_at: o.delivered_at,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

/// Complaint view
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ComplaintResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub message: String,
    pub assigned_staff_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Complaint> for ComplaintResponse {
    fn from(c: Complaint) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            subject: c.subject,
            message: c.message,
            assigned_staff_id: c.assigned_staff_id,
            status: c.status.to_string(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Checkout handle handed back to the customer for redirection
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentSessionResponse {
    pub session_id: String,
    pub redirect_url: String,
}

impl From<PaymentSession> for PaymentSessionResponse {
    fn from(session: PaymentSession) -> Self {
        Self {
            session_id: session.session_id,
            redirect_url: session.redirect_url,
        }
    }
}

/// Payment provider webhook payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentWebhookRequest {
    pub session_id: String,
    pub prescription_id: Uuid,
    pub status: WebhookStatusDto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatusDto {
    Succeeded,
    Failed,
}

impl From<PaymentWebhookRequest> for PaymentWebhook {
    fn from(request: PaymentWebhookRequest) -> Self {
        Self {
            session_id: request.session_id,
            prescription_id: request.prescription_id,
            status: match request.status {
                WebhookStatusDto::Succeeded => WebhookStatus::Succeeded,
                WebhookStatusDto::Failed => WebhookStatus::Failed,
            },
        }
    }
}

/// Counts reported by an assignment sweep
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentSweepResponse {
    pub prescriptions_assigned: usize,
    pub complaints_assigned: usize,
}

impl From<AssignmentSweep> for AssignmentSweepResponse {
    fn from(sweep: AssignmentSweep) -> Self {
        Self {
            prescriptions_assigned: sweep.prescriptions,
            complaints_assigned: sweep.complaints,
        }
    }
}
