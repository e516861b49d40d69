//! Row structs and their conversions into domain types.

use chrono::{DateTime, Utc};
use prescription_engine::{
    medicine, Complaint, EngineError, FileReference, Order, Prescription, StaffMember,
};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub struct PrescriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub assigned_staff_id: Option<Uuid>,
    pub medicines: Option<serde_json::Value>,
    pub medicine: String,
    pub quantity: i32,
    pub amount: Option<Decimal>,
    pub delivery_address: String,
    pub status: String,
    pub payment_status: String,
    pub files: serde_json::Value,
    pub primary_filename: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub tracking_number: Option<String>,
    pub courier_name: Option<String>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PrescriptionRow> for Prescription {
    type Error = EngineError;

    fn try_from(row: PrescriptionRow) -> Result<Self, Self::Error> {
        // rows predating the list column carry only the legacy scalars
        let medicines_json = row.medicines.as_ref().map(ToString::to_string);
        let medicines =
            medicine::decode_stored(medicines_json.as_deref(), &row.medicine, row.quantity)?;
        let files: Vec<FileReference> = serde_json::from_value(row.files)
            .map_err(|e| EngineError::Repository(format!("malformed file list: {e}")))?;

        Ok(Prescription {
            id: row.id,
            user_id: row.user_id,
            assigned_staff_id: row.assigned_staff_id,
            medicines,
            medicine: row.medicine,
            quantity: row.quantity,
            amount: row.amount,
            delivery_address: row.delivery_address,
            status: row.status.parse()?,
            payment_status: row.payment_status.parse()?,
            files,
            primary_filename: row.primary_filename,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            rejection_reason: row.rejection_reason,
            assigned_by: row.assigned_by,
            assigned_at: row.assigned_at,
            tracking_number: row.tracking_number,
            courier_name: row.courier_name,
            dispatched_at: row.dispatched_at,
            delivered_at: row.delivered_at,
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub prescription_id: Uuid,
    pub payment_session_id: String,
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

impl TryFrom<OrderRow> for Order {
    type Error = EngineError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            order_number: row.order_number,
            prescription_id: row.prescription_id,
            payment_session_id: row.payment_session_id,
            total_amount: row.total_amount,
            delivery_address: row.delivery_address,
            status: row.status.parse()?,
            tracking_number: row.tracking_number,
            courier_name: row.courier_name,
            paid_at: row.paid_at,
            estimated_delivery: row.estimated_delivery,
            dispatched_at: row.dispatched_at,
            delivered_at: row.delivered_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct StaffRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StaffRow> for StaffMember {
    fn from(row: StaffRow) -> Self {
        StaffMember {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ComplaintRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub message: String,
    pub assigned_staff_id: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ComplaintRow> for Complaint {
    type Error = EngineError;

    fn try_from(row: ComplaintRow) -> Result<Self, Self::Error> {
        Ok(Complaint {
            id: row.id,
            user_id: row.user_id,
            subject: row.subject,
            message: row.message,
            assigned_staff_id: row.assigned_staff_id,
            assigned_by: row.assigned_by,
            assigned_at: row.assigned_at,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
