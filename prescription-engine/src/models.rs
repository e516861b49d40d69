use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::EngineError;
use crate::state::PrescriptionStatus;

/// One medicine line on a prescription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineLine {
    pub name: String,
    pub dosage: String,
    pub quantity: i32,
    #[serde(default)]
    pub instructions: String,
}

/// Payment state of a prescription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unpaid => write!(f, "unpaid"),
            Self::Paid => write!(f, "paid"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            other => Err(EngineError::Repository(format!(
                "unknown payment status: {other}"
            ))),
        }
    }
}

/// Reference to an uploaded evidence file, produced by the upload collaborator.
/// The engine never reads file bytes; type and size checks happen upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub url: String,
    pub declared_mime_type: String,
}

/// A customer request for one or more medicines, tracked through approval,
/// payment, and fulfillment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub assigned_staff_id: Option<Uuid>,
    pub medicines: Vec<MedicineLine>,
    /// Legacy scalar: first line's name
    pub medicine: String,
    /// Legacy scalar: sum of line quantities
    pub quantity: i32,
    /// Set only at approval; required before the prescription is payable
    pub amount: Option<Decimal>,
    pub delivery_address: String,
    pub status: PrescriptionStatus,
    pub payment_status: PaymentStatus,
    pub files: Vec<FileReference>,
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

/// Fulfillment state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Confirmed,
    Dispatched,
    Delivered,
    Completed,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirmed => write!(f, "confirmed"),
            Self::Dispatched => write!(f, "dispatched"),
            Self::Delivered => write!(f, "delivered"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "dispatched" => Ok(Self::Dispatched),
            "delivered" => Ok(Self::Delivered),
            "completed" => Ok(Self::Completed),
            other => Err(EngineError::Repository(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// Fulfillment record derived 1:1 from a paid prescription.
///
/// The payment-session id is the idempotency key: replayed webhooks find the
/// existing order instead of creating a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub prescription_id: Uuid,
    pub payment_session_id: String,
    /// Copied from the prescription at pay time, immutable thereafter
    pub total_amount: Decimal,
    pub delivery_address: String,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub courier_name: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A pharmacy employee who may be assigned prescriptions and complaints.
/// Created administratively; staff never self-register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Complaint state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintStatus {
    Open,
    Resolved,
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

impl FromStr for ComplaintStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "resolved" => Ok(Self::Resolved),
            other => Err(EngineError::Repository(format!(
                "unknown complaint status: {other}"
            ))),
        }
    }
}

/// Customer complaint, distributed across the staff roster alongside
/// prescriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub message: String,
    pub assigned_staff_id: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub status: ComplaintStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
