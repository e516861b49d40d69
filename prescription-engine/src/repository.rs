//! Narrow persistence contracts injected into the engine's services.
//!
//! Each service depends only on the reads and writes it actually performs,
//! so the domain logic stays testable against in-memory implementations and
//! the server crate supplies the Postgres-backed ones.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{Order, Prescription, StaffMember};

/// Read/write access to prescriptions.
#[async_trait]
pub trait PrescriptionRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> EngineResult<Option<Prescription>>;
    async fn insert(&self, prescription: &Prescription) -> EngineResult<()>;
    async fn save(&self, prescription: &Prescription) -> EngineResult<()>;
}

/// Read/write access to orders. `find_by_session` backs the webhook
/// idempotency check.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> EngineResult<Option<Order>>;
    async fn find_by_session(&self, payment_session_id: &str) -> EngineResult<Option<Order>>;
    async fn insert(&self, order: &Order) -> EngineResult<()>;
    async fn save(&self, order: &Order) -> EngineResult<()>;
}

/// Read-only view of the staff roster, in creation order.
#[async_trait]
pub trait StaffDirectory: Send + Sync {
    async fn roster(&self) -> EngineResult<Vec<StaffMember>>;
}

/// Assignment links for prescriptions and complaints. Writes are confined
/// to the assignment fields; `status` and `amount` are never touched here.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Unassigned prescription ids in creation order.
    async fn unassigned_prescriptions(&self) -> EngineResult<Vec<Uuid>>;
    /// Unassigned complaint ids in creation order.
    async fn unassigned_complaints(&self) -> EngineResult<Vec<Uuid>>;
    /// Link a prescription to a staff member, stamping `assigned_at` and the
    /// assigning actor when one is known.
    async fn assign_prescription(
        &self,
        prescription_id: Uuid,
        staff_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> EngineResult<()>;
    /// Link a complaint to a staff member.
    async fn assign_complaint(
        &self,
        complaint_id: Uuid,
        staff_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> EngineResult<()>;
}
