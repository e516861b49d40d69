//! Prescription lifecycle & fulfillment engine
//!
//! Governs a prescription from submission through pharmacist approval,
//! payment, dispatch, and delivery:
//! - Table-driven status transitions with gated side effects
//! - Medicine list encoding with legacy scalar compatibility
//! - Evidence-file requirement on submission
//! - Deterministic round-robin staff assignment for prescriptions and complaints
//! - Idempotent payment confirmation and order derivation
//! - Courier/tracking stamps on fulfillment
//!
//! Persistence and external collaborators (payment provider, notification
//! sink) are reached through the traits in [`repository`], [`payment`], and
//! [`notify`]; the server crate supplies the Postgres and HTTP-backed
//! implementations.

pub mod assignment;
pub mod error;
pub mod files;
pub mod fulfillment;
pub mod medicine;
pub mod models;
pub mod notify;
pub mod payment;
pub mod repository;
pub mod service;
pub mod state;

pub use assignment::{round_robin, AssignmentService, AssignmentSweep};
pub use error::{EngineError, EngineResult};
pub use models::{
    Complaint, ComplaintStatus, FileReference, MedicineLine, Order, OrderStatus, PaymentStatus,
    Prescription, StaffMember,
};
pub use notify::{NotificationSink, NullNotifier};
pub use payment::{
    is_payable, FulfillmentPolicy, PaymentGate, PaymentProvider, PaymentSession,
    PaymentSessionRequest, PaymentWebhook, WebhookStatus,
};
pub use repository::{
    AssignmentRepository, OrderRepository, PrescriptionRepository, StaffDirectory,
};
pub use service::{PrescriptionService, SubmissionRequest};
pub use state::{apply_transition, PrescriptionStatus, TransitionRequest};
