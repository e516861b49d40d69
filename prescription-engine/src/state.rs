//! Prescription status state machine.
//!
//! This module is the single writer of `status`, approval metadata, and the
//! prescription-side tracking stamps. Every status change goes through
//! [`apply_transition`], which checks the transition table and enforces the
//! side effects each transition requires. Anything not in the table fails
//! with [`EngineError::StateTransition`].

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::Prescription;

/// Lifecycle state of a prescription.
///
/// Main line: pending -> processing -> approved -> ready -> dispatched ->
/// delivered -> completed. `rejected` and `cancelled` are terminal side
/// branches reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionStatus {
    Pending,
    Processing,
    Approved,
    Ready,
    Dispatched,
    Delivered,
    Completed,
    Rejected,
    Cancelled,
}

impl PrescriptionStatus {
    /// Terminal states admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Cancelled)
    }

    /// Transition table lookup. Side-effect requirements are enforced
    /// separately by [`apply_transition`].
    pub fn can_transition_to(self, target: PrescriptionStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match target {
            Self::Rejected | Self::Cancelled => true,
            Self::Processing => self == Self::Pending,
            Self::Approved => self == Self::Processing,
            Self::Ready => self == Self::Approved,
            Self::Dispatched => self == Self::Ready,
            Self::Delivered => self == Self::Dispatched,
            Self::Completed => self == Self::Delivered,
            Self::Pending => false,
        }
    }
}

impl fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Approved => "approved",
            Self::Ready => "ready",
            Self::Dispatched => "dispatched",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PrescriptionStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "approved" => Ok(Self::Approved),
            "ready" => Ok(Self::Ready),
            "dispatched" => Ok(Self::Dispatched),
            "delivered" => Ok(Self::Delivered),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::Repository(format!(
                "unknown prescription status: {other}"
            ))),
        }
    }
}

/// A requested status change together with its side-effect payload.
#[derive(Debug, Clone)]
pub enum TransitionRequest {
    /// pending -> processing: a pharmacist picked the prescription up
    PickUp,
    /// processing -> approved: prices the prescription and stamps the approver
    Approve { amount: Decimal, approved_by: Uuid },
    /// approved -> ready: the pharmacy prepared the item
    MarkReady,
    /// ready -> dispatched: hands the package to a courier
    Dispatch {
        tracking_number: String,
        courier_name: Option<String>,
    },
    /// dispatched -> delivered
    MarkDelivered,
    /// delivered -> completed: administrative close-out
    Complete,
    /// any non-terminal -> rejected
    Reject { reason: String },
    /// any non-terminal -> cancelled
    Cancel,
}

impl TransitionRequest {
    /// The status this request moves the prescription to.
    pub fn target(&self) -> PrescriptionStatus {
        match self {
            Self::PickUp => PrescriptionStatus::Processing,
            Self::Approve { .. } => PrescriptionStatus::Approved,
            Self::MarkReady => PrescriptionStatus::Ready,
            Self::Dispatch { .. } => PrescriptionStatus::Dispatched,
            Self::MarkDelivered => PrescriptionStatus::Delivered,
            Self::Complete => PrescriptionStatus::Completed,
            Self::Reject { .. } => PrescriptionStatus::Rejected,
            Self::Cancel => PrescriptionStatus::Cancelled,
        }
    }
}

/// Apply a status change to a prescription.
///
/// Checks the transition table first, then the side-effect requirements of
/// the specific transition:
/// - approve requires a positive amount and stamps `approved_by`/`approved_at`
/// - dispatch requires a non-empty tracking number and stamps `dispatched_at`
/// - deliver stamps `delivered_at`
/// - reject requires a non-blank reason
///
/// # Errors
///
/// [`EngineError::StateTransition`] for anything not in the table,
/// [`EngineError::Validation`] when a required side-effect payload is
/// missing or invalid.
pub fn apply_transition(
    prescription: &mut Prescription,
    request: TransitionRequest,
) -> EngineResult<()> {
    let from = prescription.status;
    let to = request.target();

    if !from.can_transition_to(to) {
        return Err(EngineError::StateTransition {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    let now = Utc::now();
    match request {
        TransitionRequest::Approve {
            amount,
            approved_by,
        } => {
            if amount <= Decimal::ZERO {
                return Err(EngineError::validation(
                    "approval amount must be greater than zero",
                ));
            }
            prescription.amount = Some(amount);
            prescription.approved_by = Some(approved_by);
            prescription.approved_at = Some(now);
        }
        TransitionRequest::Dispatch {
            tracking_number,
            courier_name,
        } => {
            if tracking_number.trim().is_empty() {
                return Err(EngineError::validation(
                    "tracking number is required for dispatch",
                ));
            }
            prescription.tracking_number = Some(tracking_number);
            prescription.courier_name = courier_name;
            prescription.dispatched_at = Some(now);
        }
        TransitionRequest::MarkDelivered => {
            prescription.delivered_at = Some(now);
        }
        TransitionRequest::Reject { reason } => {
            if reason.trim().is_empty() {
                return Err(EngineError::validation("rejection reason is required"));
            }
            prescription.rejection_reason = Some(reason);
        }
        TransitionRequest::PickUp
        | TransitionRequest::MarkReady
        | TransitionRequest::Complete
        | TransitionRequest::Cancel => {}
    }

    tracing::info!(
        prescription_id = %prescription.id,
        from = %from,
        to = %to,
        "prescription status transition"
    );

    prescription.status = to;
    prescription.updated_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentStatus, Prescription};

    fn pending_prescription() -> Prescription {
        let now = Utc::now();
        Prescription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            assigned_staff_id: None,
            medicines: vec![],
            medicine: "Amoxicillin".to_string(),
            quantity: 21,
            amount: None,
            delivery_address: "12 Harbour St".to_string(),
            status: PrescriptionStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            files: vec![],
            primary_filename: None,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            assigned_by: None,
            assigned_at: None,
            tracking_number: None,
            courier_name: None,
            dispatched_at: None,
            delivered_at: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_full_happy_path() {
        let mut p = pending_prescription();
        apply_transition(&mut p, TransitionRequest::PickUp).unwrap();
        apply_transition(
            &mut p,
            TransitionRequest::Approve {
                amount: Decimal::new(1599, 2),
                approved_by: Uuid::new_v4(),
            },
        )
        .unwrap();
        assert_eq!(p.status, PrescriptionStatus::Approved);
        assert_eq!(p.amount, Some(Decimal::new(1599, 2)));
        assert!(p.approved_at.is_some());
        assert!(p.approved_by.is_some());

        apply_transition(&mut p, TransitionRequest::MarkReady).unwrap();
        apply_transition(
            &mut p,
            TransitionRequest::Dispatch {
                tracking_number: "RM123456789GB".to_string(),
                courier_name: Some("Royal Mail".to_string()),
            },
        )
        .unwrap();
        assert_eq!(p.status, PrescriptionStatus::Dispatched);
        assert!(p.dispatched_at.is_some());

        apply_transition(&mut p, TransitionRequest::MarkDelivered).unwrap();
        assert!(p.delivered_at.is_some());
        apply_transition(&mut p, TransitionRequest::Complete).unwrap();
        assert_eq!(p.status, PrescriptionStatus::Completed);
    }

    #[test]
    fn test_pending_to_dispatched_is_illegal() {
        let mut p = pending_prescription();
        let err = apply_transition(
            &mut p,
            TransitionRequest::Dispatch {
                tracking_number: "RM123456789GB".to_string(),
                courier_name: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::StateTransition { .. }));
        assert_eq!(p.status, PrescriptionStatus::Pending);
        assert!(p.tracking_number.is_none());
    }

    #[test]
    fn test_approve_requires_positive_amount() {
        let mut p = pending_prescription();
        apply_transition(&mut p, TransitionRequest::PickUp).unwrap();
        let err = apply_transition(
            &mut p,
            TransitionRequest::Approve {
                amount: Decimal::ZERO,
                approved_by: Uuid::new_v4(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(p.status, PrescriptionStatus::Processing);
        assert!(p.amount.is_none());
    }

    #[test]
    fn test_dispatch_requires_tracking_number() {
        let mut p = pending_prescription();
        p.status = PrescriptionStatus::Ready;
        let err = apply_transition(
            &mut p,
            TransitionRequest::Dispatch {
                tracking_number: "  ".to_string(),
                courier_name: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(p.status, PrescriptionStatus::Ready);
    }

    #[test]
    fn test_reject_requires_reason() {
        let mut p = pending_prescription();
        let err = apply_transition(
            &mut p,
            TransitionRequest::Reject {
                reason: "".to_string(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        apply_transition(
            &mut p,
            TransitionRequest::Reject {
                reason: "illegible prescription image".to_string(),
            },
        )
        .unwrap();
        assert_eq!(p.status, PrescriptionStatus::Rejected);
        assert_eq!(
            p.rejection_reason.as_deref(),
            Some("illegible prescription image")
        );
    }

    #[test]
    fn test_reject_and_cancel_reachable_from_any_non_terminal() {
        for status in [
            PrescriptionStatus::Pending,
            PrescriptionStatus::Processing,
            PrescriptionStatus::Approved,
            PrescriptionStatus::Ready,
            PrescriptionStatus::Dispatched,
            PrescriptionStatus::Delivered,
        ] {
            assert!(status.can_transition_to(PrescriptionStatus::Rejected));
            assert!(status.can_transition_to(PrescriptionStatus::Cancelled));
        }
    }

    #[test]
    fn test_terminal_states_admit_no_transition() {
        for status in [
            PrescriptionStatus::Completed,
            PrescriptionStatus::Rejected,
            PrescriptionStatus::Cancelled,
        ] {
            let mut p = pending_prescription();
            p.status = status;
            let err = apply_transition(&mut p, TransitionRequest::Cancel).unwrap_err();
            assert!(matches!(err, EngineError::StateTransition { .. }));
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            PrescriptionStatus::Pending,
            PrescriptionStatus::Processing,
            PrescriptionStatus::Approved,
            PrescriptionStatus::Ready,
            PrescriptionStatus::Dispatched,
            PrescriptionStatus::Delivered,
            PrescriptionStatus::Completed,
            PrescriptionStatus::Rejected,
            PrescriptionStatus::Cancelled,
        ] {
            let parsed: PrescriptionStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }
}
