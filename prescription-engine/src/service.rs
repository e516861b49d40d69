//! Prescription intake and transition orchestration.

use chrono::Utc;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{FileReference, MedicineLine, PaymentStatus, Prescription};
use crate::repository::PrescriptionRepository;
use crate::state::{self, PrescriptionStatus, TransitionRequest};
use crate::{files, medicine};

/// Submission input assembled by the HTTP layer.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub user_id: Uuid,
    pub medicines: Vec<MedicineLine>,
    pub files: Vec<FileReference>,
    pub delivery_address: String,
}

/// Service owning prescription intake and the single transition entry point.
pub struct PrescriptionService<R> {
    prescriptions: R,
}

impl<R: PrescriptionRepository> PrescriptionService<R> {
    pub fn new(prescriptions: R) -> Self {
        Self { prescriptions }
    }

    /// Validate and persist a new prescription in `pending`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`] for a missing medicine list, evidence
    /// file, or delivery address.
    pub async fn submit(&self, request: SubmissionRequest) -> EngineResult<Prescription> {
        medicine::validate_lines(&request.medicines)?;
        files::require_evidence(&request.files)?;
        if request.delivery_address.trim().is_empty() {
            return Err(EngineError::validation("delivery address is required"));
        }

        let encoded = medicine::encode_lines(&request.medicines)?;
        let now = Utc::now();
        let prescription = Prescription {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            assigned_staff_id: None,
            medicine: encoded.medicine,
            quantity: encoded.quantity,
            medicines: request.medicines,
            amount: None,
            delivery_address: request.delivery_address,
            status: PrescriptionStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            primary_filename: files::primary_filename(&request.files),
            files: request.files,
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
        };

        self.prescriptions.insert(&prescription).await?;
        tracing::info!(
            prescription_id = %prescription.id,
            user_id = %prescription.user_id,
            quantity = prescription.quantity,
            "prescription submitted"
        );
        Ok(prescription)
    }

    /// Load, transition, and persist a prescription.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] for unknown ids; transition failures per
    /// [`state::apply_transition`].
    pub async fn transition(
        &self,
        prescription_id: Uuid,
        request: TransitionRequest,
    ) -> EngineResult<Prescription> {
        let mut prescription = self
            .prescriptions
            .find(prescription_id)
            .await?
            .ok_or_else(|| EngineError::not_found("prescription", prescription_id))?;

        state::apply_transition(&mut prescription, request)?;
        self.prescriptions.save(&prescription).await?;
        Ok(prescription)
    }
}
