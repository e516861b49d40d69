//! Prescription lifecycle handlers: intake, listing, status changes, and
//! staff assignment.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use prescription_engine::{
    state, AssignmentService, FileReference, MedicineLine, PrescriptionService, StaffDirectory,
    SubmissionRequest, TransitionRequest,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::{
    self, PgAssignmentRepository, PgPrescriptionRepository, PgStaffDirectory,
};
use crate::error::{api_success, api_success_with_meta, ApiError, ApiResponse, ApiResult};
use crate::extract::ActorContext;
use crate::handlers::dto::{
    AssignmentSweepResponse, FileReferenceDto, MedicineLineDto, PrescriptionResponse,
};
use crate::server::PharmacareServer;
use crate::types::pagination::PaginationParams;
use crate::validation::RequestValidation;
use crate::{validate_field, validate_required};

/// New prescription submission
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitPrescriptionRequest {
    pub medicines: Vec<MedicineLineDto>,
    pub files: Vec<FileReferenceDto>,
    pub delivery_address: String,
}

impl RequestValidation for SubmitPrescriptionRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_field!(
            self.medicines,
            !self.medicines.is_empty(),
            "At least one medicine is required"
        );
        for line in &self.medicines {
            validate_required!(line.name, "Medicine name is required");
            validate_field!(
                line.quantity,
                line.quantity >= 1,
                "Medicine quantity must be at least 1"
            );
        }
        validate_field!(
            self.files,
            !self.files.is_empty(),
            "A prescription evidence file is required"
        );
        validate_required!(self.delivery_address, "Delivery address is required");
        Ok(())
    }
}

/// Requested status change with its side-effect payload
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StatusChangeRequest {
    /// pending -> processing
    PickUp,
    /// processing -> approved, priced by the approving pharmacist
    Approve { amount: Decimal },
    /// approved -> ready
    MarkReady,
    /// any non-terminal -> rejected
    Reject { reason: String },
    /// any non-terminal -> cancelled
    Cancel,
}

/// Manual staff assignment
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignStaffRequest {
    pub staff_id: Uuid,
}

/// Optional list filters
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PrescriptionListQuery {
    /// Filter by lifecycle status
    pub status: Option<String>,
    /// Filter by assigned staff member
    pub staff_id: Option<Uuid>,
}

/// Submit a new prescription
#[utoipa::path(
    post,
    path = "/api/v1/prescriptions",
    request_body = SubmitPrescriptionRequest,
    responses(
        (status = 201, description = "Prescription submitted", body = PrescriptionResponse),
        (status = 400, description = "Validation error")
    ),
    tag = "prescriptions"
)]
pub async fn submit_prescription(
    State(server): State<PharmacareServer>,
    actor: ActorContext,
    Json(request): Json<SubmitPrescriptionRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PrescriptionResponse>>)> {
    request.validate()?;

    let service = PrescriptionService::new(PgPrescriptionRepository::new(server.db_pool.clone()));
    let prescription = service
        .submit(SubmissionRequest {
            user_id: actor.user_id,
            medicines: request
                .medicines
                .into_iter()
                .map(MedicineLine::from)
                .collect(),
            files: request.files.into_iter().map(FileReference::from).collect(),
            delivery_address: request.delivery_address,
        })
        .await?;

    server.notify(
        "prescription.submitted",
        json!({
            "prescription_id": prescription.id,
            "user_id": prescription.user_id,
        }),
    );
    Ok((
        StatusCode::CREATED,
        Json(api_success(PrescriptionResponse::from(prescription))),
    ))
}

/// List prescriptions. Customers see their own; staff see everything and
/// may filter by status or assignee.
#[utoipa::path(
    get,
    path = "/api/v1/prescriptions",
    params(PaginationParams, PrescriptionListQuery),
    responses(
        (status = 200, description = "Prescriptions page", body = [PrescriptionResponse]),
        (status = 400, description = "Unknown status filter")
    ),
    tag = "prescriptions"
)]
pub async fn list_prescriptions(
    State(server): State<PharmacareServer>,
    actor: ActorContext,
    Query(pagination): Query<PaginationParams>,
    Query(query): Query<PrescriptionListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<PrescriptionResponse>>>> {
    if let Some(status) = &query.status {
        status
            .parse::<prescription_engine::PrescriptionStatus>()
            .map_err(|_| ApiError::validation(format!("Unknown status filter: {status}")))?;
    }

    let filter = db::PrescriptionFilter {
        owner: if actor.role.is_staff() {
            None
        } else {
            Some(actor.user_id)
        },
        status: query.status,
        assigned_staff_id: query.staff_id,
    };
    let (prescriptions, total) = db::list_prescriptions(
        &server.db_pool,
        &filter,
        pagination.limit(),
        pagination.offset(),
    )
    .await?;

    let data = prescriptions
        .into_iter()
        .map(PrescriptionResponse::from)
        .collect();
    Ok(Json(api_success_with_meta(
        data,
        pagination.to_metadata(total),
    )))
}

/// Fetch a single prescription
#[utoipa::path(
    get,
    path = "/api/v1/prescriptions/{prescription_id}",
    params(("prescription_id" = Uuid, Path, description = "Prescription id")),
    responses(
        (status = 200, description = "Prescription", body = PrescriptionResponse),
        (status = 404, description = "Unknown prescription")
    ),
    tag = "prescriptions"
)]
pub async fn get_prescription(
    State(server): State<PharmacareServer>,
    actor: ActorContext,
    Path(prescription_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<PrescriptionResponse>>> {
    let mut conn = server.db_pool.acquire().await?;
    let prescription = db::find_prescription(&mut conn, prescription_id)
        .await?
        .ok_or_else(|| ApiError::not_found("prescription"))?;

    // Foreign prescriptions look like they don't exist
    if !actor.role.is_staff() && prescription.user_id != actor.user_id {
        return Err(ApiError::not_found("prescription"));
    }
    Ok(Json(api_success(PrescriptionResponse::from(prescription))))
}

/// Change a prescription's status.
///
/// `cancel` is open to the owning customer; every other action is staff
/// only. The row is locked for the duration of the transition so racing
/// changes serialize instead of losing updates.
#[utoipa::path(
    put,
    path = "/api/v1/prescriptions/{prescription_id}/status",
    params(("prescription_id" = Uuid, Path, description = "Prescription id")),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Status changed", body = PrescriptionResponse),
        (status = 400, description = "Missing side-effect payload"),
        (status = 409, description = "Illegal transition")
    ),
    tag = "prescriptions"
)]
pub async fn change_prescription_status(
    State(server): State<PharmacareServer>,
    actor: ActorContext,
    Path(prescription_id): Path<Uuid>,
    Json(request): Json<StatusChangeRequest>,
) -> ApiResult<Json<ApiResponse<PrescriptionResponse>>> {
    let transition = match request {
        StatusChangeRequest::PickUp => {
            actor.require_staff()?;
            TransitionRequest::PickUp
        }
        StatusChangeRequest::Approve { amount } => {
            actor.require_staff()?;
            TransitionRequest::Approve {
                amount,
                approved_by: actor.user_id,
            }
        }
        StatusChangeRequest::MarkReady => {
            actor.require_staff()?;
            TransitionRequest::MarkReady
        }
        StatusChangeRequest::Reject { reason } => {
            actor.require_staff()?;
            TransitionRequest::Reject { reason }
        }
        StatusChangeRequest::Cancel => TransitionRequest::Cancel,
    };

    let mut tx = server.db_pool.begin().await?;
    let mut prescription = db::prescription_for_update(&mut tx, prescription_id)
        .await?
        .ok_or_else(|| ApiError::not_found("prescription"))?;

    if !actor.role.is_staff() && prescription.user_id != actor.user_id {
        return Err(ApiError::not_found("prescription"));
    }

    let from = prescription.status;
    state::apply_transition(&mut prescription, transition)?;
    db::update_prescription(&mut tx, &prescription).await?;
    tx.commit().await?;

    server.notify(
        "prescription.status_changed",
        json!({
            "prescription_id": prescription.id,
            "from": from.to_string(),
            "to": prescription.status.to_string(),
        }),
    );
    Ok(Json(api_success(PrescriptionResponse::from(prescription))))
}

/// Manually assign a prescription to a staff member. Last write wins.
#[utoipa::path(
    put,
    path = "/api/v1/prescriptions/{prescription_id}/assign",
    params(("prescription_id" = Uuid, Path, description = "Prescription id")),
    request_body = AssignStaffRequest,
    responses(
        (status = 200, description = "Prescription assigned", body = PrescriptionResponse),
        (status = 400, description = "Unknown staff member"),
        (status = 404, description = "Unknown prescription")
    ),
    tag = "prescriptions"
)]
pub async fn assign_prescription(
    State(server): State<PharmacareServer>,
    actor: ActorContext,
    Path(prescription_id): Path<Uuid>,
    Json(request): Json<AssignStaffRequest>,
) -> ApiResult<Json<ApiResponse<PrescriptionResponse>>> {
    actor.require_staff()?;

    let staff = PgStaffDirectory::new(server.db_pool.clone());
    let roster = staff.roster().await?;
    if !roster.iter().any(|member| member.id == request.staff_id) {
        return Err(ApiError::validation("Unknown staff member"));
    }

    let service = AssignmentService::new(
        PgAssignmentRepository::new(server.db_pool.clone()),
        staff,
    );
    service
        .reassign_prescription(prescription_id, request.staff_id, actor.user_id)
        .await?;

    let mut conn = server.db_pool.acquire().await?;
    let prescription = db::find_prescription(&mut conn, prescription_id)
        .await?
        .ok_or_else(|| ApiError::not_found("prescription"))?;
    Ok(Json(api_success(PrescriptionResponse::from(prescription))))
}

/// Distribute every unassigned prescription and complaint across the staff
/// roster round-robin.
#[utoipa::path(
    post,
    path = "/api/v1/prescriptions/assign-unassigned",
    responses(
        (status = 200, description = "Sweep complete", body = AssignmentSweepResponse),
        (status = 409, description = "No staff available")
    ),
    tag = "prescriptions"
)]
pub async fn assign_unassigned(
    State(server): State<PharmacareServer>,
    actor: ActorContext,
) -> ApiResult<Json<ApiResponse<AssignmentSweepResponse>>> {
    actor.require_staff()?;

    let service = AssignmentService::new(
        PgAssignmentRepository::new(server.db_pool.clone()),
        PgStaffDirectory::new(server.db_pool.clone()),
    );
    let sweep = service.assign_unassigned().await?;
    Ok(Json(api_success(AssignmentSweepResponse::from(sweep))))
}
