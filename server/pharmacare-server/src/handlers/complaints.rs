//! Complaint intake and listing. Complaints share the round-robin
//! assignment sweep with prescriptions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use prescription_engine::{AssignmentService, Complaint, ComplaintStatus, StaffDirectory};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::{self, PgAssignmentRepository, PgStaffDirectory};
use crate::error::{api_success, api_success_with_meta, ApiError, ApiResponse, ApiResult};
use crate::extract::ActorContext;
use crate::handlers::dto::ComplaintResponse;
use crate::handlers::prescriptions::AssignStaffRequest;
use crate::server::PharmacareServer;
use crate::types::pagination::PaginationParams;
use crate::validation::RequestValidation;
use crate::{validate_field, validate_length, validate_required};

/// New complaint submission
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateComplaintRequest {
    pub subject: String,
    pub message: String,
}

impl RequestValidation for CreateComplaintRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.subject, "Subject is required");
        validate_length!(
            self.subject,
            1,
            200,
            "Subject must be between 1 and 200 characters"
        );
        validate_required!(self.message, "Message is required");
        Ok(())
    }
}

/// File a complaint
#[utoipa::path(
    post,
    path = "/api/v1/complaints",
    request_body = CreateComplaintRequest,
    responses(
        (status = 201, description = "Complaint filed", body = ComplaintResponse),
        (status = 400, description = "Validation error")
    ),
    tag = "complaints"
)]
pub async fn create_complaint(
    State(server): State<PharmacareServer>,
    actor: ActorContext,
    Json(request): Json<CreateComplaintRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ComplaintResponse>>)> {
    request.validate()?;

    let now = Utc::now();
    let complaint = Complaint {
        id: Uuid::new_v4(),
        user_id: actor.user_id,
        subject: request.subject,
        message: request.message,
        assigned_staff_id: None,
        assigned_by: None,
        assigned_at: None,
        status: ComplaintStatus::Open,
        created_at: now,
        updated_at: now,
    };

    let mut conn = server.db_pool.acquire().await?;
    db::insert_complaint(&mut conn, &complaint).await?;

    tracing::info!(
        complaint_id = %complaint.id,
        user_id = %complaint.user_id,
        "complaint filed"
    );
    Ok((
        StatusCode::CREATED,
        Json(api_success(ComplaintResponse::from(complaint))),
    ))
}

/// List complaints. Customers see their own; staff see everything.
#[utoipa::path(
    get,
    path = "/api/v1/complaints",
    params(PaginationParams),
    responses(
        (status = 200, description = "Complaints page", body = [ComplaintResponse])
    ),
    tag = "complaints"
)]
pub async fn list_complaints(
    State(server): State<PharmacareServer>,
    actor: ActorContext,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Json<ApiResponse<Vec<ComplaintResponse>>>> {
    let owner = if actor.role.is_staff() {
        None
    } else {
        Some(actor.user_id)
    };
    let (complaints, total) = db::list_complaints(
        &server.db_pool,
        owner,
        pagination.limit(),
        pagination.offset(),
    )
    .await?;

    let data = complaints.into_iter().map(ComplaintResponse::from).collect();
    Ok(Json(api_success_with_meta(
        data,
        pagination.to_metadata(total),
    )))
}

/// Manually assign a complaint to a staff member. Last write wins.
#[utoipa::path(
    put,
    path = "/api/v1/complaints/{complaint_id}/assign",
    params(("complaint_id" = Uuid, Path, description = "Complaint id")),
    request_body = AssignStaffRequest,
    responses(
        (status = 200, description = "Complaint assigned", body = ComplaintResponse),
        (status = 400, description = "Unknown staff member"),
        (status = 404, description = "Unknown complaint")
    ),
    tag = "complaints"
)]
pub async fn assign_complaint(
    State(server): State<PharmacareServer>,
    actor: ActorContext,
    Path(complaint_id): Path<Uuid>,
    Json(request): Json<AssignStaffRequest>,
) -> ApiResult<Json<ApiResponse<ComplaintResponse>>> {
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
        .reassign_complaint(complaint_id, request.staff_id, actor.user_id)
        .await?;

    let mut conn = server.db_pool.acquire().await?;
    let complaint = db::find_complaint(&mut conn, complaint_id)
        .await?
        .ok_or_else(|| ApiError::not_found("complaint"))?;
    Ok(Json(api_success(ComplaintResponse::from(complaint))))
}
