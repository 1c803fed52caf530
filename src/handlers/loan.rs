//! Loan application handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::audit::AuditLogEntry;
use crate::error::ApiError;
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::models::{
    ApiResponse, CreateLoanRequest, ListLoansQuery, LoanApplication, SetLoanStatusRequest,
    UpdateLoanFields,
};
use crate::state::AppState;

/// POST /api/loans
pub async fn create_loan(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(request): Json<CreateLoanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LoanApplication>>), ApiError> {
    let loan = state
        .loan_service
        .create_application(&user.actor(), request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(loan))))
}

/// GET /api/loans (admin)
pub async fn list_loans(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ListLoansQuery>,
) -> Result<Json<ApiResponse<Vec<LoanApplication>>>, ApiError> {
    let loans = state.loan_service.list_applications(&query).await?;
    Ok(Json(ApiResponse::ok(loans)))
}

/// GET /api/loans/:id
pub async fn get_loan(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<ApiResponse<LoanApplication>>, ApiError> {
    let loan = state
        .loan_service
        .get_application(&user.actor(), loan_id)
        .await?;
    Ok(Json(ApiResponse::ok(loan)))
}

/// GET /api/loans/applicant/:id
pub async fn list_applicant_loans(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(applicant_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<LoanApplication>>>, ApiError> {
    let loans = state
        .loan_service
        .list_for_applicant(&user.actor(), applicant_id)
        .await?;
    Ok(Json(ApiResponse::ok(loans)))
}

/// PATCH /api/loans/:id
pub async fn update_loan(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(loan_id): Path<Uuid>,
    Json(fields): Json<UpdateLoanFields>,
) -> Result<Json<ApiResponse<LoanApplication>>, ApiError> {
    let loan = state
        .loan_service
        .update_fields(&user.actor(), loan_id, fields)
        .await?;
    Ok(Json(ApiResponse::ok(loan)))
}

/// PUT /api/loans/:id/status (admin)
pub async fn set_loan_status(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(loan_id): Path<Uuid>,
    Json(request): Json<SetLoanStatusRequest>,
) -> Result<Json<ApiResponse<LoanApplication>>, ApiError> {
    let loan = state
        .loan_service
        .set_status(&admin.actor(), loan_id, request.status)
        .await?;
    Ok(Json(ApiResponse::ok(loan)))
}

/// DELETE /api/loans/:id
pub async fn delete_loan(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(loan_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .loan_service
        .delete_application(&user.actor(), loan_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/loans/:id/audit (admin)
pub async fn loan_audit_trail(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<AuditLogEntry>>>, ApiError> {
    let entries = state.loan_service.audit_trail(loan_id).await?;
    Ok(Json(ApiResponse::ok(entries)))
}
