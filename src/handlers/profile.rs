//! Applicant profile handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::models::{ApiResponse, ApplicantProfile, CreateProfileRequest, UpdateProfileFields};
use crate::state::AppState;

/// POST /api/profiles
pub async fn create_profile(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(request): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ApplicantProfile>>), ApiError> {
    let profile = state
        .profile_service
        .create_profile(&user.actor(), request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(profile))))
}

/// GET /api/profiles/me
pub async fn my_profile(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ApplicantProfile>>, ApiError> {
    let profile = state
        .profile_service
        .get_profile(&user.actor(), user.account_id)
        .await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// GET /api/profiles/:account_id
pub async fn get_profile(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ApplicantProfile>>, ApiError> {
    let profile = state
        .profile_service
        .get_profile(&user.actor(), account_id)
        .await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// PATCH /api/profiles/me
pub async fn update_profile(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(fields): Json<UpdateProfileFields>,
) -> Result<Json<ApiResponse<ApplicantProfile>>, ApiError> {
    let profile = state
        .profile_service
        .update_profile(&user.actor(), fields)
        .await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// DELETE /api/profiles/me
pub async fn delete_profile(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.profile_service.delete_profile(&user.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/profiles (admin)
pub async fn list_profiles(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ApplicantProfile>>>, ApiError> {
    let profiles = state.profile_service.list_profiles().await?;
    Ok(Json(ApiResponse::ok(profiles)))
}
