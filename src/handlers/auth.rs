//! Authentication handlers

use axum::{extract::State, http::StatusCode, Json};

use crate::error::ApiError;
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::models::{
    AccountResponse, ApiResponse, AuthTokenResponse, LoginRequest, RegisterRequest,
};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountResponse>>), ApiError> {
    let account = state.auth_service.register(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(account))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthTokenResponse>>, ApiError> {
    let token = state.auth_service.login(request).await?;
    Ok(Json(ApiResponse::ok(token)))
}

/// GET /api/auth/me
pub async fn me(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let account = state.auth_service.get_account(user.account_id).await?;
    Ok(Json(ApiResponse::ok(account.into())))
}

/// GET /api/auth/customers (admin)
pub async fn list_customers(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AccountResponse>>>, ApiError> {
    let customers = state.auth_service.list_customers().await?;
    Ok(Json(ApiResponse::ok(customers)))
}
