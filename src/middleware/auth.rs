//! Authentication middleware
//!
//! Extractors that verify the Bearer JWT and surface the acting identity.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{verify_token, AuthService, JwtError};
use crate::models::{AccountRole, Actor};

/// Authenticated account extracted from the JWT token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub account_id: Uuid,
    pub email: String,
    pub role: AccountRole,
}

impl AuthenticatedUser {
    /// The identity handed to the service layer
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.account_id,
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Error response for authentication failures
#[derive(Debug, Serialize)]
struct AuthErrorBody {
    error: AuthErrorDetails,
}

#[derive(Debug, Serialize)]
struct AuthErrorDetails {
    code: String,
    message: String,
}

struct AuthRejection {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
}

impl AuthRejection {
    fn unauthorized(code: &'static str, message: &'static str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code,
            message,
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = AuthErrorBody {
            error: AuthErrorDetails {
                code: self.code.to_string(),
                message: self.message.to_string(),
            },
        };
        (self.status, Json(body)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AuthRejection::unauthorized(
                        "MISSING_TOKEN",
                        "Authorization header with Bearer token required",
                    )
                    .into_response()
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let claims = verify_token(bearer.token(), auth_service.jwt_secret()).map_err(|e| {
            let (code, message) = match e {
                JwtError::TokenExpired => ("TOKEN_EXPIRED", "Token has expired"),
                _ => ("INVALID_TOKEN", "Invalid token"),
            };
            AuthRejection::unauthorized(code, message).into_response()
        })?;

        let account_id = Uuid::parse_str(&claims.sub).map_err(|_| {
            AuthRejection::unauthorized("INVALID_TOKEN", "Invalid account ID in token")
                .into_response()
        })?;

        let role = match claims.role.as_str() {
            "customer" => AccountRole::Customer,
            "admin" => AccountRole::Admin,
            _ => {
                return Err(
                    AuthRejection::unauthorized("INVALID_TOKEN", "Invalid role in token")
                        .into_response(),
                )
            }
        };

        Ok(AuthenticatedUser {
            account_id,
            email: claims.email,
            role,
        })
    }
}

/// Extractor that additionally requires the admin role
pub struct AdminUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !matches!(user.role, AccountRole::Admin) {
            return Err(AuthRejection {
                status: StatusCode::FORBIDDEN,
                code: "FORBIDDEN",
                message: "Admin access required",
            }
            .into_response());
        }

        Ok(AdminUser(user))
    }
}
