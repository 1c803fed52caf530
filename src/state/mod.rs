//! Shared application state

use axum::extract::FromRef;
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::services::{LoanService, ProfileService};

/// State shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: Arc<AuthService>,
    pub loan_service: Arc<LoanService>,
    pub profile_service: Arc<ProfileService>,
}

impl AppState {
    /// Build the state and its services from a database pool
    pub fn new(db_pool: PgPool, jwt_secret: String, token_ttl_seconds: i64) -> Self {
        let auth_service = Arc::new(AuthService::new(
            db_pool.clone(),
            jwt_secret,
            token_ttl_seconds,
        ));
        let loan_service = Arc::new(LoanService::new(db_pool.clone()));
        let profile_service = Arc::new(ProfileService::new(db_pool.clone()));

        Self {
            db_pool,
            auth_service,
            loan_service,
            profile_service,
        }
    }
}

// Lets the auth extractors pull the service straight from router state.
impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth_service.clone()
    }
}
