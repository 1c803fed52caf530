//! API route definitions

mod auth;
mod loan;
mod profile;

use axum::Router;

use crate::state::AppState;

/// Assemble all API routes under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth::routes())
        .nest("/api/loans", loan::routes())
        .nest("/api/profiles", profile::routes())
}
