//! Applicant profile routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::profile;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(profile::create_profile).get(profile::list_profiles))
        .route(
            "/me",
            get(profile::my_profile)
                .patch(profile::update_profile)
                .delete(profile::delete_profile),
        )
        .route("/:account_id", get(profile::get_profile))
}
