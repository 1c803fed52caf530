//! Loan application routes

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::loan;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(loan::create_loan).get(loan::list_loans))
        .route(
            "/:id",
            get(loan::get_loan)
                .patch(loan::update_loan)
                .delete(loan::delete_loan),
        )
        .route("/:id/status", put(loan::set_loan_status))
        .route("/:id/audit", get(loan::loan_audit_trail))
        .route("/applicant/:id", get(loan::list_applicant_loans))
}
