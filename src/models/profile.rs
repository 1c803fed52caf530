//! Applicant profile models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

/// Extended applicant profile. 0 or 1 per account; its `credit_score` is the
/// optional prior-credit input to underwriting.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ApplicantProfile {
    pub id: Uuid,
    pub account_id: Uuid,
    pub monthly_income: f64,
    pub occupation: String,
    pub address: String,
    pub credit_score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create an applicant profile.
///
/// The credit score is not client-supplied; the platform assigns a simulated
/// bureau score in [300, 850] at creation.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProfileRequest {
    #[validate(range(min = 0.0, message = "Monthly income cannot be negative"))]
    pub monthly_income: f64,
    #[validate(length(min = 1, message = "Occupation is required"))]
    pub occupation: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
}

/// Editable applicant profile fields
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileFields {
    pub monthly_income: Option<f64>,
    pub occupation: Option<String>,
    pub address: Option<String>,
}

impl UpdateProfileFields {
    pub fn is_empty(&self) -> bool {
        self.monthly_income.is_none() && self.occupation.is_none() && self.address.is_none()
    }
}
