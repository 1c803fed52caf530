//! Loan application models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// Loan application status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "loan_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
            LoanStatus::Rejected => "rejected",
        }
    }
}

/// Loan application record.
///
/// `emi`, `risk_score`, `status` and `recommendation` are computed by the
/// underwriting engine and never accepted from clients. `version` backs the
/// optimistic concurrency check on updates.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct LoanApplication {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub principal: f64,
    pub term_months: i32,
    pub purpose: String,
    pub monthly_income: f64,
    pub existing_loan_count: i32,
    pub emi: f64,
    pub risk_score: i32,
    pub status: LoanStatus,
    pub recommendation: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a loan application
#[derive(Debug, Deserialize)]
pub struct CreateLoanRequest {
    pub principal: f64,
    pub term_months: i32,
    pub purpose: String,
    pub monthly_income: f64,
    pub existing_loan_count: i32,
}

/// Editable loan application fields.
///
/// The set of fields a caller may change is fixed by this struct; anything
/// else in the request body is ignored by deserialization. Computed fields
/// have no counterpart here on purpose.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateLoanFields {
    pub principal: Option<f64>,
    pub term_months: Option<i32>,
    pub purpose: Option<String>,
    pub monthly_income: Option<f64>,
    pub existing_loan_count: Option<i32>,
}

impl UpdateLoanFields {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.principal.is_none()
            && self.term_months.is_none()
            && self.purpose.is_none()
            && self.monthly_income.is_none()
            && self.existing_loan_count.is_none()
    }
}

/// Request to override the status of a loan application (admin only)
#[derive(Debug, Deserialize)]
pub struct SetLoanStatusRequest {
    pub status: LoanStatus,
}

/// Query for listing loan applications
#[derive(Debug, Default, Deserialize)]
pub struct ListLoansQuery {
    pub applicant_id: Option<Uuid>,
    pub status: Option<LoanStatus>,
}
