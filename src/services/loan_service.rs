//! Loan application orchestration
//!
//! Validates requests, runs the underwriting engine, persists applications
//! and records the audit trail. Ownership rules: customers see and edit only
//! their own applications, admins see and edit everything.

use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::audit::{snapshot, AuditAction, AuditLogEntry, AuditSink};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    AccountRole, Actor, ApplicantProfile, CreateLoanRequest, ListLoansQuery, LoanApplication,
    LoanStatus, UpdateLoanFields,
};
use crate::services::underwriting::{self, ANNUAL_RATE_PERCENT};

/// Merge edited fields into an application and recompute the derived values.
///
/// `emi` and `risk_score` are recomputed whenever the financial inputs change,
/// but the decision is not re-run: `status` and `recommendation` keep their
/// current values until an admin reviews the application. The version is
/// bumped for the optimistic concurrency check.
pub fn apply_update(
    loan: &LoanApplication,
    fields: &UpdateLoanFields,
    prior_credit_score: Option<i32>,
) -> LoanApplication {
    let mut updated = loan.clone();

    if let Some(principal) = fields.principal {
        updated.principal = principal;
    }
    if let Some(term_months) = fields.term_months {
        updated.term_months = term_months;
    }
    if let Some(ref purpose) = fields.purpose {
        updated.purpose = purpose.clone();
    }
    if let Some(monthly_income) = fields.monthly_income {
        updated.monthly_income = monthly_income;
    }
    if let Some(existing_loan_count) = fields.existing_loan_count {
        updated.existing_loan_count = existing_loan_count;
    }

    let inputs_changed = fields.principal.is_some()
        || fields.term_months.is_some()
        || fields.monthly_income.is_some()
        || fields.existing_loan_count.is_some();

    if inputs_changed {
        updated.emi = underwriting::monthly_installment(
            updated.principal,
            ANNUAL_RATE_PERCENT,
            updated.term_months as u32,
        );
        updated.risk_score = underwriting::risk_score(
            updated.emi,
            updated.monthly_income,
            updated.existing_loan_count,
            updated.principal,
            prior_credit_score,
        );
    }

    updated.version = loan.version + 1;
    updated
}

fn validate_financials(
    principal: f64,
    term_months: i32,
    monthly_income: f64,
    existing_loan_count: i32,
) -> Result<(), ApiError> {
    if !principal.is_finite() || principal <= 0.0 {
        return Err(ApiError::ValidationError(
            "Loan amount must be greater than zero".to_string(),
        ));
    }
    if term_months < 1 {
        return Err(ApiError::ValidationError(
            "Loan term must be at least 1 month".to_string(),
        ));
    }
    if !monthly_income.is_finite() || monthly_income <= 0.0 {
        return Err(ApiError::ValidationError(
            "Monthly income must be greater than zero".to_string(),
        ));
    }
    if existing_loan_count < 0 {
        return Err(ApiError::ValidationError(
            "Existing loan count cannot be negative".to_string(),
        ));
    }
    Ok(())
}

/// Recorded as `performed_by` for actions not taken by an admin
const SYSTEM_ACTOR: &str = "system";

/// Audit actor identity: admin actions carry the admin's email, everything
/// customer-initiated is recorded as the system acting on the application.
fn audit_identity(actor: &Actor) -> &str {
    if actor.is_admin() {
        &actor.email
    } else {
        SYSTEM_ACTOR
    }
}

fn require_admin(actor: &Actor) -> Result<(), ApiError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Admin access required".to_string()))
    }
}

fn validate_purpose(purpose: &str) -> Result<(), ApiError> {
    if purpose.trim().is_empty() {
        return Err(ApiError::ValidationError(
            "Loan purpose is required".to_string(),
        ));
    }
    Ok(())
}

/// Service for loan application operations
#[derive(Clone)]
pub struct LoanService {
    db_pool: PgPool,
    audit: AuditSink,
}

impl LoanService {
    /// Create a new loan service
    pub fn new(db_pool: PgPool) -> Self {
        let audit = AuditSink::new(db_pool.clone());
        Self { db_pool, audit }
    }

    async fn prior_credit_score(&self, applicant_id: Uuid) -> Result<Option<i32>, ApiError> {
        let profile = sqlx::query_as::<_, ApplicantProfile>(
            "SELECT * FROM applicant_profiles WHERE account_id = $1",
        )
        .bind(applicant_id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(profile.map(|p| p.credit_score))
    }

    async fn fetch_loan(&self, loan_id: Uuid) -> Result<LoanApplication, ApiError> {
        let loan =
            sqlx::query_as::<_, LoanApplication>("SELECT * FROM loan_applications WHERE id = $1")
                .bind(loan_id)
                .fetch_optional(&self.db_pool)
                .await?
                .ok_or_else(|| ApiError::NotFound("Loan application not found".to_string()))?;

        Ok(loan)
    }

    fn authorize_access(actor: &Actor, loan: &LoanApplication) -> Result<(), ApiError> {
        if actor.is_admin() || loan.applicant_id == actor.id {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "You do not have access to this loan application".to_string(),
            ))
        }
    }

    /// Submit a new loan application.
    ///
    /// Runs the full underwriting pipeline and persists the application with
    /// its computed `emi`, `risk_score`, `status` and `recommendation`.
    pub async fn create_application(
        &self,
        actor: &Actor,
        request: CreateLoanRequest,
    ) -> ApiResult<LoanApplication> {
        if actor.is_admin() {
            return Err(ApiError::Forbidden(
                "Admins cannot submit loan applications".to_string(),
            ));
        }

        validate_financials(
            request.principal,
            request.term_months,
            request.monthly_income,
            request.existing_loan_count,
        )?;
        validate_purpose(&request.purpose)?;

        let prior_credit_score = self.prior_credit_score(actor.id).await?;

        let assessment = underwriting::underwrite(
            request.principal,
            request.term_months as u32,
            request.monthly_income,
            request.existing_loan_count,
            prior_credit_score,
        );

        let loan = sqlx::query_as::<_, LoanApplication>(
            r#"
            INSERT INTO loan_applications
                (id, applicant_id, principal, term_months, purpose, monthly_income,
                 existing_loan_count, emi, risk_score, status, recommendation)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.id)
        .bind(request.principal)
        .bind(request.term_months)
        .bind(&request.purpose)
        .bind(request.monthly_income)
        .bind(request.existing_loan_count)
        .bind(assessment.emi)
        .bind(assessment.risk_score)
        .bind(assessment.status)
        .bind(&assessment.recommendation)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(
            loan_id = %loan.id,
            applicant_id = %loan.applicant_id,
            risk_score = loan.risk_score,
            status = loan.status.as_str(),
            "Loan application created"
        );

        self.audit.record(
            loan.id,
            loan.applicant_id,
            AuditAction::Created,
            None,
            snapshot(&loan),
            audit_identity(actor),
        );

        Ok(loan)
    }

    /// Fetch one loan application, enforcing ownership
    pub async fn get_application(
        &self,
        actor: &Actor,
        loan_id: Uuid,
    ) -> ApiResult<LoanApplication> {
        let loan = self.fetch_loan(loan_id).await?;
        Self::authorize_access(actor, &loan)?;
        Ok(loan)
    }

    /// List loan applications with optional filters (admin only)
    pub async fn list_applications(
        &self,
        query: &ListLoansQuery,
    ) -> ApiResult<Vec<LoanApplication>> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT * FROM loan_applications WHERE 1=1");

        if let Some(applicant_id) = query.applicant_id {
            builder.push(" AND applicant_id = ");
            builder.push_bind(applicant_id);
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ");
            builder.push_bind(status);
        }
        builder.push(" ORDER BY created_at DESC");

        let loans = builder
            .build_query_as::<LoanApplication>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(loans)
    }

    /// List applications belonging to one applicant.
    ///
    /// Customers may only list their own; admins may list anyone's.
    pub async fn list_for_applicant(
        &self,
        actor: &Actor,
        applicant_id: Uuid,
    ) -> ApiResult<Vec<LoanApplication>> {
        if !actor.is_admin() && actor.id != applicant_id {
            return Err(ApiError::Forbidden(
                "You may only view your own loan applications".to_string(),
            ));
        }

        let role = sqlx::query_scalar::<_, AccountRole>(
            "SELECT role FROM accounts WHERE id = $1",
        )
        .bind(applicant_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

        if role != AccountRole::Customer {
            return Err(ApiError::BadRequest(
                "Account is not a loan applicant".to_string(),
            ));
        }

        let loans = sqlx::query_as::<_, LoanApplication>(
            "SELECT * FROM loan_applications WHERE applicant_id = $1 ORDER BY created_at DESC",
        )
        .bind(applicant_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(loans)
    }

    /// Edit the input fields of an application.
    ///
    /// Recomputes `emi` and `risk_score` when financial inputs change. The
    /// decision is deliberately not re-run here; status changes go through
    /// [`Self::set_status`]. A stale version fails with a conflict.
    pub async fn update_fields(
        &self,
        actor: &Actor,
        loan_id: Uuid,
        fields: UpdateLoanFields,
    ) -> ApiResult<LoanApplication> {
        if fields.is_empty() {
            return Err(ApiError::BadRequest(
                "No updatable fields provided".to_string(),
            ));
        }

        let current = self.fetch_loan(loan_id).await?;
        Self::authorize_access(actor, &current)?;

        validate_financials(
            fields.principal.unwrap_or(current.principal),
            fields.term_months.unwrap_or(current.term_months),
            fields.monthly_income.unwrap_or(current.monthly_income),
            fields
                .existing_loan_count
                .unwrap_or(current.existing_loan_count),
        )?;
        if let Some(ref purpose) = fields.purpose {
            validate_purpose(purpose)?;
        }

        let prior_credit_score = self.prior_credit_score(current.applicant_id).await?;
        let updated = apply_update(&current, &fields, prior_credit_score);

        let saved = sqlx::query_as::<_, LoanApplication>(
            r#"
            UPDATE loan_applications
            SET principal = $1, term_months = $2, purpose = $3, monthly_income = $4,
                existing_loan_count = $5, emi = $6, risk_score = $7,
                version = $8, updated_at = NOW()
            WHERE id = $9 AND version = $10
            RETURNING *
            "#,
        )
        .bind(updated.principal)
        .bind(updated.term_months)
        .bind(&updated.purpose)
        .bind(updated.monthly_income)
        .bind(updated.existing_loan_count)
        .bind(updated.emi)
        .bind(updated.risk_score)
        .bind(updated.version)
        .bind(loan_id)
        .bind(current.version)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("Loan application was modified concurrently".to_string())
        })?;

        tracing::info!(
            loan_id = %saved.id,
            risk_score = saved.risk_score,
            "Loan application updated"
        );

        self.audit.record(
            saved.id,
            saved.applicant_id,
            AuditAction::Updated,
            Some(snapshot(&current)),
            snapshot(&saved),
            audit_identity(actor),
        );

        Ok(saved)
    }

    /// Override the status of an application (admin only).
    ///
    /// Bypasses scoring; the recommendation is regenerated to record the
    /// reviewing admin's identity.
    pub async fn set_status(
        &self,
        admin: &Actor,
        loan_id: Uuid,
        status: LoanStatus,
    ) -> ApiResult<LoanApplication> {
        require_admin(admin)?;

        let current = self.fetch_loan(loan_id).await?;
        let recommendation = underwriting::override_recommendation(status, &admin.email);

        let saved = sqlx::query_as::<_, LoanApplication>(
            r#"
            UPDATE loan_applications
            SET status = $1, recommendation = $2, version = $3, updated_at = NOW()
            WHERE id = $4 AND version = $5
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(&recommendation)
        .bind(current.version + 1)
        .bind(loan_id)
        .bind(current.version)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("Loan application was modified concurrently".to_string())
        })?;

        tracing::info!(
            loan_id = %saved.id,
            status = saved.status.as_str(),
            admin = %admin.email,
            "Loan status overridden"
        );

        self.audit.record(
            saved.id,
            saved.applicant_id,
            AuditAction::StatusChanged,
            Some(snapshot(&current)),
            snapshot(&saved),
            audit_identity(admin),
        );

        Ok(saved)
    }

    /// Delete a loan application, enforcing ownership.
    ///
    /// Deletion is not audited; the trail covers the application's lifetime.
    pub async fn delete_application(&self, actor: &Actor, loan_id: Uuid) -> ApiResult<()> {
        let loan = self.fetch_loan(loan_id).await?;
        Self::authorize_access(actor, &loan)?;

        sqlx::query("DELETE FROM loan_applications WHERE id = $1")
            .bind(loan_id)
            .execute(&self.db_pool)
            .await?;

        tracing::info!(loan_id = %loan_id, "Loan application deleted");

        Ok(())
    }

    /// Fetch the audit trail for one application (admin only at the route)
    pub async fn audit_trail(&self, loan_id: Uuid) -> ApiResult<Vec<AuditLogEntry>> {
        // 404 on unknown loan rather than an empty trail
        self.fetch_loan(loan_id).await?;
        self.audit.entries_for_loan(loan_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_loan() -> LoanApplication {
        let emi = underwriting::monthly_installment(100_000.0, ANNUAL_RATE_PERCENT, 12);
        LoanApplication {
            id: Uuid::new_v4(),
            applicant_id: Uuid::new_v4(),
            principal: 100_000.0,
            term_months: 12,
            purpose: "Working capital".to_string(),
            monthly_income: 50_000.0,
            existing_loan_count: 0,
            emi,
            risk_score: 100,
            status: LoanStatus::Approved,
            recommendation: "Eligible for 12-month loan at 14% interest".to_string(),
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_apply_update_recomputes_emi_and_score() {
        let loan = sample_loan();
        let fields = UpdateLoanFields {
            principal: Some(600_000.0),
            ..Default::default()
        };

        let updated = apply_update(&loan, &fields, None);

        assert!(updated.emi > loan.emi);
        assert_eq!(updated.risk_score, 50); // DTI breach (-30) + large principal (-20)
        assert_eq!(updated.version, 2);
    }

    #[test]
    fn test_apply_update_never_changes_status() {
        let loan = sample_loan();
        let fields = UpdateLoanFields {
            principal: Some(600_000.0),
            existing_loan_count: Some(5),
            ..Default::default()
        };

        let updated = apply_update(&loan, &fields, None);

        // Score drops below the approval threshold, but the decision stands
        // until an admin reviews it.
        assert!(updated.risk_score < underwriting::APPROVAL_THRESHOLD);
        assert_eq!(updated.status, LoanStatus::Approved);
        assert_eq!(updated.recommendation, loan.recommendation);
    }

    #[test]
    fn test_apply_update_purpose_only_keeps_derived_values() {
        let loan = sample_loan();
        let fields = UpdateLoanFields {
            purpose: Some("Equipment purchase".to_string()),
            ..Default::default()
        };

        let updated = apply_update(&loan, &fields, None);

        assert_eq!(updated.purpose, "Equipment purchase");
        assert_eq!(updated.emi, loan.emi);
        assert_eq!(updated.risk_score, loan.risk_score);
        assert_eq!(updated.version, 2);
    }

    fn actor_with_role(role: AccountRole) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            email: "someone@microlend.io".to_string(),
            role,
        }
    }

    #[test]
    fn test_audit_identity_domain() {
        // Customer-initiated actions are recorded as the system; only admin
        // actions carry a personal identity.
        let customer = actor_with_role(AccountRole::Customer);
        assert_eq!(audit_identity(&customer), "system");

        let admin = actor_with_role(AccountRole::Admin);
        assert_eq!(audit_identity(&admin), "someone@microlend.io");
    }

    #[test]
    fn test_require_admin_rejects_customers() {
        let customer = actor_with_role(AccountRole::Customer);
        let err = require_admin(&customer).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let admin = actor_with_role(AccountRole::Admin);
        assert!(require_admin(&admin).is_ok());
    }

    #[test]
    fn test_validate_financials_rejects_bad_inputs() {
        assert!(validate_financials(0.0, 12, 50_000.0, 0).is_err());
        assert!(validate_financials(-1.0, 12, 50_000.0, 0).is_err());
        assert!(validate_financials(100_000.0, 0, 50_000.0, 0).is_err());
        assert!(validate_financials(100_000.0, 12, 0.0, 0).is_err());
        assert!(validate_financials(100_000.0, 12, 50_000.0, -1).is_err());
        assert!(validate_financials(f64::NAN, 12, 50_000.0, 0).is_err());
        assert!(validate_financials(100_000.0, 12, 50_000.0, 0).is_ok());
    }
}
