//! Applicant profile management
//!
//! One optional profile per account. At creation the platform assigns a
//! simulated bureau credit score in [300, 850]; underwriting reads it as the
//! prior-credit input.

use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::{Actor, ApplicantProfile, CreateProfileRequest, UpdateProfileFields};

const CREDIT_SCORE_MIN: i32 = 300;
const CREDIT_SCORE_MAX: i32 = 850;

/// Service for applicant profile operations
#[derive(Clone)]
pub struct ProfileService {
    db_pool: PgPool,
}

impl ProfileService {
    /// Create a new profile service
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Create the profile for the acting account
    pub async fn create_profile(
        &self,
        actor: &Actor,
        request: CreateProfileRequest,
    ) -> ApiResult<ApplicantProfile> {
        request.validate()?;

        let existing = sqlx::query_as::<_, ApplicantProfile>(
            "SELECT * FROM applicant_profiles WHERE account_id = $1",
        )
        .bind(actor.id)
        .fetch_optional(&self.db_pool)
        .await?;

        if existing.is_some() {
            return Err(ApiError::Conflict(
                "Profile already exists for this account".to_string(),
            ));
        }

        let credit_score = rand::thread_rng().gen_range(CREDIT_SCORE_MIN..=CREDIT_SCORE_MAX);

        let profile = sqlx::query_as::<_, ApplicantProfile>(
            r#"
            INSERT INTO applicant_profiles
                (id, account_id, monthly_income, occupation, address, credit_score)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.id)
        .bind(request.monthly_income)
        .bind(&request.occupation)
        .bind(&request.address)
        .bind(credit_score)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(
            account_id = %actor.id,
            credit_score = profile.credit_score,
            "Applicant profile created"
        );

        Ok(profile)
    }

    /// Fetch a profile by account id, enforcing ownership
    pub async fn get_profile(&self, actor: &Actor, account_id: Uuid) -> ApiResult<ApplicantProfile> {
        if !actor.is_admin() && actor.id != account_id {
            return Err(ApiError::Forbidden(
                "You may only view your own profile".to_string(),
            ));
        }

        let profile = sqlx::query_as::<_, ApplicantProfile>(
            "SELECT * FROM applicant_profiles WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

        Ok(profile)
    }

    /// Edit the acting account's profile. The credit score is never editable.
    pub async fn update_profile(
        &self,
        actor: &Actor,
        fields: UpdateProfileFields,
    ) -> ApiResult<ApplicantProfile> {
        if fields.is_empty() {
            return Err(ApiError::BadRequest(
                "No updatable fields provided".to_string(),
            ));
        }

        if let Some(income) = fields.monthly_income {
            if !income.is_finite() || income < 0.0 {
                return Err(ApiError::ValidationError(
                    "Monthly income cannot be negative".to_string(),
                ));
            }
        }

        let profile = sqlx::query_as::<_, ApplicantProfile>(
            r#"
            UPDATE applicant_profiles
            SET monthly_income = COALESCE($1, monthly_income),
                occupation = COALESCE($2, occupation),
                address = COALESCE($3, address),
                updated_at = NOW()
            WHERE account_id = $4
            RETURNING *
            "#,
        )
        .bind(fields.monthly_income)
        .bind(fields.occupation.as_deref())
        .bind(fields.address.as_deref())
        .bind(actor.id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

        Ok(profile)
    }

    /// Delete the acting account's profile
    pub async fn delete_profile(&self, actor: &Actor) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM applicant_profiles WHERE account_id = $1")
            .bind(actor.id)
            .execute(&self.db_pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Profile not found".to_string()));
        }

        Ok(())
    }

    /// List all profiles (admin only at the route)
    pub async fn list_profiles(&self) -> ApiResult<Vec<ApplicantProfile>> {
        let profiles = sqlx::query_as::<_, ApplicantProfile>(
            "SELECT * FROM applicant_profiles ORDER BY created_at DESC",
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(profiles)
    }
}
