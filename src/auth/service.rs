//! Authentication service
//!
//! Account registration, credential verification and token issuance.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::models::{
    Account, AccountResponse, AccountRole, AuthTokenResponse, LoginRequest, RegisterRequest,
};

use super::jwt::generate_token;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db_pool: PgPool,
    jwt_secret: String,
    token_ttl_seconds: i64,
}

impl AuthService {
    /// Create a new auth service instance
    pub fn new(db_pool: PgPool, jwt_secret: String, token_ttl_seconds: i64) -> Self {
        Self {
            db_pool,
            jwt_secret,
            token_ttl_seconds,
        }
    }

    /// JWT signing secret, used by the auth extractor
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// Register a new customer account
    pub async fn register(&self, request: RegisterRequest) -> Result<AccountResponse, ApiError> {
        request.validate()?;

        let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM accounts WHERE email = $1")
            .bind(&request.email)
            .fetch_optional(&self.db_pool)
            .await?;

        if existing.is_some() {
            return Err(ApiError::Conflict(
                "Account with this email already exists".to_string(),
            ));
        }

        let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
            .map_err(|e| ApiError::InternalError(format!("Password hashing failed: {}", e)))?;

        let now = Utc::now();
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, email, password_hash, first_name, last_name, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.email)
        .bind(&password_hash)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(AccountRole::Customer)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(account_id = %account.id, "Account registered");

        Ok(account.into())
    }

    /// Verify credentials and issue an access token
    pub async fn login(&self, request: LoginRequest) -> Result<AuthTokenResponse, ApiError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
            .bind(&request.email)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

        let valid = bcrypt::verify(&request.password, &account.password_hash)
            .map_err(|e| ApiError::InternalError(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
        }

        let token = generate_token(&account, &self.jwt_secret, self.token_ttl_seconds)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        tracing::info!(account_id = %account.id, "Account logged in");

        Ok(AuthTokenResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_ttl_seconds,
            account: account.into(),
        })
    }

    /// Look up an account by id
    pub async fn get_account(&self, id: Uuid) -> Result<Account, ApiError> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))
    }

    /// List all customer accounts (admin view)
    pub async fn list_customers(&self) -> Result<Vec<AccountResponse>, ApiError> {
        let accounts = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE role = 'customer' ORDER BY created_at DESC",
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(accounts.into_iter().map(AccountResponse::from).collect())
    }

    /// Create the seed admin account at startup if it does not exist yet
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db_pool)
            .await?;

        if existing.is_some() {
            return Ok(());
        }

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| ApiError::InternalError(format!("Password hashing failed: {}", e)))?;

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, password_hash, first_name, last_name, role, created_at, updated_at)
            VALUES ($1, $2, $3, 'Platform', 'Admin', 'admin', $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(&password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.db_pool)
        .await?;

        tracing::info!(email = %email, "Seed admin account created");

        Ok(())
    }
}
