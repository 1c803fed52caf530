//! Append-only audit trail for loan applications
//!
//! Every state-changing loan operation records an entry with before/after
//! snapshots. Writes are fire-and-forget: a failed audit write is logged for
//! operational diagnosis but never fails or rolls back the main operation.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::chrono::DateTime;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::LoanApplication;

/// Action recorded by an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    StatusChanged,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "created",
            AuditAction::Updated => "updated",
            AuditAction::StatusChanged => "status_changed",
        }
    }
}

/// A persisted audit entry (never mutated after insert)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub applicant_id: Uuid,
    pub action: String,
    pub old_data: Option<Value>,
    pub new_data: Value,
    pub performed_by: String,
    pub recorded_at: DateTime<Utc>,
}

/// JSON snapshot of a loan application for audit storage
pub fn snapshot(loan: &LoanApplication) -> Value {
    serde_json::to_value(loan).unwrap_or(Value::Null)
}

/// Audit sink backed by the append-only `loan_audit_log` table
#[derive(Clone)]
pub struct AuditSink {
    db_pool: PgPool,
}

impl AuditSink {
    /// Create a new audit sink
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Record an audit entry without blocking or failing the caller.
    ///
    /// The write happens on a spawned task; failures are traced and dropped.
    pub fn record(
        &self,
        loan_id: Uuid,
        applicant_id: Uuid,
        action: AuditAction,
        old_data: Option<Value>,
        new_data: Value,
        performed_by: &str,
    ) {
        let pool = self.db_pool.clone();
        let performed_by = performed_by.to_string();

        tokio::spawn(async move {
            let result = sqlx::query(
                r#"
                INSERT INTO loan_audit_log
                    (id, loan_id, applicant_id, action, old_data, new_data, performed_by, recorded_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(loan_id)
            .bind(applicant_id)
            .bind(action.as_str())
            .bind(old_data)
            .bind(new_data)
            .bind(&performed_by)
            .bind(Utc::now())
            .execute(&pool)
            .await;

            match result {
                Ok(_) => {
                    tracing::debug!(loan_id = %loan_id, action = action.as_str(), "Audit entry recorded");
                }
                Err(e) => {
                    tracing::error!(
                        loan_id = %loan_id,
                        action = action.as_str(),
                        error = %e,
                        "Failed to write audit entry"
                    );
                }
            }
        });
    }

    /// Fetch the audit trail for one loan application, newest first
    pub async fn entries_for_loan(&self, loan_id: Uuid) -> Result<Vec<AuditLogEntry>, ApiError> {
        let entries = sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM loan_audit_log WHERE loan_id = $1 ORDER BY recorded_at DESC",
        )
        .bind(loan_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_strings() {
        assert_eq!(AuditAction::Created.as_str(), "created");
        assert_eq!(AuditAction::Updated.as_str(), "updated");
        assert_eq!(AuditAction::StatusChanged.as_str(), "status_changed");
    }
}
