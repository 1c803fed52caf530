//! Loan underwriting engine for MicroLend
//!
//! The deterministic core of the platform: a fixed-rate amortization (EMI)
//! calculator, an additive risk-scoring model, and the approve/reject decision
//! policy. Everything in this module is a pure function over its inputs;
//! persistence and identity checks live in the orchestrating service.

use serde::{Deserialize, Serialize};

use crate::models::LoanStatus;

// ============================================================================
// Policy Constants
// ============================================================================

/// Fixed annual interest rate applied to every loan (percent)
pub const ANNUAL_RATE_PERCENT: f64 = 14.0;

/// Minimum risk score required for automatic approval
pub const APPROVAL_THRESHOLD: i32 = 70;

/// Scoring starts from this base and applies penalties/bonuses
const BASE_SCORE: i32 = 100;

/// Score floor and ceiling
const MIN_SCORE: i32 = 0;
const MAX_SCORE: i32 = 100;

/// EMI above this fraction of monthly income is treated as debt stress
const DTI_RATIO_LIMIT: f64 = 0.4;
const DTI_PENALTY: i32 = 30;

/// More than this many existing loans draws a penalty
const EXISTING_LOAN_LIMIT: i32 = 2;
const EXISTING_LOAN_PENALTY: i32 = 20;

/// Principal size tiers (mutually exclusive)
const LARGE_PRINCIPAL_THRESHOLD: f64 = 500_000.0;
const LARGE_PRINCIPAL_PENALTY: i32 = 20;
const MEDIUM_PRINCIPAL_THRESHOLD: f64 = 200_000.0;
const MEDIUM_PRINCIPAL_PENALTY: i32 = 10;

/// Prior bureau score adjustments
const STRONG_CREDIT_THRESHOLD: i32 = 750;
const STRONG_CREDIT_BONUS: i32 = 10;
const WEAK_CREDIT_THRESHOLD: i32 = 500;
const WEAK_CREDIT_PENALTY: i32 = 10;

// ============================================================================
// Amortization Calculator
// ============================================================================

/// Compute the equated monthly installment for a fixed-rate loan.
///
/// Standard amortization: with monthly rate r = annual% / 12 / 100 and term n,
/// emi = p * r * (1+r)^n / ((1+r)^n - 1).
///
/// Total over its domain: callers must reject `term_months < 1` before
/// invoking (term 0 would divide by zero). The result is a currency amount;
/// rounding happens only at the presentation boundary.
pub fn monthly_installment(principal: f64, annual_rate_percent: f64, term_months: u32) -> f64 {
    let monthly_rate = annual_rate_percent / 12.0 / 100.0;
    if monthly_rate == 0.0 {
        return principal / term_months as f64;
    }
    let growth = (1.0 + monthly_rate).powi(term_months as i32);
    principal * monthly_rate * growth / (growth - 1.0)
}

// ============================================================================
// Risk Scorer
// ============================================================================

/// Compute the risk score in [0, 100] for an application. Higher is safer.
///
/// Additive model starting at 100. All rules are evaluated independently;
/// only the principal-size tiers are mutually exclusive. Clamping to the
/// [0, 100] range is always the final step. A missing prior credit score is
/// neutral: no bonus, no penalty.
pub fn risk_score(
    emi: f64,
    monthly_income: f64,
    existing_loan_count: i32,
    principal: f64,
    prior_credit_score: Option<i32>,
) -> i32 {
    let mut score = BASE_SCORE;

    // Debt-to-income stress test
    if emi > DTI_RATIO_LIMIT * monthly_income {
        score -= DTI_PENALTY;
    }

    if existing_loan_count > EXISTING_LOAN_LIMIT {
        score -= EXISTING_LOAN_PENALTY;
    }

    if principal > LARGE_PRINCIPAL_THRESHOLD {
        score -= LARGE_PRINCIPAL_PENALTY;
    } else if principal > MEDIUM_PRINCIPAL_THRESHOLD {
        score -= MEDIUM_PRINCIPAL_PENALTY;
    }

    if let Some(credit_score) = prior_credit_score {
        if credit_score >= STRONG_CREDIT_THRESHOLD {
            score += STRONG_CREDIT_BONUS;
        } else if credit_score < WEAK_CREDIT_THRESHOLD {
            score -= WEAK_CREDIT_PENALTY;
        }
    }

    score.clamp(MIN_SCORE, MAX_SCORE)
}

// ============================================================================
// Decision Policy
// ============================================================================

/// Outcome of the automated decision policy
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Decision {
    pub status: LoanStatus,
    pub recommendation: String,
}

/// Apply the approval threshold to a risk score.
///
/// The boundary is inclusive on the approval side: a score of exactly
/// [`APPROVAL_THRESHOLD`] is approved.
pub fn decide(score: i32, term_months: u32) -> Decision {
    if score >= APPROVAL_THRESHOLD {
        Decision {
            status: LoanStatus::Approved,
            recommendation: format!(
                "Eligible for {}-month loan at {:.0}% interest",
                term_months, ANNUAL_RATE_PERCENT
            ),
        }
    } else {
        Decision {
            status: LoanStatus::Rejected,
            recommendation: "Application rejected due to risk factors. \
                 Try reducing loan amount or number of active loans."
                .to_string(),
        }
    }
}

/// Recommendation text for the trusted admin override path.
///
/// This path bypasses scoring entirely; the reviewer's identity is recorded
/// in the regenerated recommendation.
pub fn override_recommendation(status: LoanStatus, admin_email: &str) -> String {
    match status {
        LoanStatus::Approved => format!("Loan approved by admin {}", admin_email),
        LoanStatus::Rejected => format!("Loan rejected by admin {}", admin_email),
        LoanStatus::Pending => format!("Loan status updated to pending by admin {}", admin_email),
    }
}

// ============================================================================
// Combined Assessment
// ============================================================================

/// Full engine output for one application
#[derive(Debug, Clone)]
pub struct Assessment {
    pub emi: f64,
    pub risk_score: i32,
    pub status: LoanStatus,
    pub recommendation: String,
}

/// Run calculator, scorer and decision policy in sequence.
///
/// Inputs must already be domain-validated (principal > 0, term >= 1,
/// income > 0, existing loans >= 0).
pub fn underwrite(
    principal: f64,
    term_months: u32,
    monthly_income: f64,
    existing_loan_count: i32,
    prior_credit_score: Option<i32>,
) -> Assessment {
    let emi = monthly_installment(principal, ANNUAL_RATE_PERCENT, term_months);
    let score = risk_score(
        emi,
        monthly_income,
        existing_loan_count,
        principal,
        prior_credit_score,
    );
    let decision = decide(score, term_months);

    Assessment {
        emi,
        risk_score: score,
        status: decision.status,
        recommendation: decision.recommendation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installment_standard_case() {
        // 100,000 over 12 months at 14% annual
        let emi = monthly_installment(100_000.0, 14.0, 12);
        assert!((emi - 8_979.0).abs() < 1.0, "emi was {}", emi);
    }

    #[test]
    fn test_installment_zero_rate_degenerates_to_straight_line() {
        let emi = monthly_installment(12_000.0, 0.0, 12);
        assert!((emi - 1_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_installment_total_exceeds_principal() {
        for &term in &[1u32, 6, 12, 60, 240] {
            let emi = monthly_installment(250_000.0, ANNUAL_RATE_PERCENT, term);
            assert!(
                emi * term as f64 > 250_000.0,
                "interest must be paid for term {}",
                term
            );
        }
    }

    #[test]
    fn test_installment_monotonic_in_principal() {
        let mut last = 0.0;
        for &p in &[10_000.0, 50_000.0, 100_000.0, 500_000.0] {
            let emi = monthly_installment(p, ANNUAL_RATE_PERCENT, 24);
            assert!(emi > last);
            last = emi;
        }
    }

    #[test]
    fn test_score_no_penalties() {
        // EMI well below 40% of income, no other triggers
        assert_eq!(risk_score(8_979.0, 50_000.0, 0, 100_000.0, None), 100);
    }

    #[test]
    fn test_score_stacked_penalties_clamp_at_zero() {
        // All four penalties at once: -30 -20 -20 -10 from base 100
        let score = risk_score(100_000.0, 1_000.0, 10, 600_000.0, Some(300));
        assert_eq!(score, 20);
        assert!((0..=100).contains(&score));
    }

    #[test]
    fn test_score_principal_tiers_are_exclusive() {
        let mid = risk_score(1.0, 100_000.0, 0, 300_000.0, None);
        let large = risk_score(1.0, 100_000.0, 0, 600_000.0, None);
        assert_eq!(mid, 90);
        assert_eq!(large, 80);
    }

    #[test]
    fn test_score_credit_bonus_cannot_exceed_cap() {
        // No penalties plus strong credit still clamps at 100
        assert_eq!(risk_score(1.0, 100_000.0, 0, 10_000.0, Some(800)), 100);
    }

    #[test]
    fn test_score_missing_credit_is_neutral() {
        let without = risk_score(1.0, 100_000.0, 0, 10_000.0, None);
        let mid_range = risk_score(1.0, 100_000.0, 0, 10_000.0, Some(600));
        assert_eq!(without, mid_range);
    }

    #[test]
    fn test_decide_boundary_inclusive() {
        assert_eq!(decide(70, 12).status, LoanStatus::Approved);
        assert_eq!(decide(69, 12).status, LoanStatus::Rejected);
    }

    #[test]
    fn test_decide_is_idempotent() {
        let first = decide(85, 24);
        let second = decide(85, 24);
        assert_eq!(first, second);
    }

    #[test]
    fn test_decide_recommendation_texts() {
        let approved = decide(100, 12);
        assert_eq!(
            approved.recommendation,
            "Eligible for 12-month loan at 14% interest"
        );

        let rejected = decide(0, 12);
        assert!(rejected.recommendation.contains("rejected due to risk factors"));
    }

    #[test]
    fn test_override_recommendation_texts() {
        assert_eq!(
            override_recommendation(LoanStatus::Approved, "ops@microlend.io"),
            "Loan approved by admin ops@microlend.io"
        );
        assert_eq!(
            override_recommendation(LoanStatus::Rejected, "ops@microlend.io"),
            "Loan rejected by admin ops@microlend.io"
        );
        assert_eq!(
            override_recommendation(LoanStatus::Pending, "ops@microlend.io"),
            "Loan status updated to pending by admin ops@microlend.io"
        );
    }

    #[test]
    fn test_underwrite_end_to_end_approval() {
        let a = underwrite(100_000.0, 12, 50_000.0, 0, None);
        assert!((a.emi - 8_979.0).abs() < 1.0);
        assert_eq!(a.risk_score, 100);
        assert_eq!(a.status, LoanStatus::Approved);
    }
}
