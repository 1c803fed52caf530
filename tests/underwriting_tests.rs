//! End-to-end tests for the underwriting engine and loan update rules.
//!
//! These exercise the pure core: amortization, scoring, the decision policy,
//! and the field-edit merge logic, without a database.

use microlend_backend::models::{LoanApplication, LoanStatus, UpdateLoanFields};
use microlend_backend::services::underwriting::{
    decide, monthly_installment, override_recommendation, risk_score, underwrite,
    ANNUAL_RATE_PERCENT, APPROVAL_THRESHOLD,
};
use microlend_backend::services::apply_update;

use chrono::Utc;
use uuid::Uuid;

#[test]
fn clean_applicant_is_approved_with_full_score() {
    // 100k over 12 months on a 50k income, no other debt, no bureau history
    let a = underwrite(100_000.0, 12, 50_000.0, 0, None);

    assert!((a.emi - 8_979.0).abs() < 1.0, "emi was {}", a.emi);
    assert_eq!(a.risk_score, 100);
    assert_eq!(a.status, LoanStatus::Approved);
    assert_eq!(a.recommendation, "Eligible for 12-month loan at 14% interest");
}

#[test]
fn stacked_risk_factors_reject_at_floor() {
    // Every penalty fires: DTI breach, too many loans, large principal, weak credit
    let a = underwrite(600_000.0, 24, 20_000.0, 3, Some(450));

    assert_eq!(a.risk_score, 20);
    assert_eq!(a.status, LoanStatus::Rejected);
    assert_eq!(
        a.recommendation,
        "Application rejected due to risk factors. Try reducing loan amount or number of active loans."
    );
}

#[test]
fn overextended_applicant_is_rejected() {
    // 600k over 12 months on a 40k income with 3 open loans: DTI breach,
    // loan-count penalty and large-principal penalty all fire
    let a = underwrite(600_000.0, 12, 40_000.0, 3, None);

    assert_eq!(a.risk_score, 30);
    assert_eq!(a.status, LoanStatus::Rejected);
}

#[test]
fn strong_credit_alone_cannot_rescue_a_weak_application() {
    // Same application with an excellent bureau score: +10 is not enough
    let a = underwrite(600_000.0, 12, 40_000.0, 3, Some(800));

    assert_eq!(a.risk_score, 40);
    assert_eq!(a.status, LoanStatus::Rejected);
}

#[test]
fn threshold_boundary_is_inclusive_on_approval() {
    // Only the DTI penalty fires: 100 - 30 = 70, exactly at the threshold
    let a = underwrite(100_000.0, 12, 10_000.0, 0, None);

    assert_eq!(a.risk_score, APPROVAL_THRESHOLD);
    assert_eq!(a.status, LoanStatus::Approved);

    // One more penalty point away, the decision flips
    let below = decide(APPROVAL_THRESHOLD - 1, 12);
    assert_eq!(below.status, LoanStatus::Rejected);
}

#[test]
fn strong_credit_cannot_push_score_past_ceiling() {
    let score = risk_score(1_000.0, 50_000.0, 0, 50_000.0, Some(800));
    assert_eq!(score, 100);
}

#[test]
fn missing_bureau_history_is_neutral() {
    let with_mid_credit = risk_score(8_979.0, 50_000.0, 0, 100_000.0, Some(650));
    let without = risk_score(8_979.0, 50_000.0, 0, 100_000.0, None);
    assert_eq!(with_mid_credit, without);
}

#[test]
fn principal_tiers_are_mutually_exclusive() {
    // Income high enough that only the principal tier matters
    let medium = risk_score(5_000.0, 1_000_000.0, 0, 300_000.0, None);
    let large = risk_score(5_000.0, 1_000_000.0, 0, 600_000.0, None);
    assert_eq!(medium, 90);
    assert_eq!(large, 80);
}

#[test]
fn underwriting_is_deterministic() {
    let first = underwrite(250_000.0, 36, 40_000.0, 1, Some(710));
    let second = underwrite(250_000.0, 36, 40_000.0, 1, Some(710));

    assert_eq!(first.emi, second.emi);
    assert_eq!(first.risk_score, second.risk_score);
    assert_eq!(first.status, second.status);
    assert_eq!(first.recommendation, second.recommendation);
}

#[test]
fn installment_shrinks_as_the_term_stretches() {
    // Fixed principal: spreading repayment over more months lowers each payment
    let mut last = f64::INFINITY;
    for &term in &[1u32, 6, 12, 24, 60] {
        let emi = monthly_installment(100_000.0, ANNUAL_RATE_PERCENT, term);
        assert!(emi < last, "emi {} at term {} did not decrease", emi, term);
        last = emi;
    }
}

#[test]
fn installment_grows_with_rate() {
    let at_zero = monthly_installment(120_000.0, 0.0, 12);
    let at_fourteen = monthly_installment(120_000.0, ANNUAL_RATE_PERCENT, 12);
    assert!(at_fourteen > at_zero);
}

#[test]
fn admin_override_texts_record_the_reviewer() {
    assert_eq!(
        override_recommendation(LoanStatus::Approved, "reviewer@microlend.io"),
        "Loan approved by admin reviewer@microlend.io"
    );
    assert_eq!(
        override_recommendation(LoanStatus::Rejected, "reviewer@microlend.io"),
        "Loan rejected by admin reviewer@microlend.io"
    );
    assert_eq!(
        override_recommendation(LoanStatus::Pending, "reviewer@microlend.io"),
        "Loan status updated to pending by admin reviewer@microlend.io"
    );
}

fn approved_loan() -> LoanApplication {
    let assessment = underwrite(100_000.0, 12, 50_000.0, 0, None);
    LoanApplication {
        id: Uuid::new_v4(),
        applicant_id: Uuid::new_v4(),
        principal: 100_000.0,
        term_months: 12,
        purpose: "Inventory restock".to_string(),
        monthly_income: 50_000.0,
        existing_loan_count: 0,
        emi: assessment.emi,
        risk_score: assessment.risk_score,
        status: assessment.status,
        recommendation: assessment.recommendation,
        version: 1,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn editing_inputs_recomputes_emi_and_score_but_not_the_decision() {
    let loan = approved_loan();

    // Edits that would fail a fresh decision
    let fields = UpdateLoanFields {
        principal: Some(600_000.0),
        existing_loan_count: Some(4),
        ..Default::default()
    };

    let updated = apply_update(&loan, &fields, None);

    assert!(updated.emi > loan.emi);
    assert!(updated.risk_score < APPROVAL_THRESHOLD);

    // The standing decision survives until an admin reviews it
    assert_eq!(updated.status, LoanStatus::Approved);
    assert_eq!(updated.recommendation, loan.recommendation);
    assert_eq!(updated.version, loan.version + 1);
}

#[test]
fn lowering_the_principal_of_a_rejected_loan_does_not_approve_it() {
    let assessment = underwrite(600_000.0, 12, 40_000.0, 0, None);
    assert_eq!(assessment.status, LoanStatus::Rejected);

    let loan = LoanApplication {
        id: Uuid::new_v4(),
        applicant_id: Uuid::new_v4(),
        principal: 600_000.0,
        term_months: 12,
        purpose: "Shop expansion".to_string(),
        monthly_income: 40_000.0,
        existing_loan_count: 0,
        emi: assessment.emi,
        risk_score: assessment.risk_score,
        status: assessment.status,
        recommendation: assessment.recommendation,
        version: 1,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let fields = UpdateLoanFields {
        principal: Some(100_000.0),
        ..Default::default()
    };

    let updated = apply_update(&loan, &fields, None);

    // Fresh score would now clear the threshold, but the rejection stands
    assert!(updated.emi < loan.emi);
    assert!(updated.risk_score >= APPROVAL_THRESHOLD);
    assert_eq!(updated.status, LoanStatus::Rejected);
}

#[test]
fn editing_only_the_purpose_leaves_derived_values_alone() {
    let loan = approved_loan();

    let fields = UpdateLoanFields {
        purpose: Some("School fees".to_string()),
        ..Default::default()
    };

    let updated = apply_update(&loan, &fields, None);

    assert_eq!(updated.purpose, "School fees");
    assert_eq!(updated.emi, loan.emi);
    assert_eq!(updated.risk_score, loan.risk_score);
    assert_eq!(updated.status, loan.status);
}

#[test]
fn profile_credit_score_feeds_recomputation() {
    let loan = approved_loan();

    let fields = UpdateLoanFields {
        monthly_income: Some(15_000.0),
        ..Default::default()
    };

    // Same edit, different bureau history
    let weak = apply_update(&loan, &fields, Some(450));
    let strong = apply_update(&loan, &fields, Some(800));

    assert!(weak.risk_score < strong.risk_score);
}
