//! Mock credit report synthesis.
//!
//! A report is built once per generation event from the stored profile,
//! the chosen purpose and a handful of random draws. There is no credit
//! bureau behind it; every figure except the subject is synthetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    auth::UserProfile,
    rng::ReportRng,
    types::{ReportId, Shillings},
};

pub const LOAN_AMOUNT_MIN: Shillings = 10_000;
pub const LOAN_AMOUNT_MAX: Shillings = 20_000; // exclusive
pub const LOAN_BALANCE_MIN: Shillings = 1_000;
pub const SCORE_MIN: u32 = 100;
pub const SCORE_MAX: u32 = 500; // inclusive

const FALLBACK_NAME: &str = "John Doe";
const FALLBACK_ID_NUMBER: &str = "12345678";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub report_id:            ReportId,
    pub personal_information: PersonalInformation,
    pub credit_accounts:      CreditAccounts,
    pub repayment_history:    RepaymentHistory,
    pub credit_score:         u32,
    pub credit_inquiries:     Vec<CreditInquiry>,
    pub purpose:              String,
    pub generated_at:         DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalInformation {
    pub full_name: String,
    pub id_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditAccounts {
    pub current_loans: Vec<LoanEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanEntry {
    pub loan_id: String,
    pub lender:  String,
    pub amount:  Shillings,
    pub balance: Shillings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentHistory {
    pub timely_payments: u32,
    pub late_payments:   u32,
    pub loan_defaults:   u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditInquiry {
    pub inquiry_id:  String,
    pub institution: String,
    pub date:        DateTime<Utc>,
}

impl ReportRecord {
    pub fn total_balance(&self) -> Shillings {
        self.credit_accounts.current_loans.iter().map(|l| l.balance).sum()
    }
}

pub struct ReportGenerator;

impl ReportGenerator {
    /// Build a report for `purpose` at time `now`.
    /// The caller is responsible for checking `purpose` against the catalog.
    pub fn generate(
        rng:     &mut ReportRng,
        profile: Option<&UserProfile>,
        purpose: &str,
        now:     DateTime<Utc>,
    ) -> ReportRecord {
        let amount = rng.range(LOAN_AMOUNT_MIN, LOAN_AMOUNT_MAX);
        let balance = rng.range(LOAN_BALANCE_MIN, amount);
        let credit_score =
            rng.range_inclusive(SCORE_MIN as u64, SCORE_MAX as u64) as u32;

        let personal_information = match profile {
            Some(p) => PersonalInformation {
                full_name: p.full_name.clone(),
                id_number: p.id_number.clone(),
            },
            None => PersonalInformation {
                full_name: FALLBACK_NAME.into(),
                id_number: FALLBACK_ID_NUMBER.into(),
            },
        };

        ReportRecord {
            report_id: format!("CRB{}", now.timestamp_millis()),
            personal_information,
            credit_accounts: CreditAccounts {
                current_loans: vec![LoanEntry {
                    loan_id: "L1234".into(),
                    lender:  "MOBILE LOAN LENDER".into(),
                    amount,
                    balance,
                }],
            },
            repayment_history: RepaymentHistory {
                timely_payments: 1,
                late_payments:   3,
                loan_defaults:   1,
            },
            credit_score,
            credit_inquiries: vec![CreditInquiry {
                inquiry_id:  "INQ123".into(),
                institution: "XXX Bank In Kenya".into(),
                date:        now,
            }],
            purpose: purpose.to_string(),
            generated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 8, 30, 0).unwrap()
    }

    #[test]
    fn missing_profile_falls_back_to_placeholder_subject() {
        let mut rng = ReportRng::new(1);
        let r = ReportGenerator::generate(&mut rng, None, "loan", at());
        assert_eq!(r.personal_information.full_name, "John Doe");
        assert_eq!(r.personal_information.id_number, "12345678");
    }

    #[test]
    fn report_id_and_dates_come_from_now() {
        let mut rng = ReportRng::new(1);
        let r = ReportGenerator::generate(&mut rng, None, "housing", at());
        assert_eq!(r.report_id, format!("CRB{}", at().timestamp_millis()));
        assert_eq!(r.generated_at, at());
        assert_eq!(r.credit_inquiries[0].date, at());
        assert_eq!(r.purpose, "housing");
    }

    #[test]
    fn fixed_repayment_tally() {
        let mut rng = ReportRng::new(99);
        let r = ReportGenerator::generate(&mut rng, None, "loan", at());
        assert_eq!(r.repayment_history, RepaymentHistory {
            timely_payments: 1,
            late_payments:   3,
            loan_defaults:   1,
        });
    }

    #[test]
    fn stored_layout_uses_snake_case_keys() {
        let mut rng = ReportRng::new(3);
        let r = ReportGenerator::generate(&mut rng, None, "loan", at());
        let v = serde_json::to_value(&r).unwrap();
        assert!(v["personal_information"]["full_name"].is_string());
        assert!(v["credit_accounts"]["current_loans"][0]["balance"].is_u64());
        assert!(v["repayment_history"]["loan_defaults"].is_u64());
    }
}
