//! Plain-text rendering of a paid report.

use std::fmt::Write;

use crate::report::ReportRecord;

const RULE: &str = "----------------------------------------";

fn row(out: &mut String, key: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "  {key:<22}{value}");
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{RULE}");
}

pub fn render_report(report: &ReportRecord) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "CRB Credit Report");
    let _ = writeln!(out, "{RULE}");
    row(&mut out, "Report ID:", &report.report_id);
    row(&mut out, "Generated:", report.generated_at.format("%Y-%m-%d %H:%M UTC"));
    row(&mut out, "Purpose:", &report.purpose);

    section(&mut out, "Personal Information");
    row(&mut out, "Full Name:", &report.personal_information.full_name);
    row(&mut out, "ID Number:", &report.personal_information.id_number);

    section(&mut out, "Credit Score");
    row(&mut out, "Score:", report.credit_score);

    section(&mut out, "Current Loans");
    if report.credit_accounts.current_loans.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for loan in &report.credit_accounts.current_loans {
        row(&mut out, "Loan ID:", &loan.loan_id);
        row(&mut out, "Lender:", &loan.lender);
        row(&mut out, "Amount:", format!("KES {}", loan.amount));
        row(&mut out, "Balance:", format!("KES {}", loan.balance));
    }

    let h = &report.repayment_history;
    section(&mut out, "Repayment History");
    row(&mut out, "Timely Payments:", h.timely_payments);
    row(&mut out, "Late Payments:", h.late_payments);
    row(&mut out, "Loan Defaults:", h.loan_defaults);

    section(&mut out, "Credit Inquiries");
    for inquiry in &report.credit_inquiries {
        row(&mut out, "Inquiry ID:", &inquiry.inquiry_id);
        row(&mut out, "Institution:", &inquiry.institution);
        row(&mut out, "Date:", inquiry.date.format("%Y-%m-%d"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{report::ReportGenerator, rng::ReportRng};
    use chrono::{TimeZone, Utc};

    #[test]
    fn document_lists_every_section() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let report = ReportGenerator::generate(&mut ReportRng::new(5), None, "employment", now);
        let doc = render_report(&report);

        assert!(doc.starts_with("CRB Credit Report\n"));
        for heading in [
            "Personal Information",
            "Credit Score",
            "Current Loans",
            "Repayment History",
            "Credit Inquiries",
        ] {
            assert!(doc.contains(heading), "missing {heading}");
        }
        assert!(doc.contains(&report.report_id));
        assert!(doc.contains("2024-01-02 03:04 UTC"));
        assert!(doc.contains("MOBILE LOAN LENDER"));
        assert!(doc.contains(&format!("{}", report.credit_score)));
    }
}
