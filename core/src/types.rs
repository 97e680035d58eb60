//! Shared primitive types used across the whole workflow.

/// Identifier of a generated report, e.g. `CRB1718000000000`.
pub type ReportId = String;

/// Identifier of one session's event stream in the audit log.
pub type FlowId = String;

/// A whole-shilling amount as it appears on a synthetic loan.
pub type Shillings = u64;

/// Storage keys for the durable client records.
/// These names are the on-disk contract. Never rename.
pub mod keys {
    pub const FLOW_STATE:      &str = "user_flow_state";
    pub const REPORT:          &str = "crb_report_data";
    pub const SIGNED_UP:       &str = "is_signed_up";
    pub const PROFILE:         &str = "user";
    pub const TOKEN:           &str = "token";
    pub const PAYMENT_RECEIPT: &str = "payment_receipt";
}
