//! Workflow audit events.
//!
//! RULE: Every state-changing step of the session emits exactly one
//! FlowEvent, appended to the store's event log under the session's
//! flow id. Variants are append-only; never removed or reordered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    flow::View,
    types::{FlowId, ReportId},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowEvent {
    // ── Account ────────────────────────────────────
    SignedUp {
        user_id: String,
    },
    SignedIn {
        user_id: String,
    },
    SignedOut,

    // ── Navigation ─────────────────────────────────
    Redirected {
        requested: String,
        landed:    View,
    },
    FlowReset,

    // ── Report ─────────────────────────────────────
    PurposeSelected {
        purpose: String,
    },
    ReportGenerated {
        report_id:    ReportId,
        credit_score: u32,
    },
    ReportExported {
        report_id: ReportId,
    },

    // ── Payment ────────────────────────────────────
    PaymentAccepted {
        transaction_code: String,
        amount:           f64,
    },
    PaymentRejected {
        reason: String,
    },
}

impl FlowEvent {
    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SignedUp { .. }        => "signed_up",
            Self::SignedIn { .. }        => "signed_in",
            Self::SignedOut              => "signed_out",
            Self::Redirected { .. }      => "redirected",
            Self::FlowReset              => "flow_reset",
            Self::PurposeSelected { .. } => "purpose_selected",
            Self::ReportGenerated { .. } => "report_generated",
            Self::ReportExported { .. }  => "report_exported",
            Self::PaymentAccepted { .. } => "payment_accepted",
            Self::PaymentRejected { .. } => "payment_rejected",
        }
    }
}

/// A row of the flow_event table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:          Option<i64>,
    pub flow_id:     FlowId,
    pub occurred_at: DateTime<Utc>,
    pub event_type:  String,
    pub payload:     String,
}

impl EventLogEntry {
    pub fn decode(&self) -> serde_json::Result<FlowEvent> {
        serde_json::from_str(&self.payload)
    }
}
