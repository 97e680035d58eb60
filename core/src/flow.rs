//! Flow guard: the onboarding state machine and its redirect rule.
//!
//! Two stages matter for navigation:
//!   A. no report yet   → only `/app/report` is reachable under `/app/`
//!   B. report exists   → only `/app/dashboard` is reachable under `/app/`
//!
//! `has_paid` never gates navigation. It only decides whether the
//! dashboard shows its content.
//!
//! RULE: FlowState is a value. Every change goes through
//! `FlowState::apply`, and FlowGuard persists the result before
//! returning.

use serde::{Deserialize, Serialize};

use crate::{error::CrbResult, store::ClientStore};

/// Path prefix of the protected area.
pub const PROTECTED_PREFIX: &str = "/app/";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowState {
    pub has_paid:             bool,
    pub has_generated_report: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowAction {
    ReportGenerated,
    PaymentConfirmed,
    Reset,
}

/// Coarse position in the onboarding funnel, derived from the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AwaitingReport,
    AwaitingPayment,
    Unlocked,
}

impl FlowState {
    pub fn fresh() -> Self {
        Self::default()
    }

    /// The single transition function.
    /// `PaymentConfirmed` is accepted in any state; see DESIGN.md.
    pub fn apply(self, action: FlowAction) -> Self {
        match action {
            FlowAction::ReportGenerated  => Self { has_generated_report: true, ..self },
            FlowAction::PaymentConfirmed => Self { has_paid: true, ..self },
            FlowAction::Reset            => Self::fresh(),
        }
    }

    pub fn stage(&self) -> Stage {
        match (self.has_generated_report, self.has_paid) {
            (false, _)    => Stage::AwaitingReport,
            (true, false) => Stage::AwaitingPayment,
            (true, true)  => Stage::Unlocked,
        }
    }

    /// Whether dashboard content is visible.
    pub fn content_unlocked(&self) -> bool {
        self.has_paid
    }

    /// The only view reachable under `/app/` in this state.
    pub fn home_view(&self) -> View {
        if self.has_generated_report { View::Dashboard } else { View::Report }
    }
}

/// Every routable view in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Home,
    SignIn,
    SignUp,
    Report,
    Payment,
    Dashboard,
    PrivacyPolicy,
    Terms,
}

impl View {
    pub const ALL: [View; 8] = [
        View::Home,
        View::SignIn,
        View::SignUp,
        View::Report,
        View::Payment,
        View::Dashboard,
        View::PrivacyPolicy,
        View::Terms,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::Home          => "/",
            Self::SignIn        => "/signin",
            Self::SignUp        => "/signup",
            Self::Report        => "/app/report",
            Self::Payment       => "/app/payment",
            Self::Dashboard     => "/app/dashboard",
            Self::PrivacyPolicy => "/privacy-policy",
            Self::Terms         => "/terms",
        }
    }

    pub fn from_path(path: &str) -> Option<View> {
        Self::ALL.into_iter().find(|v| v.path() == path)
    }

    pub fn is_protected(&self) -> bool {
        is_protected(self.path())
    }
}

pub fn is_protected(path: &str) -> bool {
    path.starts_with(PROTECTED_PREFIX)
}

/// Where a visit to `path` must be sent instead, if anywhere.
/// Paths outside `/app/` are never redirected, including unknown ones.
pub fn redirect_for(state: &FlowState, path: &str) -> Option<View> {
    if !is_protected(path) {
        return None;
    }
    let target = state.home_view();
    if path == target.path() { None } else { Some(target) }
}

/// Owns the live FlowState and keeps the persisted copy in step.
#[derive(Debug, Clone)]
pub struct FlowGuard {
    state: FlowState,
}

impl FlowGuard {
    /// Rehydrate from storage. A missing record means a fresh flow.
    pub fn load(store: &ClientStore) -> CrbResult<Self> {
        let state = store.load_flow_state()?.unwrap_or_default();
        log::debug!(
            "flow: rehydrated generated={} paid={}",
            state.has_generated_report, state.has_paid
        );
        Ok(Self { state })
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn has_generated_report(&self) -> bool {
        self.state.has_generated_report
    }

    pub fn has_paid(&self) -> bool {
        self.state.has_paid
    }

    pub fn set_has_generated_report(&mut self, store: &ClientStore, value: bool) -> CrbResult<()> {
        self.state.has_generated_report = value;
        store.save_flow_state(&self.state)
    }

    pub fn set_has_paid(&mut self, store: &ClientStore, value: bool) -> CrbResult<()> {
        self.state.has_paid = value;
        store.save_flow_state(&self.state)
    }

    pub fn apply(&mut self, store: &ClientStore, action: FlowAction) -> CrbResult<FlowState> {
        let next = self.state.apply(action);
        match action {
            FlowAction::Reset => {
                store.clear_flow_state()?;
                store.clear_report()?;
                store.clear_payment_receipt()?;
            }
            _ => store.save_flow_state(&next)?,
        }
        self.state = next;
        Ok(next)
    }

    /// Clears both flags, the cached report and any payment receipt.
    pub fn reset(&mut self, store: &ClientStore) -> CrbResult<()> {
        self.apply(store, FlowAction::Reset).map(|_| ())
    }

    pub fn redirect_for(&self, path: &str) -> Option<View> {
        redirect_for(&self.state, path)
    }
}
