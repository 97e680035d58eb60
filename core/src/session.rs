//! The client session. Drives the onboarding workflow end to end.
//!
//! WORKFLOW (linear, one pass per flow):
//!   1. sign up          → flow reset, land on /app/report
//!   2. select purpose
//!   3. generate report  → has_generated_report, land on /app/dashboard
//!   4. submit payment   → has_paid, dashboard content unlocked
//!   5. export report
//!
//! RULES:
//!   - Every navigation passes through the flow guard's redirect rule.
//!   - Every flag change re-applies the rule to the current view.
//!   - Every state-changing step appends one FlowEvent to the log.
//!   - Timed waits are handed out as ProgressSchedules; the session
//!     itself never sleeps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    auth::{AuthApi, User, UserProfile},
    config::{AppConfig, PurposeConfig},
    error::{CrbError, CrbResult},
    event::{EventLogEntry, FlowEvent},
    export::render_report,
    flow::{FlowAction, FlowGuard, FlowState, Stage, View},
    forms::{SignInForm, SignUpForm},
    payment::{parse_confirmation, PaymentReceipt, PaymentValidationResult},
    progress::ProgressSchedule,
    report::{ReportGenerator, ReportRecord},
    rng::ReportRng,
    store::ClientStore,
    types::FlowId,
};

const BLANK_MESSAGE_REASON: &str = "Please paste the M-PESA confirmation message";

/// Outcome of one navigation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    pub requested:  String,
    pub landed:     String,
    pub redirected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInstructions {
    pub amount:        f64,
    pub till_number:   String,
    pub business_name: String,
}

/// What the dashboard may show. `report` is only populated once paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub stage:            Stage,
    pub unlocked:         bool,
    pub report_available: bool,
    pub report:           Option<ReportRecord>,
    pub receipt:          Option<PaymentReceipt>,
    pub payment:          PaymentInstructions,
}

/// Serializable snapshot of the session for UI shells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub flow_id:          FlowId,
    pub current_path:     String,
    pub flow:             FlowState,
    pub stage:            Stage,
    pub signed_up:        bool,
    pub signed_in:        bool,
    pub selected_purpose: Option<String>,
}

pub struct CrbSession<A: AuthApi> {
    pub flow_id:      FlowId,
    config:           AppConfig,
    store:            ClientStore,
    guard:            FlowGuard,
    auth:             A,
    rng:              ReportRng,
    current:          String,
    selected_purpose: Option<String>,
}

impl<A: AuthApi> CrbSession<A> {
    /// Open a session with an entropy-seeded report RNG.
    pub fn open(config: AppConfig, store: ClientStore, auth: A) -> CrbResult<Self> {
        Self::with_rng(config, store, auth, ReportRng::from_entropy())
    }

    /// Open a session whose generated reports are reproducible.
    pub fn open_seeded(config: AppConfig, store: ClientStore, auth: A, seed: u64) -> CrbResult<Self> {
        Self::with_rng(config, store, auth, ReportRng::new(seed))
    }

    fn with_rng(config: AppConfig, store: ClientStore, auth: A, rng: ReportRng) -> CrbResult<Self> {
        config.timing.validate()?;
        store.migrate()?;
        let guard = FlowGuard::load(&store)?;
        let flow_id = uuid::Uuid::new_v4().to_string();
        log::info!(
            "session {flow_id}: opened (stage={:?}, seed={})",
            guard.state().stage(),
            rng.seed()
        );
        Ok(Self {
            flow_id,
            config,
            store,
            guard,
            auth,
            rng,
            current: View::Home.path().to_string(),
            selected_purpose: None,
        })
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &ClientStore {
        &self.store
    }

    pub fn flow_state(&self) -> FlowState {
        self.guard.state()
    }

    pub fn current_path(&self) -> &str {
        &self.current
    }

    pub fn current_view(&self) -> Option<View> {
        View::from_path(&self.current)
    }

    pub fn selected_purpose(&self) -> Option<&str> {
        self.selected_purpose.as_deref()
    }

    pub fn purposes(&self) -> &[PurposeConfig] {
        &self.config.purposes
    }

    pub fn state(&self) -> CrbResult<SessionState> {
        let flow = self.guard.state();
        Ok(SessionState {
            flow_id:          self.flow_id.clone(),
            current_path:     self.current.clone(),
            flow,
            stage:            flow.stage(),
            signed_up:        self.store.is_signed_up()?,
            signed_in:        self.store.token()?.is_some(),
            selected_purpose: self.selected_purpose.clone(),
        })
    }

    pub fn events(&self) -> CrbResult<Vec<EventLogEntry>> {
        self.store.events_for_flow(&self.flow_id)
    }

    fn record(&self, event: FlowEvent) -> CrbResult<()> {
        log::debug!("session {}: {}", self.flow_id, event.type_name());
        self.store.append_event(&self.flow_id, &event)
    }

    // ── Navigation ─────────────────────────────────────────────

    pub fn navigate(&mut self, path: &str) -> CrbResult<Navigation> {
        let nav = match self.guard.redirect_for(path) {
            Some(target) => {
                log::info!("session {}: {path} redirected to {}", self.flow_id, target.path());
                self.record(FlowEvent::Redirected {
                    requested: path.to_string(),
                    landed:    target,
                })?;
                Navigation {
                    requested:  path.to_string(),
                    landed:     target.path().to_string(),
                    redirected: true,
                }
            }
            None => Navigation {
                requested:  path.to_string(),
                landed:     path.to_string(),
                redirected: false,
            },
        };
        self.current = nav.landed.clone();
        Ok(nav)
    }

    pub fn navigate_to(&mut self, view: View) -> CrbResult<Navigation> {
        self.navigate(view.path())
    }

    /// Re-apply the redirect rule to the current view after a flag change.
    fn settle(&mut self) -> CrbResult<Navigation> {
        let here = self.current.clone();
        self.navigate(&here)
    }

    // ── Account ────────────────────────────────────────────────

    /// Visiting the sign-up page after having signed up resumes the flow
    /// instead of showing the form again.
    pub fn open_sign_up(&mut self) -> CrbResult<Navigation> {
        if self.store.is_signed_up()? {
            let resume = self.guard.state().home_view();
            return self.navigate_to(resume);
        }
        self.navigate_to(View::SignUp)
    }

    pub fn sign_up_progress(&self) -> ProgressSchedule {
        ProgressSchedule::sign_up(&self.config.timing)
    }

    pub fn sign_up(&mut self, form: &SignUpForm) -> CrbResult<User> {
        form.validate().map_err(CrbError::Validation)?;

        let response = self.auth.signup(&form.to_signup_data())?;
        self.store.save_token(&response.token)?;
        self.store.save_profile(&UserProfile {
            full_name: form.full_name.clone(),
            phone:     form.phone.clone(),
            id_number: form.id_number.clone(),
        })?;
        self.store.set_signed_up()?;

        // A new account always starts a new flow.
        self.guard.reset(&self.store)?;
        self.selected_purpose = None;

        self.record(FlowEvent::SignedUp { user_id: response.user.id.clone() })?;
        log::info!("session {}: signed up {}", self.flow_id, response.user.id);

        self.navigate_to(View::Report)?;
        Ok(response.user)
    }

    pub fn sign_in(&mut self, form: &SignInForm) -> CrbResult<User> {
        form.validate().map_err(CrbError::Validation)?;

        let response = self.auth.login(&form.to_credentials())?;
        self.store.save_token(&response.token)?;
        self.record(FlowEvent::SignedIn { user_id: response.user.id.clone() })?;
        log::info!("session {}: signed in {}", self.flow_id, response.user.id);

        self.navigate_to(View::Dashboard)?;
        Ok(response.user)
    }

    pub fn sign_out(&mut self) -> CrbResult<()> {
        let token = self.store.token()?;
        self.auth.logout(token.as_deref())?;
        self.store.clear_token()?;
        self.record(FlowEvent::SignedOut)?;
        self.navigate_to(View::Home)?;
        Ok(())
    }

    pub fn current_user(&self) -> CrbResult<User> {
        let token = self.store.token()?.ok_or(CrbError::NotSignedIn)?;
        self.auth.current_user(&token)
    }

    // ── Report ─────────────────────────────────────────────────

    pub fn select_purpose(&mut self, purpose_id: &str) -> CrbResult<()> {
        if self.config.purpose(purpose_id).is_none() {
            return Err(CrbError::UnknownPurpose { id: purpose_id.to_string() });
        }
        self.selected_purpose = Some(purpose_id.to_string());
        self.record(FlowEvent::PurposeSelected { purpose: purpose_id.to_string() })
    }

    pub fn generation_progress(&self) -> ProgressSchedule {
        ProgressSchedule::generation(&self.config.timing)
    }

    /// Pause between the final progress tick and landing on the dashboard.
    pub fn generation_completion_delay(&self) -> Duration {
        Duration::from_millis(self.config.timing.generation_completion_delay_ms)
    }

    pub fn generate_report(&mut self) -> CrbResult<ReportRecord> {
        self.generate_report_at(Utc::now())
    }

    /// Generate with an explicit clock. At most one report per flow: once
    /// a report exists the cached one is returned unchanged.
    pub fn generate_report_at(&mut self, now: DateTime<Utc>) -> CrbResult<ReportRecord> {
        if self.guard.has_generated_report() {
            if let Some(existing) = self.store.load_report()? {
                log::warn!(
                    "session {}: report {} already generated for this flow",
                    self.flow_id, existing.report_id
                );
                self.settle()?;
                return Ok(existing);
            }
        }

        let purpose = self
            .selected_purpose
            .clone()
            .ok_or(CrbError::NoPurposeSelected)?;
        let profile = self.store.load_profile()?;

        let report = ReportGenerator::generate(&mut self.rng, profile.as_ref(), &purpose, now);
        self.store.save_report(&report)?;
        self.guard.apply(&self.store, FlowAction::ReportGenerated)?;

        self.record(FlowEvent::ReportGenerated {
            report_id:    report.report_id.clone(),
            credit_score: report.credit_score,
        })?;
        log::info!(
            "session {}: generated {} (purpose={purpose}, score={})",
            self.flow_id, report.report_id, report.credit_score
        );

        self.navigate_to(View::Dashboard)?;
        Ok(report)
    }

    // ── Payment ────────────────────────────────────────────────

    pub fn payment_instructions(&self) -> PaymentInstructions {
        PaymentInstructions {
            amount:        self.config.payment.amount,
            till_number:   self.config.payment.till_number.clone(),
            business_name: self.config.payment.business_name.clone(),
        }
    }

    /// Pause between an accepted payment and landing on the dashboard.
    pub fn payment_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.config.timing.payment_redirect_delay_ms)
    }

    /// Check a pasted confirmation message. A rejection is a normal
    /// outcome, not an error, and leaves every flag untouched.
    pub fn submit_payment(&mut self, message: &str) -> CrbResult<PaymentValidationResult> {
        if message.trim().is_empty() {
            self.record(FlowEvent::PaymentRejected { reason: BLANK_MESSAGE_REASON.into() })?;
            return Ok(PaymentValidationResult::rejected(BLANK_MESSAGE_REASON));
        }

        let payment = &self.config.payment;
        match parse_confirmation(message, payment.amount, &payment.business_name) {
            Ok(receipt) => {
                // Receipt first: a stored has_paid always has a receipt.
                self.store.save_payment_receipt(&receipt)?;
                self.guard.apply(&self.store, FlowAction::PaymentConfirmed)?;
                self.record(FlowEvent::PaymentAccepted {
                    transaction_code: receipt.transaction_code.clone(),
                    amount:           receipt.amount,
                })?;
                log::info!(
                    "session {}: payment {} accepted (KES {})",
                    self.flow_id, receipt.transaction_code, receipt.amount
                );
                self.navigate_to(View::Dashboard)?;
                Ok(PaymentValidationResult::accepted())
            }
            Err(rejection) => {
                log::info!("session {}: payment rejected: {rejection}", self.flow_id);
                self.record(FlowEvent::PaymentRejected { reason: rejection.to_string() })?;
                Ok(PaymentValidationResult::from(&rejection))
            }
        }
    }

    // ── Dashboard ──────────────────────────────────────────────

    pub fn dashboard(&self) -> CrbResult<DashboardView> {
        let flow = self.guard.state();
        let unlocked = flow.content_unlocked();
        let cached = self.store.load_report()?;
        Ok(DashboardView {
            stage:            flow.stage(),
            unlocked,
            report_available: cached.is_some(),
            report:           if unlocked { cached } else { None },
            receipt:          self.store.load_payment_receipt()?,
            payment:          self.payment_instructions(),
        })
    }

    pub fn export_report(&self) -> CrbResult<String> {
        if !self.guard.has_paid() {
            return Err(CrbError::ReportLocked);
        }
        let report = self.store.load_report()?.ok_or(CrbError::ReportNotFound)?;
        self.record(FlowEvent::ReportExported { report_id: report.report_id.clone() })?;
        Ok(render_report(&report))
    }

    // ── Reset ──────────────────────────────────────────────────

    pub fn reset_flow(&mut self) -> CrbResult<()> {
        self.guard.reset(&self.store)?;
        self.selected_purpose = None;
        self.record(FlowEvent::FlowReset)?;
        log::info!("session {}: flow reset", self.flow_id);
        self.settle()?;
        Ok(())
    }
}
