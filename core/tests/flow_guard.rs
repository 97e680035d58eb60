//! Flow guard tests: redirect rule, persistence and reset.

use crbcheck_core::{
    auth::LocalAuth,
    config::AppConfig,
    flow::{FlowAction, FlowGuard, FlowState, View},
    store::ClientStore,
    CrbSession,
};

fn session(seed: u64) -> CrbSession<LocalAuth> {
    let store = ClientStore::in_memory().expect("in-memory store");
    CrbSession::open_seeded(AppConfig::default_test(), store, LocalAuth::new(), seed)
        .expect("open session")
}

#[test]
fn fresh_flow_sends_dashboard_visits_to_generation() {
    let mut s = session(1);
    let nav = s.navigate("/app/dashboard").unwrap();
    assert!(nav.redirected);
    assert_eq!(nav.landed, "/app/report");
    assert_eq!(s.current_view(), Some(View::Report));
}

#[test]
fn generated_flow_sends_generation_visits_to_dashboard() {
    let mut s = session(2);
    s.select_purpose("loan").unwrap();
    s.generate_report().unwrap();
    assert_eq!(s.current_path(), "/app/dashboard");

    for path in ["/app/report", "/app/payment", "/app/other"] {
        let nav = s.navigate(path).unwrap();
        assert!(nav.redirected, "{path} not redirected");
        assert_eq!(nav.landed, "/app/dashboard");
    }
}

#[test]
fn public_views_are_reachable_in_any_state() {
    let mut s = session(3);
    for v in [View::Home, View::SignIn, View::Terms, View::PrivacyPolicy] {
        assert!(!s.navigate_to(v).unwrap().redirected);
    }
    s.select_purpose("legal").unwrap();
    s.generate_report().unwrap();
    for v in [View::Home, View::SignUp, View::Terms] {
        assert!(!s.navigate_to(v).unwrap().redirected);
    }
}

#[test]
fn reset_clears_flags_report_and_returns_to_generation() {
    let mut s = session(4);
    s.select_purpose("business").unwrap();
    s.generate_report().unwrap();
    s.submit_payment("ABC123 Confirmed. Ksh100.00 sent to FOOTBALL HIGHWAY ENTERPRISES.")
        .unwrap();
    assert!(s.flow_state().has_paid);

    s.reset_flow().unwrap();
    assert_eq!(s.flow_state(), FlowState::fresh());
    assert!(s.store().load_report().unwrap().is_none());
    assert!(s.store().load_payment_receipt().unwrap().is_none());
    // Reset re-applies the rule to the dashboard we were on.
    assert_eq!(s.current_path(), "/app/report");

    let nav = s.navigate("/app/dashboard").unwrap();
    assert_eq!(nav.landed, "/app/report");
}

#[test]
fn every_flag_change_is_persisted() {
    let store = ClientStore::in_memory().unwrap();
    store.migrate().unwrap();
    let mut guard = FlowGuard::load(&store).unwrap();
    assert_eq!(guard.state(), FlowState::fresh());

    guard.set_has_generated_report(&store, true).unwrap();
    assert_eq!(store.load_flow_state().unwrap().unwrap().has_generated_report, true);

    guard.set_has_paid(&store, true).unwrap();
    let persisted = store.load_flow_state().unwrap().unwrap();
    assert_eq!(persisted, guard.state());

    guard.apply(&store, FlowAction::Reset).unwrap();
    assert_eq!(store.load_flow_state().unwrap(), None);
}

#[test]
fn flow_state_survives_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("client.db");
    let db = db.to_str().unwrap();

    {
        let store = ClientStore::open(db).unwrap();
        let mut s =
            CrbSession::open_seeded(AppConfig::default_test(), store, LocalAuth::new(), 5).unwrap();
        s.select_purpose("housing").unwrap();
        s.generate_report().unwrap();
    }

    let store = ClientStore::open(db).unwrap();
    let mut s =
        CrbSession::open_seeded(AppConfig::default_test(), store, LocalAuth::new(), 5).unwrap();
    assert!(s.flow_state().has_generated_report);
    assert!(!s.flow_state().has_paid);
    assert_eq!(s.navigate("/app/report").unwrap().landed, "/app/dashboard");
}

#[test]
fn paid_flag_reopens_with_its_receipt() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("client.db");
    let db = db.to_str().unwrap();

    {
        let store = ClientStore::open(db).unwrap();
        let mut s =
            CrbSession::open_seeded(AppConfig::default_test(), store, LocalAuth::new(), 8).unwrap();
        s.select_purpose("loan").unwrap();
        s.generate_report().unwrap();
        let result = s
            .submit_payment("QX9 Confirmed. Ksh100.00 sent to FOOTBALL HIGHWAY ENTERPRISES.")
            .unwrap();
        assert!(result.valid);
    }

    let store = ClientStore::open(db).unwrap();
    assert!(store.load_flow_state().unwrap().unwrap().has_paid);
    let receipt = store.load_payment_receipt().unwrap().expect("receipt stored with has_paid");
    assert_eq!(receipt.transaction_code, "QX9");
    assert_eq!(receipt.amount, 100.0);
}

#[test]
fn corrupted_flow_record_reads_as_fresh() {
    let store = ClientStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.set_raw("user_flow_state", "{not json").unwrap();

    let guard = FlowGuard::load(&store).unwrap();
    assert_eq!(guard.state(), FlowState::fresh());
}

#[test]
fn partial_flow_record_keeps_the_flags_it_has() {
    let store = ClientStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.set_raw("user_flow_state", r#"{"hasGeneratedReport":true}"#).unwrap();

    let guard = FlowGuard::load(&store).unwrap();
    assert!(guard.has_generated_report());
    assert!(!guard.has_paid());
    assert_eq!(guard.redirect_for("/app/report"), Some(View::Dashboard));
}

/// Payment is accepted even before a report exists; the flags are not
/// cross-checked.
#[test]
fn payment_flag_is_independent_of_generation() {
    let mut s = session(6);
    let result = s
        .submit_payment("ABC123 Confirmed. Ksh100.00 sent to FOOTBALL HIGHWAY ENTERPRISES.")
        .unwrap();
    assert!(result.valid);
    assert!(s.flow_state().has_paid);
    assert!(!s.flow_state().has_generated_report);
    assert_eq!(s.current_path(), "/app/report");
}
