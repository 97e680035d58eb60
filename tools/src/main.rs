//! crb-runner: headless driver for the CRB Check workflow.
//!
//! Usage:
//!   crb-runner --purpose loan --message "ABC123 Confirmed. Ksh100.00 sent to ..."
//!   crb-runner --db client.db --export report.txt --realtime
//!   crb-runner --ipc-mode

use anyhow::{Context, Result};
use crbcheck_core::{
    auth::{AuthApi, HttpAuthClient, LocalAuth},
    config::AppConfig,
    flow::View,
    forms::{SignInForm, SignUpForm},
    progress::ProgressSchedule,
    session::{DashboardView, SessionState},
    store::ClientStore,
    CrbError, CrbSession,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::time::Duration;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    State,
    Navigate { path: String },
    SignUp { form: SignUpForm },
    SignIn { form: SignInForm },
    SignOut,
    SelectPurpose { purpose: String },
    Generate,
    Pay { message: String },
    Dashboard,
    Export,
    Reset,
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    session: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    dashboard: Option<DashboardView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<serde_json::Value>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let realtime = args.iter().any(|a| a == "--realtime");
    let seed = seed_arg(&args)?;
    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = arg_value(&args, "--data-dir").unwrap_or("./data");

    let mut config = AppConfig::load(data_dir)?;
    if let Some(url) = arg_value(&args, "--auth-url") {
        config.auth.base_url = Some(url.to_string());
    }

    let auth: Box<dyn AuthApi> = match &config.auth.base_url {
        Some(url) => Box::new(HttpAuthClient::new(
            url,
            Duration::from_secs(config.auth.timeout_secs),
        )?),
        None => Box::new(LocalAuth::new()),
    };

    let store = ClientStore::open(db)?;
    let mut session = match seed {
        Some(s) => CrbSession::open_seeded(config, store, auth, s)?,
        None => CrbSession::open(config, store, auth)?,
    };

    if ipc_mode {
        run_ipc_loop(&mut session)?;
    } else {
        println!("CRB Check: crb-runner");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!("  flow_id:   {}", session.flow_id);
        println!();
        run_walkthrough(&mut session, &args, realtime)?;
    }

    Ok(())
}

fn run_walkthrough(
    session: &mut CrbSession<Box<dyn AuthApi>>,
    args: &[String],
    realtime: bool,
) -> Result<()> {
    let form = SignUpForm {
        full_name:        arg_value(args, "--name").unwrap_or("John Doe").to_string(),
        phone:            arg_value(args, "--phone").unwrap_or("0712345678").to_string(),
        id_number:        arg_value(args, "--id-number").unwrap_or("12345678").to_string(),
        password:         "crb-runner".to_string(),
        confirm_password: "crb-runner".to_string(),
    };

    let nav = session.open_sign_up()?;
    if nav.landed == View::SignUp.path() {
        play(session.sign_up_progress(), realtime, "signing up");
        let user = session.sign_up(&form)?;
        println!("signed up:     {} ({})", user.full_name, user.email);
    } else {
        println!("resuming flow: {}", nav.landed);
    }

    if !session.flow_state().has_generated_report {
        let purpose = arg_value(args, "--purpose").unwrap_or("personal");
        session.select_purpose(purpose)?;
        play(session.generation_progress(), realtime, "generating");
        if realtime {
            std::thread::sleep(session.generation_completion_delay());
        }
        let report = session.generate_report()?;
        println!("report:        {} (purpose: {purpose})", report.report_id);
    }

    if !session.flow_state().has_paid {
        let pay = session.payment_instructions();
        println!("pay:           KES {} to till {} ({})", pay.amount, pay.till_number, pay.business_name);
        let default_message = format!(
            "RUNNER01 Confirmed. Ksh{:.2} paid to {}.",
            pay.amount, pay.business_name
        );
        let message = arg_value(args, "--message").unwrap_or(&default_message).to_string();
        let result = session.submit_payment(&message)?;
        if !result.valid {
            println!("payment:       rejected: {}", result.reason.unwrap_or_default());
            return Ok(());
        }
        println!("payment:       accepted");
        if realtime {
            std::thread::sleep(session.payment_redirect_delay());
        }
    }

    print_summary(&session.dashboard()?);

    if let Some(path) = arg_value(args, "--export") {
        std::fs::write(path, session.export_report()?)?;
        println!("exported:      {path}");
    }
    Ok(())
}

fn play(schedule: ProgressSchedule, realtime: bool, label: &str) {
    let interval = schedule.interval();
    for tick in schedule {
        if realtime {
            std::thread::sleep(interval);
            print!("\r{label}: {:>5.1}%", tick.percent);
            let _ = io::stdout().flush();
        }
    }
    if realtime {
        println!();
    }
}

fn print_summary(dashboard: &DashboardView) {
    println!();
    println!("=== DASHBOARD ===");
    println!("  stage:          {:?}", dashboard.stage);
    match &dashboard.report {
        Some(r) => {
            println!("  report_id:      {}", r.report_id);
            println!("  subject:        {}", r.personal_information.full_name);
            println!("  credit score:   {}", r.credit_score);
            println!("  loan balance:   KES {}", r.total_balance());
        }
        None => println!("  (content locked until payment)"),
    }
}

fn run_ipc_loop(session: &mut CrbSession<Box<dyn AuthApi>>) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("ipc: unreadable command: {e}");
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        let reply = match handle_command(session, cmd) {
            Ok(reply) => reply,
            Err(e) => UiState {
                error: Some(error_json(&e)),
                ..bare_state(session)?
            },
        };
        writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(
    session: &mut CrbSession<Box<dyn AuthApi>>,
    cmd: IpcCommand,
) -> Result<UiState, CrbError> {
    let mut notice = None;
    let mut dashboard = None;
    let mut document = None;

    match cmd {
        IpcCommand::State | IpcCommand::Quit => {}
        IpcCommand::Navigate { path } => {
            let nav = if path == View::SignUp.path() {
                session.open_sign_up()?
            } else {
                session.navigate(&path)?
            };
            if nav.redirected {
                notice = Some(format!("redirected to {}", nav.landed));
            }
        }
        IpcCommand::SignUp { form } => {
            let user = session.sign_up(&form)?;
            notice = Some(format!("Successfully signed up as {}", user.full_name));
        }
        IpcCommand::SignIn { form } => {
            let user = session.sign_in(&form)?;
            notice = Some(format!("Successfully signed in as {}", user.full_name));
        }
        IpcCommand::SignOut => session.sign_out()?,
        IpcCommand::SelectPurpose { purpose } => session.select_purpose(&purpose)?,
        IpcCommand::Generate => {
            let report = session.generate_report()?;
            notice = Some(format!("Report {} generated", report.report_id));
        }
        IpcCommand::Pay { message } => {
            let result = session.submit_payment(&message)?;
            notice = Some(match result.reason {
                Some(reason) => reason,
                None => "Payment validated successfully!".to_string(),
            });
        }
        IpcCommand::Dashboard => dashboard = Some(session.dashboard()?),
        IpcCommand::Export => document = Some(session.export_report()?),
        IpcCommand::Reset => session.reset_flow()?,
    }

    Ok(UiState {
        session: session.state()?,
        dashboard,
        document,
        notice,
        error: None,
    })
}

fn bare_state(session: &CrbSession<Box<dyn AuthApi>>) -> Result<UiState> {
    Ok(UiState {
        session: session.state()?,
        dashboard: None,
        document: None,
        notice: None,
        error: None,
    })
}

fn error_json(e: &CrbError) -> serde_json::Value {
    match e {
        CrbError::Validation(fields) => serde_json::json!({ "fields": fields }),
        other => serde_json::json!({ "message": other.to_string() }),
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn seed_arg(args: &[String]) -> Result<Option<u64>> {
    arg_value(args, "--seed")
        .map(|raw| {
            raw.parse::<u64>()
                .with_context(|| format!("--seed expects an unsigned integer, got {raw:?}"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn seed_is_optional() {
        assert_eq!(seed_arg(&args(&["crb-runner"])).unwrap(), None);
        assert_eq!(seed_arg(&args(&["crb-runner", "--seed", "42"])).unwrap(), Some(42));
    }

    #[test]
    fn unparsable_seed_is_an_error() {
        let err = seed_arg(&args(&["crb-runner", "--seed", "abc"])).unwrap_err();
        assert!(err.to_string().contains("abc"), "{err}");
        assert!(seed_arg(&args(&["crb-runner", "--seed", "-1"])).is_err());
    }
}
