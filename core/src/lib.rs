//! CRB Check core: the client-side credit report workflow.
//!
//! The session walks a user from sign-up through purpose selection, mock
//! report generation and pasted M-PESA payment to the unlocked dashboard.
//! Navigation under `/app/` is gated by the flow guard; all client state
//! lives in a SQLite-backed key/value store.

pub mod auth;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod flow;
pub mod forms;
pub mod payment;
pub mod progress;
pub mod report;
pub mod rng;
pub mod session;
pub mod store;
pub mod types;

pub use error::{CrbError, CrbResult};
pub use session::CrbSession;
