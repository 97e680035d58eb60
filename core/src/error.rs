use thiserror::Error;

use crate::forms::FieldErrors;

#[derive(Error, Debug)]
pub enum CrbError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Auth backend rejected request ({status}): {message}")]
    AuthRejected { status: u16, message: String },

    #[error("Form validation failed: {0}")]
    Validation(FieldErrors),

    #[error("No report purpose selected")]
    NoPurposeSelected,

    #[error("Unknown report purpose '{id}'")]
    UnknownPurpose { id: String },

    #[error("No generated report found")]
    ReportNotFound,

    #[error("Report is locked until payment is confirmed")]
    ReportLocked,

    #[error("Not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CrbResult<T> = Result<T, CrbError>;
