//! M-PESA confirmation-message validation.
//!
//! The pasted message is checked in a fixed order and the first failing
//! check decides the outcome:
//!   1. leading transaction code (uppercase letters / digits)
//!   2. a `Ksh` amount somewhere in the text
//!   3. that amount equals the expected price exactly
//!   4. the recipient business name appears verbatim
//!
//! This is a string heuristic only. Nothing here talks to a payment
//! provider, and a hand-typed message that matches will pass.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

fn code_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z0-9]+").expect("code pattern"))
}

fn ksh_amount() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Ksh\s*([0-9]+(?:\.[0-9]{2})?)").expect("amount pattern"))
}

/// Why a confirmation message was refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaymentRejection {
    #[error("Invalid M-PESA message format")]
    InvalidFormat,

    #[error("Could not find payment amount in message")]
    AmountNotFound,

    #[error("Payment amount must be KES {expected}")]
    WrongAmount { expected: f64, found: f64 },

    #[error("Invalid payment recipient")]
    InvalidRecipient,
}

/// What an accepted message yielded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub transaction_code: String,
    pub amount:           f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentValidationResult {
    pub valid:  bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PaymentValidationResult {
    pub fn accepted() -> Self {
        Self { valid: true, reason: None }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self { valid: false, reason: Some(reason.into()) }
    }
}

impl From<&PaymentRejection> for PaymentValidationResult {
    fn from(rejection: &PaymentRejection) -> Self {
        Self::rejected(rejection.to_string())
    }
}

/// The leading code run, if the message starts with one.
pub fn transaction_code(message: &str) -> Option<&str> {
    code_prefix().find(message).map(|m| m.as_str())
}

/// First `Ksh` amount in the message. A fraction is only taken when it
/// has exactly two digits; `Ksh100.5` reads as 100.
pub fn extract_amount(message: &str) -> Option<f64> {
    ksh_amount()
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Case-sensitive substring match on the recipient name.
pub fn names_recipient(message: &str, recipient: &str) -> bool {
    message.contains(recipient)
}

pub fn parse_confirmation(
    message:         &str,
    expected_amount: f64,
    recipient:       &str,
) -> Result<PaymentReceipt, PaymentRejection> {
    let code = transaction_code(message).ok_or(PaymentRejection::InvalidFormat)?;
    let amount = extract_amount(message).ok_or(PaymentRejection::AmountNotFound)?;

    if amount != expected_amount {
        return Err(PaymentRejection::WrongAmount { expected: expected_amount, found: amount });
    }
    if !names_recipient(message, recipient) {
        return Err(PaymentRejection::InvalidRecipient);
    }

    Ok(PaymentReceipt {
        transaction_code: code.to_string(),
        amount,
    })
}

pub fn validate(message: &str, expected_amount: f64, recipient: &str) -> PaymentValidationResult {
    match parse_confirmation(message, expected_amount, recipient) {
        Ok(_) => PaymentValidationResult::accepted(),
        Err(rejection) => PaymentValidationResult::from(&rejection),
    }
}
