//! Sign-up and sign-in field validation.
//!
//! Each field yields at most one message, checked in order: "required"
//! first, then the format rule. Validation never touches storage.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, sync::OnceLock};

use crate::auth::{LoginCredentials, SignupData};

fn kenyan_phone() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:\+254|0)[17][0-9]{8}$").expect("phone pattern"))
}

fn national_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{8}$").expect("id pattern"))
}

fn email_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern"))
}

/// Inline field messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    fn set(&mut self, field: &'static str, message: &str) {
        self.0.insert(field, message.to_string());
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
    pub full_name:        String,
    pub phone:            String,
    pub id_number:        String,
    pub password:         String,
    pub confirm_password: String,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.full_name.is_empty() {
            errors.set("fullName", "Full name is required");
        } else if self.full_name.chars().count() < 3 {
            errors.set("fullName", "Full name must be at least 3 characters");
        }

        if self.phone.is_empty() {
            errors.set("phone", "Phone number is required");
        } else if !kenyan_phone().is_match(&self.phone) {
            errors.set("phone", "Please enter a valid Kenyan phone number");
        }

        if self.id_number.is_empty() {
            errors.set("idNumber", "ID number is required");
        } else if !national_id().is_match(&self.id_number) {
            errors.set("idNumber", "Please enter a valid 8-digit ID number");
        }

        check_password(&mut errors, &self.password);

        if self.confirm_password.is_empty() {
            errors.set("confirmPassword", "Please confirm your password");
        } else if self.password != self.confirm_password {
            errors.set("confirmPassword", "Passwords do not match");
        }

        errors.into_result()
    }

    /// The backend requires an email; sign-up derives a placeholder
    /// from the phone digits.
    pub fn placeholder_email(&self) -> String {
        let digits: String = self.phone.chars().filter(char::is_ascii_digit).collect();
        format!("{digits}@temp.com")
    }

    pub fn to_signup_data(&self) -> SignupData {
        SignupData {
            full_name: self.full_name.clone(),
            email:     self.placeholder_email(),
            phone:     self.phone.clone(),
            id_number: self.id_number.clone(),
            password:  self.password.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignInForm {
    pub email:    String,
    pub password: String,
}

impl SignInForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.email.is_empty() {
            errors.set("email", "Email is required");
        } else if !email_shape().is_match(&self.email) {
            errors.set("email", "Please enter a valid email");
        }

        check_password(&mut errors, &self.password);

        errors.into_result()
    }

    pub fn to_credentials(&self) -> LoginCredentials {
        LoginCredentials {
            email:    self.email.clone(),
            password: self.password.clone(),
        }
    }
}

fn check_password(errors: &mut FieldErrors, password: &str) {
    if password.is_empty() {
        errors.set("password", "Password is required");
    } else if password.chars().count() < 4 {
        errors.set("password", "Password must be at least 4 characters");
    }
}
