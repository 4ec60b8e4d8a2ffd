//! Input validation for auth request bodies.
//!
//! Bodies arrive as loose JSON so that a wrong type yields a field error
//! instead of a generic deserialization failure. Every field is checked and
//! all failures are reported together.

use multipass_relay_core::Email;
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;

const TOKEN_REQUIRED: &str = "Token is required";
const TOKEN_NOT_STRING: &str = "Token must be a string";
const EMAIL_REQUIRED: &str = "Email is required";
const EMAIL_INVALID: &str = "Invalid email format";

/// A single failed field check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    #[must_use]
    pub const fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// Validated body of `POST /api/auth/otpless`.
#[derive(Debug)]
pub struct VerifyTokenRequest {
    pub token: String,
}

impl VerifyTokenRequest {
    /// Validate a raw JSON body.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing every failed field.
    pub fn from_json(body: &Value) -> Result<Self, AppError> {
        let token = validate_token(body.get("token")).map_err(|e| AppError::Validation(vec![e]))?;
        Ok(Self { token })
    }
}

/// Validated body of `POST /api/auth/shopify/customer`.
#[derive(Debug)]
pub struct CustomerLoginRequest {
    pub email: Email,
    pub token: String,
}

impl CustomerLoginRequest {
    /// Validate a raw JSON body.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing every failed field.
    pub fn from_json(body: &Value) -> Result<Self, AppError> {
        match (
            validate_email(body.get("email")),
            validate_token(body.get("token")),
        ) {
            (Ok(email), Ok(token)) => Ok(Self { email, token }),
            (email, token) => Err(AppError::Validation(
                email.err().into_iter().chain(token.err()).collect(),
            )),
        }
    }
}

/// Required, trimmed, string-typed token.
fn validate_token(value: Option<&Value>) -> Result<String, FieldError> {
    match value {
        None | Some(Value::Null) => Err(FieldError::new("token", TOKEN_REQUIRED)),
        Some(Value::String(token)) => {
            let token = token.trim();
            if token.is_empty() {
                Err(FieldError::new("token", TOKEN_REQUIRED))
            } else {
                Ok(token.to_string())
            }
        }
        Some(_) => Err(FieldError::new("token", TOKEN_NOT_STRING)),
    }
}

/// Required, trimmed, syntactically valid email.
fn validate_email(value: Option<&Value>) -> Result<Email, FieldError> {
    match value {
        None | Some(Value::Null) => Err(FieldError::new("email", EMAIL_REQUIRED)),
        Some(Value::String(email)) if email.trim().is_empty() => {
            Err(FieldError::new("email", EMAIL_REQUIRED))
        }
        Some(Value::String(email)) => {
            Email::parse(email.trim()).map_err(|_| FieldError::new("email", EMAIL_INVALID))
        }
        Some(_) => Err(FieldError::new("email", EMAIL_INVALID)),
    }
}
