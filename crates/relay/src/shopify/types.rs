//! Shopify Admin REST customer types.

use multipass_relay_core::{CustomerId, Email};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::otpless::VerifiedUser;

/// First name used when OTPless supplies none.
pub const DEFAULT_FIRST_NAME: &str = "OTPless";

/// Last name used when OTPless supplies none.
pub const DEFAULT_LAST_NAME: &str = "User";

/// A customer record as returned by the Admin REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of `POST /customers.json`.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone, Serialize)]
pub struct NewCustomer {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub verified_email: bool,
    pub password: String,
    pub password_confirmation: String,
    pub accepts_marketing: bool,
}

impl std::fmt::Debug for NewCustomer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewCustomer")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("phone", &self.phone)
            .field("verified_email", &self.verified_email)
            .field("password", &"[REDACTED]")
            .field("accepts_marketing", &self.accepts_marketing)
            .finish()
    }
}

impl NewCustomer {
    /// Build a verified customer from an OTPless identity.
    ///
    /// The email is marked verified because OTPless already proved control of
    /// the identity. A random password is set so the account is usable by the
    /// storefront's password login; it never leaves the relay.
    #[must_use]
    pub fn from_verified(email: &Email, user: &VerifiedUser) -> Self {
        let password = generate_password();

        Self {
            email: email.as_str().to_string(),
            first_name: user.first_name().unwrap_or(DEFAULT_FIRST_NAME).to_string(),
            last_name: user.last_name().unwrap_or(DEFAULT_LAST_NAME).to_string(),
            phone: user.phone_number().map(String::from),
            verified_email: true,
            password_confirmation: password.clone(),
            password,
            accepts_marketing: true,
        }
    }
}

/// 16 random bytes, hex-encoded.
fn generate_password() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// Wrapper for `GET /customers/search.json`.
#[derive(Debug, Deserialize)]
pub(crate) struct CustomerSearchResponse {
    #[serde(default)]
    pub customers: Vec<Customer>,
}

/// Wrapper for single-customer responses and requests.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CustomerEnvelope<T> {
    pub customer: T,
}

/// Error body of a 422 response: `{"errors": {"email": ["has already been taken"]}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub errors: Value,
}

impl ErrorResponse {
    /// Flatten Shopify's error shapes into `field message; field message`.
    pub fn summary(&self) -> String {
        match &self.errors {
            Value::String(message) => message.clone(),
            Value::Object(fields) => fields
                .iter()
                .map(|(field, messages)| match messages {
                    Value::Array(items) => items
                        .iter()
                        .map(|m| format!("{field} {}", value_text(m)))
                        .collect::<Vec<_>>()
                        .join("; "),
                    other => format!("{field} {}", value_text(other)),
                })
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
