//! Customer identity payload embedded in a Multipass token.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::MultipassError;
use crate::types::Email;

/// The customer identity carried inside a Multipass token.
///
/// Serializes to the three snake_case fields the storefront decodes, in a
/// fixed order. `created_at` is stamped when the payload is built and lets
/// the storefront reject stale tokens, so a payload is built once per login
/// and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerIdentityPayload {
    email: Email,
    #[serde(serialize_with = "serialize_millis")]
    created_at: DateTime<Utc>,
    return_to: String,
}

impl CustomerIdentityPayload {
    /// Build a payload stamped with the current instant.
    ///
    /// # Errors
    ///
    /// Returns `MultipassError::InvalidPayload` if `email` is empty or malformed.
    pub fn new(email: &str, return_to: impl Into<String>) -> Result<Self, MultipassError> {
        let email = Email::parse(email)?;
        Ok(Self::with_created_at(email, Utc::now(), return_to))
    }

    /// Build a payload with an explicit timestamp.
    #[must_use]
    pub fn with_created_at(
        email: Email,
        created_at: DateTime<Utc>,
        return_to: impl Into<String>,
    ) -> Self {
        Self {
            email,
            created_at,
            return_to: return_to.into(),
        }
    }

    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn return_to(&self) -> &str {
        &self.return_to
    }

    /// Compact JSON bytes in the exact shape the storefront decodes.
    ///
    /// # Errors
    ///
    /// Returns `MultipassError::Crypto` if serialization fails; the token
    /// cannot be produced without it.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, MultipassError> {
        serde_json::to_vec(self)
            .map_err(|e| MultipassError::Crypto(format!("payload serialization failed: {e}")))
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-01-01T00:00:00.000Z`.
fn serialize_millis<S: Serializer>(
    value: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::EmailError;

    fn fixed_payload() -> CustomerIdentityPayload {
        CustomerIdentityPayload::with_created_at(
            Email::parse("a@b.com").unwrap(),
            "2024-01-01T00:00:00Z".parse().unwrap(),
            "https://shop.example.com/account",
        )
    }

    #[test]
    fn test_canonical_json_shape() {
        let json = String::from_utf8(fixed_payload().to_canonical_json().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"email":"a@b.com","created_at":"2024-01-01T00:00:00.000Z","return_to":"https://shop.example.com/account"}"#
        );
    }

    #[test]
    fn test_created_at_keeps_milliseconds() {
        let payload = CustomerIdentityPayload::with_created_at(
            Email::parse("a@b.com").unwrap(),
            "2024-06-15T12:30:45.123456Z".parse().unwrap(),
            "https://shop.example.com/account",
        );
        let json = String::from_utf8(payload.to_canonical_json().unwrap()).unwrap();
        assert!(json.contains(r#""created_at":"2024-06-15T12:30:45.123Z""#));
    }

    #[test]
    fn test_canonical_json_round_trips() {
        let payload = fixed_payload();
        let parsed: CustomerIdentityPayload =
            serde_json::from_slice(&payload.to_canonical_json().unwrap()).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn test_new_rejects_bad_email() {
        assert!(matches!(
            CustomerIdentityPayload::new("", "https://shop.example.com/account"),
            Err(MultipassError::InvalidPayload(EmailError::Empty))
        ));
        assert!(matches!(
            CustomerIdentityPayload::new("not-an-email", "https://shop.example.com/account"),
            Err(MultipassError::InvalidPayload(EmailError::MissingAtSymbol))
        ));
    }

    #[test]
    fn test_new_accepts_valid_email() {
        let payload =
            CustomerIdentityPayload::new("user@example.com", "https://shop.example.com/account")
                .unwrap();
        assert_eq!(payload.email().as_str(), "user@example.com");
        assert_eq!(payload.return_to(), "https://shop.example.com/account");
    }

    #[test]
    fn test_new_stamps_current_time() {
        let before = Utc::now();
        let payload =
            CustomerIdentityPayload::new("user@example.com", "https://shop.example.com/account")
                .unwrap();
        let after = Utc::now();
        assert!(payload.created_at() >= before && payload.created_at() <= after);
    }
}
