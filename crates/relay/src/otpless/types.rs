//! OTPless response types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity returned by OTPless for a verified token.
///
/// Only the fields the relay acts on are typed; everything else OTPless
/// sends is kept in `extra` so it can be echoed back to the client intact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VerifiedUser {
    /// Email, if OTPless supplied a non-blank one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        non_blank(self.email.as_deref())
    }

    /// First name, if OTPless supplied a non-blank one.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        non_blank(self.first_name.as_deref())
    }

    /// Last name, if OTPless supplied a non-blank one.
    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        non_blank(self.last_name.as_deref())
    }

    /// Phone number, if OTPless supplied a non-blank one.
    #[must_use]
    pub fn phone_number(&self) -> Option<&str> {
        non_blank(self.phone_number.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
