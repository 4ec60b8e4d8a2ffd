//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before a JSON body of the form `{"error": "..."}` is
//! sent; upstream and cipher details never reach the client.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use multipass_relay_core::MultipassError;
use serde::Serialize;
use thiserror::Error;

use crate::otpless::OtplessError;
use crate::shopify::ShopifyError;
use crate::validation::FieldError;

/// Application-level error type for the relay.
#[derive(Debug, Error)]
pub enum AppError {
    /// One or more request fields failed validation.
    #[error("Validation failed: {} field error(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// The request body is not a JSON object.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// OTPless verification failed or was unreachable.
    #[error("OTPless error: {0}")]
    Otpless(#[from] OtplessError),

    /// Shopify customer lookup failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Shopify refused to create the customer.
    #[error("Customer creation failed: {0}")]
    CustomerCreation(#[source] ShopifyError),

    /// The verified identity belongs to a different email than the request.
    #[error("Verified email does not match the requested email")]
    IdentityMismatch,

    /// Multipass token could not be issued.
    #[error("Multipass error: {0}")]
    Multipass(#[from] MultipassError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Otpless(OtplessError::Rejected { .. }) | Self::IdentityMismatch => {
                StatusCode::UNAUTHORIZED
            }
            Self::Shopify(_) => StatusCode::BAD_GATEWAY,
            Self::Multipass(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Otpless(_) | Self::CustomerCreation(_) | Self::Multipass(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message. Never includes upstream or cipher details.
    fn public_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation failed",
            Self::InvalidBody(_) => "Invalid request body",
            Self::Otpless(OtplessError::Rejected { .. }) | Self::IdentityMismatch => {
                "Token verification failed"
            }
            Self::Otpless(_) => "Internal server error during verification",
            Self::Shopify(_) => "External service error",
            Self::CustomerCreation(_) => "Failed to create customer account",
            Self::Multipass(MultipassError::InvalidPayload(_)) => "Invalid email format",
            Self::Multipass(err) if err.is_client_error() => "Invalid Multipass token",
            Self::Multipass(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            error: self.public_message(),
            details: match self {
                Self::Validation(details) => Some(details),
                _ => None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the customer being logged in.
pub fn set_sentry_user(customer_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(customer_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for a login step.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of steps
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("shopify", "Customer created", Some(&[("customer_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
