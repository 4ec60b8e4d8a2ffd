//! Shopify Admin REST API client for customer provisioning.
//!
//! # Architecture
//!
//! - Shopify is the system of record: NO local storage, direct API calls
//! - Only the customer search and create endpoints are used
//! - Rate limits are surfaced to the caller, never retried here
//!
//! # Example
//!
//! ```rust,ignore
//! use multipass_relay::shopify::{AdminClient, NewCustomer};
//!
//! let client = AdminClient::new(&config.shopify)?;
//! let customer = client.find_customer_by_email(&email).await?;
//! ```

mod admin;
pub mod types;

pub use admin::AdminClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Access token missing, revoked, or lacking scopes.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Validation error from a create or update (HTTP 422).
    #[error("User error: {0}")]
    UserError(String),

    /// Any other non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Access token cannot be sent as a header.
    #[error("Invalid access token: {0}")]
    InvalidAccessToken(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_error() {
        let err = ShopifyError::RateLimited(2);
        assert_eq!(err.to_string(), "Rate limited, retry after 2 seconds");
    }

    #[test]
    fn test_api_error_display() {
        let err = ShopifyError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 500 - boom");
    }
}
