//! OTPless token verification client.
//!
//! The browser completes the OTP challenge with OTPless and hands the relay
//! an opaque token. The relay never sees the OTP itself; it only asks
//! OTPless whether the token is genuine and which identity it belongs to.
//!
//! # Example
//!
//! ```rust,ignore
//! use multipass_relay::otpless::OtplessClient;
//!
//! let client = OtplessClient::new(&config.otpless)?;
//! let user = client.verify_token(&token).await?;
//! ```

mod client;
mod types;

pub use client::OtplessClient;
pub use types::VerifiedUser;

use thiserror::Error;

/// Errors that can occur when verifying a token with OTPless.
#[derive(Debug, Error)]
pub enum OtplessError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// OTPless refused the token.
    #[error("token rejected: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// Failed to parse the verification response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Client credentials cannot be sent as headers.
    #[error("Invalid client credentials: {0}")]
    InvalidCredentials(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display() {
        let err = OtplessError::Rejected {
            status: 400,
            message: "{\"message\":\"Invalid token\"}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "token rejected: 400 - {\"message\":\"Invalid token\"}"
        );
    }
}
