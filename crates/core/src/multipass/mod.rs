//! Shopify Multipass token generation.
//!
//! A Multipass token lets a customer verified elsewhere (here: by OTPless)
//! land on the storefront already logged in. The storefront reverses the
//! encoding itself, so every step below is a wire contract:
//!
//! ```text
//! json       = {"email":..,"created_at":..,"return_to":..}   (compact, in this order)
//! key        = SHA-256(secret)[0..16]                         (encryption AND signing)
//! cipherText = base64(AES-128-CBC(key, random iv, PKCS#7(json)))
//! signature  = base64(HMAC-SHA256(key, cipherText as ASCII))
//! token      = base64(cipherText + "--" + signature)
//! url        = <storefront>/account/login/multipass/<percent-encoded token>
//! ```
//!
//! The same derived key is used for AES and HMAC. The consuming decoder
//! expects exactly that, so the two keys must stay numerically identical.
//!
//! # Example
//!
//! ```
//! use multipass_relay_core::MultipassGenerator;
//! use secrecy::SecretString;
//!
//! let generator = MultipassGenerator::new(
//!     &SecretString::from("0f1e2d3c4b5a69788796a5b4c3d2e1f0"),
//!     "https://shop.example.com",
//! )?;
//!
//! let payload = generator.payload_for("user@example.com")?;
//! let login = generator.generate(&payload)?;
//! assert!(login.url.starts_with("https://shop.example.com/account/login/multipass/"));
//! # Ok::<(), multipass_relay_core::MultipassError>(())
//! ```

mod envelope;
mod generator;
mod keys;
mod payload;

pub use envelope::MultipassEnvelope;
pub use generator::{IV_LEN, MultipassGenerator, MultipassToken};
pub use payload::CustomerIdentityPayload;

use thiserror::Error;

use crate::types::EmailError;

/// Errors that can occur while building or inspecting a Multipass token.
#[derive(Debug, Error)]
pub enum MultipassError {
    /// The customer email is missing or malformed.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] EmailError),

    /// The shared secret or storefront URL is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Key derivation, IV generation, or a cipher/HMAC step failed.
    #[error("crypto failure: {0}")]
    Crypto(String),

    /// The token does not have the `base64(cipherText--signature)` shape.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The signature does not match the ciphertext.
    #[error("signature mismatch")]
    SignatureMismatch,
}

impl MultipassError {
    /// Whether the error was caused by caller input rather than operator
    /// configuration or a cipher fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPayload(_) | Self::MalformedToken(_) | Self::SignatureMismatch
        )
    }
}
