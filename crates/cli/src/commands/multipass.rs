//! Multipass token commands.
//!
//! # Usage
//!
//! ```bash
//! mp-cli multipass generate -e user@example.com
//! mp-cli multipass verify -t <token-or-url>
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPIFY_MULTIPASS_SECRET` - Multipass secret from the Shopify admin
//! - `SHOPIFY_STOREFRONT_URL` - Customer-facing domain (falls back to
//!   `SHOPIFY_STORE_URL`)

use multipass_relay_core::{
    CustomerIdentityPayload, MultipassEnvelope, MultipassError, MultipassGenerator, MultipassToken,
};
use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur in Multipass commands.
#[derive(Debug, Error)]
pub enum MultipassCommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Token generation or verification failed.
    #[error(transparent)]
    Multipass(#[from] MultipassError),

    /// The token is not valid percent-encoding.
    #[error("Token is not valid percent-encoded UTF-8")]
    InvalidEncoding,
}

/// Generate a token for `email` and print it with its login URL.
///
/// # Errors
///
/// Returns an error if the environment is incomplete or the email is invalid.
pub fn generate(email: &str, return_to: Option<&str>) -> Result<(), MultipassCommandError> {
    let generator = generator_from_env()?;
    let login = issue(&generator, email, return_to)?;

    #[allow(clippy::print_stdout)]
    {
        println!("token: {}", login.token);
        println!("url:   {}", login.url);
    }

    tracing::info!("Multipass token generated");
    Ok(())
}

/// Check that a token, or a login URL carrying one, was signed with the
/// configured secret.
///
/// # Errors
///
/// Returns `MultipassError::SignatureMismatch` if the signature is wrong and
/// `MultipassError::MalformedToken` if the token has the wrong shape.
pub fn verify(token_or_url: &str) -> Result<(), MultipassCommandError> {
    let generator = generator_from_env()?;
    check(&generator, token_or_url)?;

    #[allow(clippy::print_stdout)]
    {
        println!("Signature valid");
    }

    Ok(())
}

fn issue(
    generator: &MultipassGenerator,
    email: &str,
    return_to: Option<&str>,
) -> Result<MultipassToken, MultipassError> {
    let payload = match return_to {
        Some(return_to) => CustomerIdentityPayload::new(email, return_to)?,
        None => generator.payload_for(email)?,
    };
    generator.generate(&payload)
}

fn check(generator: &MultipassGenerator, token_or_url: &str) -> Result<(), MultipassCommandError> {
    let token = extract_token(token_or_url)?;
    let envelope = MultipassEnvelope::parse(&token)?;
    generator.verify(&envelope)?;
    Ok(())
}

/// Accept a bare token or anything ending in `/<percent-encoded token>`.
fn extract_token(input: &str) -> Result<String, MultipassCommandError> {
    let input = input.trim();
    if !input.contains("://") {
        return Ok(input.to_string());
    }

    let encoded = input.rsplit('/').next().unwrap_or_default();
    urlencoding::decode(encoded)
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| MultipassCommandError::InvalidEncoding)
}

fn generator_from_env() -> Result<MultipassGenerator, MultipassCommandError> {
    dotenvy::dotenv().ok();

    let secret = std::env::var("SHOPIFY_MULTIPASS_SECRET")
        .map_err(|_| MultipassCommandError::MissingEnvVar("SHOPIFY_MULTIPASS_SECRET"))?;
    let storefront_url = std::env::var("SHOPIFY_STOREFRONT_URL")
        .or_else(|_| std::env::var("SHOPIFY_STORE_URL"))
        .map_err(|_| MultipassCommandError::MissingEnvVar("SHOPIFY_STORE_URL"))?;

    Ok(MultipassGenerator::new(
        &SecretString::from(secret),
        &storefront_url,
    )?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn generator(secret: &str) -> MultipassGenerator {
        MultipassGenerator::new(&SecretString::from(secret), "https://shop.example.com/").unwrap()
    }

    #[test]
    fn test_issue_then_check_url() {
        let generator = generator("mp-secret-0123456789abcdef");
        let login = issue(&generator, "user@example.com", None).unwrap();

        assert!(
            login
                .url
                .starts_with("https://shop.example.com/account/login/multipass/")
        );
        assert!(check(&generator, &login.url).is_ok());
        assert!(check(&generator, &login.token).is_ok());
    }

    #[test]
    fn test_issue_custom_return_to() {
        let generator = generator("mp-secret-0123456789abcdef");
        let return_to = Some("https://shop.example.com/cart");
        assert!(issue(&generator, "user@example.com", return_to).is_ok());
    }

    #[test]
    fn test_issue_invalid_email() {
        let generator = generator("mp-secret-0123456789abcdef");
        assert!(matches!(
            issue(&generator, "not-an-email", None),
            Err(MultipassError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_check_other_secret() {
        let login = issue(&generator("secret-one-abcdef"), "user@example.com", None).unwrap();
        let result = check(&generator("secret-two-abcdef"), &login.url);

        assert!(matches!(
            result,
            Err(MultipassCommandError::Multipass(
                MultipassError::SignatureMismatch
            ))
        ));
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(extract_token("  abc== ").unwrap(), "abc==");
        assert_eq!(
            extract_token("https://shop.example.com/account/login/multipass/YWJj%3D%3D").unwrap(),
            "YWJj=="
        );
    }
}
