//! Parsing of an issued Multipass token back into its two halves.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use super::MultipassError;

/// Separator between the ciphertext and signature inside the token.
pub const SEPARATOR: &str = "--";

/// The `cipherText--signature` pair carried inside a token.
///
/// Both halves stay in their base64 text form: the signature is computed
/// over the ciphertext's base64 string, not its raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipassEnvelope {
    cipher_text: String,
    signature: String,
}

impl MultipassEnvelope {
    /// Split a token into ciphertext and signature.
    ///
    /// # Errors
    ///
    /// Returns `MultipassError::MalformedToken` if the token is not base64,
    /// does not decode to UTF-8, or does not contain exactly one `--`.
    pub fn parse(token: &str) -> Result<Self, MultipassError> {
        let decoded = STANDARD
            .decode(token.trim())
            .map_err(|e| MultipassError::MalformedToken(format!("token is not base64: {e}")))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| MultipassError::MalformedToken("token is not UTF-8".to_string()))?;

        let mut parts = decoded.split(SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(cipher_text), Some(signature), None)
                if !cipher_text.is_empty() && !signature.is_empty() =>
            {
                Ok(Self {
                    cipher_text: cipher_text.to_string(),
                    signature: signature.to_string(),
                })
            }
            _ => Err(MultipassError::MalformedToken(format!(
                "expected exactly one `{SEPARATOR}` separator"
            ))),
        }
    }

    /// Base64 ciphertext exactly as it was signed.
    #[must_use]
    pub fn cipher_text(&self) -> &str {
        &self.cipher_text
    }

    /// Base64 HMAC-SHA256 signature.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Raw ciphertext bytes.
    pub(crate) fn cipher_bytes(&self) -> Result<Vec<u8>, MultipassError> {
        STANDARD
            .decode(&self.cipher_text)
            .map_err(|e| MultipassError::MalformedToken(format!("ciphertext is not base64: {e}")))
    }

    /// Raw signature bytes.
    pub(crate) fn signature_bytes(&self) -> Result<Vec<u8>, MultipassError> {
        STANDARD
            .decode(&self.signature)
            .map_err(|e| MultipassError::MalformedToken(format!("signature is not base64: {e}")))
    }

    #[cfg(test)]
    pub(crate) fn from_parts(cipher_text: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            cipher_text: cipher_text.into(),
            signature: signature.into(),
        }
    }
}
