//! Key material derived from the Multipass secret.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use super::MultipassError;

/// AES-128 key length in bytes.
pub const KEY_LEN: usize = 16;

type HmacSha256 = Hmac<Sha256>;

/// Encryption and signing keys for one Multipass secret.
///
/// Both keys are `SHA-256(secret)[0..16]`. They are kept as separate fields
/// so each algorithm only ever reads its own key.
#[derive(Clone)]
pub struct DerivedKeys {
    encryption_key: [u8; KEY_LEN],
    signing_key: [u8; KEY_LEN],
}

impl std::fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKeys")
            .field("encryption_key", &"[REDACTED]")
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}

impl DerivedKeys {
    /// Derive both keys from the shared secret.
    ///
    /// # Errors
    ///
    /// Returns `MultipassError::Configuration` if the secret is empty.
    pub fn derive(secret: &SecretString) -> Result<Self, MultipassError> {
        let secret = secret.expose_secret();
        if secret.is_empty() {
            return Err(MultipassError::Configuration(
                "Multipass secret is empty".to_string(),
            ));
        }

        Ok(Self {
            encryption_key: truncated_digest(secret)?,
            signing_key: truncated_digest(secret)?,
        })
    }

    pub const fn encryption_key(&self) -> &[u8; KEY_LEN] {
        &self.encryption_key
    }

    /// HMAC-SHA256 of `message` under the signing key.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, MultipassError> {
        let mut mac = self.mac()?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Constant-time check of `signature` against `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), MultipassError> {
        let mut mac = self.mac()?;
        mac.update(message);
        mac.verify_slice(signature).map_err(|_| MultipassError::SignatureMismatch)
    }

    fn mac(&self) -> Result<HmacSha256, MultipassError> {
        HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|e| MultipassError::Crypto(format!("HMAC key rejected: {e}")))
    }
}

/// First [`KEY_LEN`] bytes of `SHA-256(secret)`.
fn truncated_digest(secret: &str) -> Result<[u8; KEY_LEN], MultipassError> {
    let digest = Sha256::digest(secret.as_bytes());
    digest
        .get(..KEY_LEN)
        .and_then(|prefix| <[u8; KEY_LEN]>::try_from(prefix).ok())
        .ok_or_else(|| MultipassError::Crypto("SHA-256 digest shorter than key".to_string()))
}
