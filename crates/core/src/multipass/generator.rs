//! Multipass token generator.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use rand::TryRngCore;
use rand::rngs::OsRng;
use secrecy::SecretString;
use serde::Serialize;

use super::envelope::{MultipassEnvelope, SEPARATOR};
use super::keys::DerivedKeys;
use super::{CustomerIdentityPayload, MultipassError};

/// AES block size, and therefore the IV length, in bytes.
pub const IV_LEN: usize = 16;

/// Storefront path that consumes Multipass tokens.
const LOGIN_PATH: &str = "/account/login/multipass/";

/// Landing page embedded as `return_to` by [`MultipassGenerator::payload_for`].
const ACCOUNT_PATH: &str = "/account";

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// An issued Multipass login.
#[derive(Clone, Serialize)]
pub struct MultipassToken {
    /// `base64(cipherText--signature)`.
    pub token: String,
    /// Storefront login URL carrying the percent-encoded token.
    pub url: String,
}

impl std::fmt::Debug for MultipassToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipassToken")
            .field("token", &"[REDACTED]")
            .field("url", &"[REDACTED]")
            .finish()
    }
}

/// Generates Multipass tokens for one storefront.
///
/// Holds only derived key bytes and the storefront base URL, so a single
/// instance is built at startup and shared across requests without locking.
/// Every call to [`generate`](Self::generate) draws a fresh IV from the OS.
#[derive(Debug, Clone)]
pub struct MultipassGenerator {
    keys: DerivedKeys,
    storefront_url: String,
}

impl MultipassGenerator {
    /// Create a generator from the shared secret and the storefront base URL.
    ///
    /// A trailing `/` on the URL is ignored.
    ///
    /// # Errors
    ///
    /// Returns `MultipassError::Configuration` if the secret or URL is empty.
    pub fn new(secret: &SecretString, storefront_url: &str) -> Result<Self, MultipassError> {
        let storefront_url = storefront_url.trim().trim_end_matches('/');
        if storefront_url.is_empty() {
            return Err(MultipassError::Configuration(
                "storefront URL is empty".to_string(),
            ));
        }

        Ok(Self {
            keys: DerivedKeys::derive(secret)?,
            storefront_url: storefront_url.to_string(),
        })
    }

    /// Storefront base URL, without a trailing slash.
    #[must_use]
    pub fn storefront_url(&self) -> &str {
        &self.storefront_url
    }

    /// Build a fresh payload for `email` that returns to the account page.
    ///
    /// # Errors
    ///
    /// Returns `MultipassError::InvalidPayload` if `email` is empty or malformed.
    pub fn payload_for(&self, email: &str) -> Result<CustomerIdentityPayload, MultipassError> {
        CustomerIdentityPayload::new(email, format!("{}{ACCOUNT_PATH}", self.storefront_url))
    }

    /// Encrypt, sign, and encode `payload` into a login token and URL.
    ///
    /// # Errors
    ///
    /// Returns `MultipassError::Crypto` if the OS random source or any cipher
    /// step fails. No partial token is ever returned.
    pub fn generate(
        &self,
        payload: &CustomerIdentityPayload,
    ) -> Result<MultipassToken, MultipassError> {
        let mut iv = [0u8; IV_LEN];
        OsRng
            .try_fill_bytes(&mut iv)
            .map_err(|e| MultipassError::Crypto(format!("IV generation failed: {e}")))?;

        self.seal(payload, &iv)
    }

    /// Check that the envelope's signature matches its ciphertext.
    ///
    /// # Errors
    ///
    /// Returns `MultipassError::SignatureMismatch` if the ciphertext or the
    /// signature was altered, or `MalformedToken` if the signature is not base64.
    pub fn verify(&self, envelope: &MultipassEnvelope) -> Result<(), MultipassError> {
        let signature = envelope.signature_bytes()?;
        self.keys.verify(envelope.cipher_text().as_bytes(), &signature)
    }

    /// Verify the envelope, then decrypt it with the IV used at generation.
    ///
    /// The IV travels nowhere in the token, so only a holder of the original
    /// IV can recover the payload.
    ///
    /// # Errors
    ///
    /// Returns the verification error first; `MultipassError::Crypto` if the
    /// IV has the wrong length or padding is invalid.
    pub fn decrypt(
        &self,
        envelope: &MultipassEnvelope,
        iv: &[u8],
    ) -> Result<Vec<u8>, MultipassError> {
        self.verify(envelope)?;

        let cipher = Aes128CbcDec::new_from_slices(self.keys.encryption_key(), iv)
            .map_err(|e| MultipassError::Crypto(format!("cipher init failed: {e}")))?;

        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&envelope.cipher_bytes()?)
            .map_err(|e| MultipassError::Crypto(format!("decryption failed: {e}")))
    }

    fn seal(
        &self,
        payload: &CustomerIdentityPayload,
        iv: &[u8],
    ) -> Result<MultipassToken, MultipassError> {
        let json = payload.to_canonical_json()?;

        let cipher = Aes128CbcEnc::new_from_slices(self.keys.encryption_key(), iv)
            .map_err(|e| MultipassError::Crypto(format!("cipher init failed: {e}")))?;
        let cipher_text = STANDARD.encode(cipher.encrypt_padded_vec_mut::<Pkcs7>(&json));

        // Signed over the base64 text, not the raw ciphertext.
        let signature = STANDARD.encode(self.keys.sign(cipher_text.as_bytes())?);

        let token = STANDARD.encode(format!("{cipher_text}{SEPARATOR}{signature}"));
        let url = format!(
            "{}{LOGIN_PATH}{}",
            self.storefront_url,
            urlencoding::encode(&token)
        );

        Ok(MultipassToken { token, url })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::Email;

    const IV: [u8; IV_LEN] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f,
    ];

    fn generator(secret: &str) -> MultipassGenerator {
        MultipassGenerator::new(&SecretString::from(secret), "https://shop.example.com").unwrap()
    }

    fn payload(email: &str, created_at: &str) -> CustomerIdentityPayload {
        CustomerIdentityPayload::with_created_at(
            Email::parse(email).unwrap(),
            created_at.parse().unwrap(),
            "https://shop.example.com/account",
        )
    }

    // Vectors produced by the storefront-compatible reference encoder with IV 00..0f.

    #[test]
    fn test_known_answer_test_secret() {
        let sealed = generator("test-secret")
            .seal(&payload("a@b.com", "2024-01-01T00:00:00Z"), &IV)
            .unwrap();
        let envelope = MultipassEnvelope::parse(&sealed.token).unwrap();

        assert_eq!(
            envelope.cipher_text(),
            "s/KDMiyhynD26aRjzxRm97W56Chta1LrI+1RgP+jGs1H/T9H0XVy32KjtwPgOOdYPYKZWS5+XRufefwdTBwRrkTRRluYKxxuc06f1H31r7SxAscHFJowf8w4J99BEZ6xL2RETsJtiZKLszxJeRz8Tw=="
        );
        assert_eq!(
            envelope.signature(),
            "lFNAhgN5OjSOzQv2nt+sUyU2Emz84TN8TFpaf1Kth4E="
        );
        assert_eq!(
            sealed.token,
            "cy9LRE1peWh5bkQyNmFSanp4Um05N1c1NkNodGExTHJJKzFSZ1ArakdzMUgvVDlIMFhWeTMyS2p0d1BnT09kWVBZS1pXUzUrWFJ1ZmVmd2RUQndScmtUUlJsdVlLeHh1YzA2ZjFIMzFyN1N4QXNjSEZKb3dmOHc0Sjk5QkVaNnhMMlJFVHNKdGlaS0xzenhKZVJ6OFR3PT0tLWxGTkFoZ041T2pTT3pRdjJudCtzVXlVMkVtejg0VE44VEZwYWYxS3RoNEU9"
        );
        assert_eq!(
            sealed.url,
            format!(
                "https://shop.example.com/account/login/multipass/{}",
                sealed.token
            )
        );
    }

    #[test]
    fn test_known_answer_url_encodes_padding() {
        let sealed = generator("mp-secret-0123456789abcdef")
            .seal(
                &payload("user@example.com", "2024-06-15T12:30:45.123Z"),
                &IV,
            )
            .unwrap();
        let envelope = MultipassEnvelope::parse(&sealed.token).unwrap();

        assert_eq!(
            envelope.cipher_text(),
            "mQFfxtenPE6Ua9s9EvbM1iJYNRpS+ElGcSgtlwH9FBlf/vhXC38EKTpw0Ax6FtdFjpzlJFnhetbKfnwC7pB0LCDPEIc/eh7mGeyjJF0Ej/LRwVLTaR/KroHlFE4GUi0iHXERjZdHIofhmMQscjrqiVZzy71lH2rhV5SxhetJwCs="
        );
        assert_eq!(
            envelope.signature(),
            "kObQ3UFd8A4yAVXoDIm5yEAbwksOgR11HwcqhVkaz2g="
        );
        assert_eq!(
            sealed.token,
            "bVFGZnh0ZW5QRTZVYTlzOUV2Yk0xaUpZTlJwUytFbEdjU2d0bHdIOUZCbGYvdmhYQzM4RUtUcHcwQXg2RnRkRmpwemxKRm5oZXRiS2Zud0M3cEIwTENEUEVJYy9laDdtR2V5akpGMEVqL0xSd1ZMVGFSL0tyb0hsRkU0R1VpMGlIWEVSalpkSElvZmhtTVFzY2pycWlWWnp5NzFsSDJyaFY1U3hoZXRKd0NzPS0ta09iUTNVRmQ4QTR5QVZYb0RJbTV5RUFid2tzT2dSMTFId2NxaFZrYXoyZz0="
        );
        assert_eq!(
            sealed.url,
            "https://shop.example.com/account/login/multipass/bVFGZnh0ZW5QRTZVYTlzOUV2Yk0xaUpZTlJwUytFbEdjU2d0bHdIOUZCbGYvdmhYQzM4RUtUcHcwQXg2RnRkRmpwemxKRm5oZXRiS2Zud0M3cEIwTENEUEVJYy9laDdtR2V5akpGMEVqL0xSd1ZMVGFSL0tyb0hsRkU0R1VpMGlIWEVSalpkSElvZmhtTVFzY2pycWlWWnp5NzFsSDJyaFY1U3hoZXRKd0NzPS0ta09iUTNVRmQ4QTR5QVZYb0RJbTV5RUFid2tzT2dSMTFId2NxaFZrYXoyZz0%3D"
        );
    }

    #[test]
    fn test_decrypt_recovers_canonical_json() {
        let generator = generator("test-secret");
        let payload = payload("user@example.com", "2024-01-01T00:00:00Z");

        let sealed = generator.seal(&payload, &IV).unwrap();
        let envelope = MultipassEnvelope::parse(&sealed.token).unwrap();
        let plaintext = generator.decrypt(&envelope, &IV).unwrap();

        assert_eq!(plaintext, payload.to_canonical_json().unwrap());
    }

    #[test]
    fn test_generate_uses_fresh_iv() {
        let generator = generator("test-secret");
        let payload = payload("user@example.com", "2024-01-01T00:00:00Z");

        let first = generator.generate(&payload).unwrap();
        let second = generator.generate(&payload).unwrap();

        assert_ne!(first.token, second.token);
        assert!(generator.verify(&MultipassEnvelope::parse(&first.token).unwrap()).is_ok());
        assert!(generator.verify(&MultipassEnvelope::parse(&second.token).unwrap()).is_ok());
    }

    #[test]
    fn test_regenerated_tokens_carry_equivalent_payloads() {
        let generator = generator("test-secret");
        let first_iv = [0x11; IV_LEN];
        let second_iv = [0x22; IV_LEN];

        let first = generator
            .seal(&generator.payload_for("user@example.com").unwrap(), &first_iv)
            .unwrap();
        let second = generator
            .seal(&generator.payload_for("user@example.com").unwrap(), &second_iv)
            .unwrap();
        assert_ne!(first.token, second.token);

        let decode = |token: &str, iv: &[u8]| -> CustomerIdentityPayload {
            let envelope = MultipassEnvelope::parse(token).unwrap();
            serde_json::from_slice(&generator.decrypt(&envelope, iv).unwrap()).unwrap()
        };
        let first = decode(&first.token, &first_iv);
        let second = decode(&second.token, &second_iv);

        assert_eq!(first.email(), second.email());
        assert_eq!(first.return_to(), second.return_to());
    }

    #[test]
    fn test_tampered_cipher_text_fails_verification() {
        let generator = generator("test-secret");
        let sealed = generator
            .seal(&payload("a@b.com", "2024-01-01T00:00:00Z"), &IV)
            .unwrap();
        let envelope = MultipassEnvelope::parse(&sealed.token).unwrap();

        let original = envelope.cipher_text().as_bytes();
        for position in 0..original.len() {
            let mut tampered = original.to_vec();
            tampered[position] = if tampered[position] == b'A' { b'B' } else { b'A' };
            let tampered = MultipassEnvelope::from_parts(
                String::from_utf8(tampered).unwrap(),
                envelope.signature(),
            );

            assert!(
                matches!(
                    generator.verify(&tampered),
                    Err(MultipassError::SignatureMismatch)
                ),
                "byte {position} altered without detection"
            );
        }
    }

    #[test]
    fn test_decrypt_refuses_tampered_envelope() {
        let generator = generator("test-secret");
        let sealed = generator
            .seal(&payload("a@b.com", "2024-01-01T00:00:00Z"), &IV)
            .unwrap();
        let envelope = MultipassEnvelope::parse(&sealed.token).unwrap();
        let tampered = MultipassEnvelope::from_parts(
            envelope.cipher_text().replacen('s', "t", 1),
            envelope.signature(),
        );

        assert!(matches!(
            generator.decrypt(&tampered, &IV),
            Err(MultipassError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_other_secret_fails_verification() {
        let sealed = generator("test-secret")
            .seal(&payload("a@b.com", "2024-01-01T00:00:00Z"), &IV)
            .unwrap();
        let envelope = MultipassEnvelope::parse(&sealed.token).unwrap();

        assert!(matches!(
            generator("another-secret").verify(&envelope),
            Err(MultipassError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_token_has_single_separator() {
        let generator = generator("test-secret");
        let token = generator
            .generate(&payload("a@b.com", "2024-01-01T00:00:00Z"))
            .unwrap()
            .token;

        let inner = String::from_utf8(STANDARD.decode(&token).unwrap()).unwrap();
        assert_eq!(inner.matches(SEPARATOR).count(), 1);

        let (cipher_text, signature) = inner.split_once(SEPARATOR).unwrap();
        assert!(STANDARD.decode(cipher_text).is_ok());
        assert_eq!(STANDARD.decode(signature).unwrap().len(), 32);
    }

    #[test]
    fn test_wrong_iv_length_is_crypto_failure() {
        let result = generator("test-secret")
            .seal(&payload("a@b.com", "2024-01-01T00:00:00Z"), &IV[..8]);
        assert!(matches!(result, Err(MultipassError::Crypto(_))));
    }

    #[test]
    fn test_empty_secret_is_configuration_error() {
        let result = MultipassGenerator::new(&SecretString::from(""), "https://shop.example.com");
        assert!(matches!(result, Err(MultipassError::Configuration(_))));
    }

    #[test]
    fn test_empty_storefront_url_is_configuration_error() {
        let result = MultipassGenerator::new(&SecretString::from("test-secret"), " ");
        assert!(matches!(result, Err(MultipassError::Configuration(_))));
    }

    #[test]
    fn test_payload_for_uses_account_page() {
        let generator = MultipassGenerator::new(
            &SecretString::from("test-secret"),
            "https://shop.example.com/",
        )
        .unwrap();
        assert_eq!(generator.storefront_url(), "https://shop.example.com");

        let payload = generator.payload_for("user@example.com").unwrap();
        assert_eq!(payload.return_to(), "https://shop.example.com/account");
    }

    #[test]
    fn test_payload_for_rejects_invalid_email() {
        let generator = generator("test-secret");
        assert!(matches!(
            generator.payload_for(""),
            Err(MultipassError::InvalidPayload(_))
        ));
        assert!(matches!(
            generator.payload_for("not-an-email"),
            Err(MultipassError::InvalidPayload(_))
        ));
        assert!(generator.payload_for("user@example.com").is_ok());
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = generator("test-secret")
            .generate(&payload("a@b.com", "2024-01-01T00:00:00Z"))
            .unwrap();
        assert!(!format!("{token:?}").contains(&token.token));
    }
}
