//! OTPless API client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, instrument, warn};

use super::{OtplessError, VerifiedUser};
use crate::config::OtplessConfig;

/// Token verification endpoint, relative to the API base URL.
const VERIFY_PATH: &str = "/api/v1/token/verify";

/// Upper bound on a single verification round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// OTPless API client for token verification.
#[derive(Clone)]
pub struct OtplessClient {
    client: reqwest::Client,
    verify_url: String,
}

impl std::fmt::Debug for OtplessClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtplessClient")
            .field("verify_url", &self.verify_url)
            .finish_non_exhaustive()
    }
}

impl OtplessClient {
    /// Create a new OTPless API client.
    ///
    /// The client credentials are attached to every request as the
    /// `client-id` and `client-secret` headers.
    ///
    /// # Errors
    ///
    /// Returns error if the credentials are not valid header values or the
    /// HTTP client fails to build.
    pub fn new(config: &OtplessConfig) -> Result<Self, OtplessError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "client-id",
            HeaderValue::from_str(&config.client_id)
                .map_err(|e| OtplessError::InvalidCredentials(format!("client-id: {e}")))?,
        );

        let mut secret = HeaderValue::from_str(config.client_secret.expose_secret())
            .map_err(|e| OtplessError::InvalidCredentials(format!("client-secret: {e}")))?;
        secret.set_sensitive(true);
        headers.insert("client-secret", secret);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            verify_url: format!("{}{VERIFY_PATH}", config.api_url),
        })
    }

    /// Verify a token issued to the browser by OTPless.
    ///
    /// # Errors
    ///
    /// Returns `OtplessError::Rejected` if OTPless answers with a non-success
    /// status, `OtplessError::Http` if the request fails, and
    /// `OtplessError::Parse` if the success body is not a JSON object.
    #[instrument(skip_all)]
    pub async fn verify_token(&self, token: &str) -> Result<VerifiedUser, OtplessError> {
        let body = serde_json::json!({ "token": token });

        let response = self.client.post(&self.verify_url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "OTPless token verification failed");
            return Err(OtplessError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let user: VerifiedUser = response
            .json()
            .await
            .map_err(|e| OtplessError::Parse(e.to_string()))?;

        debug!(
            has_email = user.email.is_some(),
            has_phone = user.phone_number().is_some(),
            "OTPless token verified"
        );

        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> OtplessClient {
        OtplessClient::new(&OtplessConfig {
            api_url: server.uri(),
            client_id: "client-123".to_string(),
            client_secret: SecretString::from("s3cr3t-value"),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_verify_token_sends_credentials_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/token/verify"))
            .and(header("client-id", "client-123"))
            .and(header("client-secret", "s3cr3t-value"))
            .and(body_json(json!({ "token": "otp-token" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "email": "user@example.com",
                "firstName": "Asha",
                "requestId": "req-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = client_for(&server).verify_token("otp-token").await.unwrap();

        assert_eq!(user.email.as_deref(), Some("user@example.com"));
        assert_eq!(user.first_name(), Some("Asha"));
        assert_eq!(user.extra["requestId"], "req-1");
    }

    #[tokio::test]
    async fn test_verify_token_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/token/verify"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "message": "Invalid token" })),
            )
            .mount(&server)
            .await;

        let result = client_for(&server).verify_token("bad-token").await;

        assert!(matches!(
            result,
            Err(OtplessError::Rejected { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn test_verify_token_unparseable_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/token/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = client_for(&server).verify_token("otp-token").await;

        assert!(matches!(result, Err(OtplessError::Parse(_))));
    }

    #[test]
    fn test_invalid_credentials() {
        let result = OtplessClient::new(&OtplessConfig {
            api_url: "https://api.otpless.com".to_string(),
            client_id: "bad\nid".to_string(),
            client_secret: SecretString::from("s3cr3t-value"),
        });

        assert!(matches!(result, Err(OtplessError::InvalidCredentials(_))));
    }
}
