//! Customer search and creation over the Admin REST API.

use std::sync::Arc;
use std::time::Duration;

use multipass_relay_core::Email;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::ShopifyError;
use super::types::{
    Customer, CustomerEnvelope, CustomerSearchResponse, ErrorResponse, NewCustomer,
};
use crate::config::ShopifyConfig;

/// Upper bound on a single Admin API round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Retry-After fallback when Shopify omits the header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 2;

/// Shopify Admin REST API client.
///
/// # Security
///
/// The access token can create customers on the store. It is sent as a
/// sensitive header and never logged.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    /// `{store}/admin/api/{version}`
    api_url: String,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("api_url", &self.inner.api_url)
            .finish_non_exhaustive()
    }
}

impl AdminClient {
    /// Create a new Admin API client.
    ///
    /// # Errors
    ///
    /// Returns error if the access token is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        let mut access_token = HeaderValue::from_str(config.access_token.expose_secret())
            .map_err(|e| ShopifyError::InvalidAccessToken(e.to_string()))?;
        access_token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("X-Shopify-Access-Token", access_token);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminClientInner {
                client,
                api_url: config.admin_api_url(),
            }),
        })
    }

    /// Find the first customer whose email matches exactly, ignoring case.
    ///
    /// Shopify's search is a loose text match, so results whose email differs
    /// from the requested address are discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip_all)]
    pub async fn find_customer_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Customer>, ShopifyError> {
        let url = format!(
            "{}/customers/search.json?query={}",
            self.inner.api_url,
            urlencoding::encode(&format!("email:{email}"))
        );

        let response = self.inner.client.get(&url).send().await?;
        let search: CustomerSearchResponse = parse_response(response).await?;

        let found = search.customers.into_iter().find(|customer| {
            customer
                .email
                .as_deref()
                .is_some_and(|candidate| email.eq_ignore_case(candidate))
        });

        if found.is_none() {
            debug!("No customer with a matching email");
        }

        Ok(found)
    }

    /// Create a customer.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` if Shopify rejects the input (HTTP 422),
    /// or another error if the API request fails.
    #[instrument(skip_all)]
    pub async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, ShopifyError> {
        let url = format!("{}/customers.json", self.inner.api_url);

        let response = self
            .inner
            .client
            .post(&url)
            .json(&CustomerEnvelope { customer })
            .send()
            .await?;
        let created: CustomerEnvelope<Customer> = parse_response(response).await?;

        info!(customer_id = %created.customer.id, "Shopify customer created");
        Ok(created.customer)
    }
}

/// Map non-success statuses to errors and decode the body.
// Retry-After is a small positive number of seconds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ShopifyError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<f64>().ok())
            .map_or(DEFAULT_RETRY_AFTER_SECS, |secs| secs.ceil().max(0.0) as u64);
        warn!(retry_after, "Shopify rate limit hit");
        return Err(ShopifyError::RateLimited(retry_after));
    }

    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return Err(ShopifyError::Unauthorized(format!(
            "Admin API returned {status}"
        )));
    }

    if status == StatusCode::UNPROCESSABLE_ENTITY {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map_or(text, |body| body.summary());
        return Err(ShopifyError::UserError(message));
    }

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ShopifyError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| ShopifyError::Parse(e.to_string()))
}
