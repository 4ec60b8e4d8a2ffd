//! Application state shared across handlers.

use std::sync::Arc;

use multipass_relay_core::{MultipassError, MultipassGenerator};

use crate::config::RelayConfig;
use crate::otpless::{OtplessClient, OtplessError};
use crate::services::LoginService;
use crate::shopify::{AdminClient, ShopifyError};

/// Error building application state from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("OTPless client: {0}")]
    Otpless(#[from] OtplessError),
    #[error("Shopify client: {0}")]
    Shopify(#[from] ShopifyError),
    #[error("Multipass: {0}")]
    Multipass(#[from] MultipassError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the immutable configuration and the
/// upstream clients built from it at startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RelayConfig,
    otpless: OtplessClient,
    shopify: AdminClient,
    multipass: Option<MultipassGenerator>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an upstream client cannot be built or the
    /// Multipass secret is unusable.
    pub fn new(config: RelayConfig) -> Result<Self, StateError> {
        let otpless = OtplessClient::new(&config.otpless)?;
        let shopify = AdminClient::new(&config.shopify)?;
        let multipass = config
            .shopify
            .multipass_secret
            .as_ref()
            .map(|secret| MultipassGenerator::new(secret, &config.shopify.storefront_url))
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                otpless,
                shopify,
                multipass,
            }),
        })
    }

    /// Get a reference to the relay configuration.
    #[must_use]
    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }

    /// Get a reference to the OTPless client.
    #[must_use]
    pub fn otpless(&self) -> &OtplessClient {
        &self.inner.otpless
    }

    /// Get a reference to the Shopify Admin API client.
    #[must_use]
    pub fn shopify(&self) -> &AdminClient {
        &self.inner.shopify
    }

    /// Get the Multipass generator, if Multipass is configured.
    #[must_use]
    pub fn multipass(&self) -> Option<&MultipassGenerator> {
        self.inner.multipass.as_ref()
    }

    /// Login service over this state's clients.
    #[must_use]
    pub fn login_service(&self) -> LoginService<'_> {
        LoginService::new(self.otpless(), self.shopify(), self.multipass())
    }
}
