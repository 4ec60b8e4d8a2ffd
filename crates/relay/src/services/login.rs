//! Passwordless login flow.
//!
//! ```text
//! token ──► OTPless verify ──► email matches request? ── no ──► 401
//!                                   │ yes
//!                                   ▼
//!                          Shopify search by email
//!                                   │
//!                     found ◄───────┴───────► not found: create (verified, random password)
//!                       │                                   │
//!                       └──────────────┬────────────────────┘
//!                                      ▼
//!                  Multipass configured? ── yes ──► redirect_url
//!                                      └─── no ───► customer id + email
//! ```

use multipass_relay_core::{CustomerId, Email, MultipassError, MultipassGenerator};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::{AppError, add_breadcrumb, set_sentry_user};
use crate::otpless::{OtplessClient, VerifiedUser};
use crate::shopify::{AdminClient, Customer, NewCustomer};

/// Result of a successful login, serialized as the response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LoginOutcome {
    /// The storefront will log the customer in from `redirect_url`.
    Multipass {
        customer_id: CustomerId,
        redirect_url: String,
    },
    /// Multipass is not configured; the storefront handles login itself.
    ///
    /// `password_created` reports whether the account, and its random
    /// password, were created by this request. The password is never sent.
    Customer {
        customer_id: CustomerId,
        email: String,
        password_created: bool,
    },
}

/// Login service.
///
/// Borrows the long-lived clients from application state for one request.
pub struct LoginService<'a> {
    otpless: &'a OtplessClient,
    shopify: &'a AdminClient,
    multipass: Option<&'a MultipassGenerator>,
}

impl<'a> LoginService<'a> {
    /// Create a new login service.
    #[must_use]
    pub const fn new(
        otpless: &'a OtplessClient,
        shopify: &'a AdminClient,
        multipass: Option<&'a MultipassGenerator>,
    ) -> Self {
        Self {
            otpless,
            shopify,
            multipass,
        }
    }

    /// Verify an OTPless token and return the identity behind it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Otpless` if OTPless rejects the token or cannot be
    /// reached.
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<VerifiedUser, AppError> {
        let user = self.otpless.verify_token(token).await?;
        add_breadcrumb("otpless", "Token verified", None);
        Ok(user)
    }

    /// Re-verify the token, find or create the Shopify customer, and issue
    /// a login.
    ///
    /// # Errors
    ///
    /// - `AppError::Otpless` if the token is rejected
    /// - `AppError::Multipass` with `InvalidPayload` if OTPless verified no
    ///   usable email
    /// - `AppError::IdentityMismatch` if the verified email is not `email`
    /// - `AppError::Shopify` if the customer search fails
    /// - `AppError::CustomerCreation` if Shopify refuses the new customer
    /// - `AppError::Multipass` if the token cannot be generated
    #[instrument(skip_all)]
    pub async fn login(&self, email: &Email, token: &str) -> Result<LoginOutcome, AppError> {
        let user = self.verify(token).await?;
        let login_email = verified_email(&user, email)?;

        let (customer, created) = self.find_or_create(&login_email, &user).await?;
        set_sentry_user(&customer.id, Some(login_email.as_str()));

        let Some(generator) = self.multipass else {
            return Ok(LoginOutcome::Customer {
                customer_id: customer.id,
                email: login_email.into_inner(),
                password_created: created,
            });
        };

        let payload = generator.payload_for(login_email.as_str())?;
        let login = generator.generate(&payload)?;
        info!(customer_id = %customer.id, "Multipass login issued");

        Ok(LoginOutcome::Multipass {
            customer_id: customer.id,
            redirect_url: login.url,
        })
    }

    /// Returns the customer and whether it was created by this call.
    async fn find_or_create(
        &self,
        email: &Email,
        user: &VerifiedUser,
    ) -> Result<(Customer, bool), AppError> {
        if let Some(customer) = self.shopify.find_customer_by_email(email).await? {
            info!(customer_id = %customer.id, "Existing customer found");
            return Ok((customer, false));
        }

        let customer = self
            .shopify
            .create_customer(NewCustomer::from_verified(email, user))
            .await
            .map_err(AppError::CustomerCreation)?;

        let id = customer.id.to_string();
        add_breadcrumb("shopify", "Customer created", Some(&[("customer_id", id.as_str())]));
        Ok((customer, true))
    }
}

/// The email OTPless verified, provided it is the one being logged in.
fn verified_email(user: &VerifiedUser, requested: &Email) -> Result<Email, AppError> {
    let verified = Email::parse(user.email().unwrap_or_default())
        .map_err(|e| AppError::Multipass(MultipassError::InvalidPayload(e)))?;

    if !requested.eq_ignore_case(verified.as_str()) {
        warn!("Verified email does not match the requested email");
        return Err(AppError::IdentityMismatch);
    }

    Ok(verified)
}
