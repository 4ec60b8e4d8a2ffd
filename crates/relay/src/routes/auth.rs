//! Auth API routes.
//!
//! JSON endpoints called by the storefront after the OTPless widget hands
//! the browser a token.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::Result;
use crate::otpless::VerifiedUser;
use crate::services::LoginOutcome;
use crate::state::AppState;
use crate::validation::{CustomerLoginRequest, VerifyTokenRequest};

/// Response from verifying an OTPless token.
#[derive(Debug, Serialize)]
pub struct VerifyTokenResponse {
    pub message: &'static str,
    #[serde(rename = "userData")]
    pub user_data: VerifiedUser,
}

/// Verify an OTPless token.
///
/// POST /api/auth/otpless
///
/// # Errors
///
/// - 400 if `token` is missing, blank, or not a string
/// - 401 if OTPless rejects the token
/// - 500 if OTPless cannot be reached
pub async fn verify_token(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<VerifyTokenResponse>> {
    let Json(body) = body?;
    let request = VerifyTokenRequest::from_json(&body)?;

    let user = state.login_service().verify(&request.token).await?;

    Ok(Json(VerifyTokenResponse {
        message: "Token verified successfully",
        user_data: user,
    }))
}

/// Find or create the Shopify customer for a verified email and issue a login.
///
/// POST /api/auth/shopify/customer
///
/// The token is verified again here; a client that skipped the verify step
/// gains nothing.
///
/// # Errors
///
/// - 400 if `email` or `token` fail validation
/// - 401 if OTPless rejects the token
/// - 500 if Shopify refuses to create the customer
/// - 502 if the Shopify customer search fails
pub async fn shopify_customer(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<LoginOutcome>> {
    let Json(body) = body?;
    let request = CustomerLoginRequest::from_json(&body)?;

    let outcome = state
        .login_service()
        .login(&request.email, &request.token)
        .await?;

    info!(
        multipass = matches!(outcome, LoginOutcome::Multipass { .. }),
        "Customer login completed"
    );

    Ok(Json(outcome))
}
