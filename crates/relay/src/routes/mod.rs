//! HTTP route handlers for the relay.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - Greeting
//! GET  /health                      - Liveness check
//!
//! # Auth API (JSON)
//! POST /api/auth/otpless            - Verify an OTPless token
//! POST /api/auth/shopify/customer   - Find or create the customer and issue a login
//! ```

pub mod auth;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Greeting served at `/`.
pub const GREETING: &str = "Hello from the OTPless to Shopify Multipass relay!";

/// Create the auth API routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/otpless", post(auth::verify_token))
        .route("/shopify/customer", post(auth::shopify_customer))
}

/// Create all routes for the relay.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .nest("/api/auth", auth_routes())
}

async fn home() -> &'static str {
    GREETING
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check upstreams.
async fn health() -> &'static str {
    "ok"
}
