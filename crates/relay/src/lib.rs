//! OTPless to Shopify Multipass relay.
//!
//! A stateless HTTP service: the storefront posts the token OTPless gave the
//! browser, the relay verifies it, finds or creates the Shopify customer, and
//! answers with a Multipass login URL.
//!
//! The crate is a library so the router can be exercised in tests without
//! binding a socket; `main.rs` only adds process setup.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod otpless;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
pub mod validation;

use axum::{Router, extract::Request, middleware::from_fn};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the relay router with its middleware stack.
///
/// Sentry layers are added by the binary so tests run without a hub.
pub fn app(state: AppState) -> Router {
    let cors = middleware::cors_layer(&state.config().shopify.storefront_url);

    Router::new()
        .merge(routes::routes())
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .layer(cors)
        .with_state(state)
}
