//! CORS policy for the storefront.
//!
//! Only the configured storefront origin may call the relay from a browser.
//! Credentials are allowed so the storefront can send its cookies along.

use axum::http::{
    HeaderValue, Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tower_http::cors::CorsLayer;

/// Build the CORS layer for `origin`.
///
/// An origin that is not a valid header value is logged and skipped, which
/// leaves the layer rejecting every cross-origin request.
#[must_use]
pub fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true);

    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(origin, "Invalid CORS origin");
            cors
        }
    }
}
