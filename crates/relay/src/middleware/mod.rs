//! HTTP middleware stack for the relay.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. CORS (storefront origin only)
//! 3. `TraceLayer` (request span)
//! 4. Request ID (recorded into the request span)
//! 5. Security headers

pub mod cors;
pub mod request_id;
pub mod security_headers;

pub use cors::cors_layer;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
