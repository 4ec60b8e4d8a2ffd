//! Business logic services for the relay.
//!
//! # Services
//!
//! - `login` - OTPless verification, Shopify find-or-create, Multipass issuance

pub mod login;

pub use login::{LoginOutcome, LoginService};
