//! Multipass Relay Core - Shared types and Multipass token encoding.
//!
//! This crate provides the pieces used by every Multipass relay component:
//! - `relay` - HTTP service bridging OTPless verification and Shopify customers
//! - `cli` - Operator tools for generating and checking Multipass tokens
//!
//! # Architecture
//!
//! The core crate performs no I/O: no HTTP clients, no environment access.
//! The only impurity is the random initialization vector drawn for each
//! Multipass token.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for customer IDs and email addresses
//! - [`multipass`] - Multipass token generation and envelope inspection

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod multipass;
pub mod types;

pub use multipass::{
    CustomerIdentityPayload, MultipassEnvelope, MultipassError, MultipassGenerator,
    MultipassToken,
};
pub use types::*;
