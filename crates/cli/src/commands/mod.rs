//! CLI command implementations.

pub mod multipass;
