//! TLS-facing types.

pub mod credential;
