//! Certificate generation module.
//!
//! Builds, signs, inspects and decodes self-signed X.509 certificates.

pub mod builder;
pub mod deadline;
pub mod inspect;
pub mod loader;
pub mod self_signed;
