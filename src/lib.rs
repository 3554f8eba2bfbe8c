//! selfsigned-tls: ephemeral self-signed TLS credentials
//!
//! This library generates an in-memory RSA-2048 key pair and a self-signed
//! X.509 certificate around it, returned as a credential that can be handed
//! straight to a rustls server. It is meant for development and tests:
//! spinning up a local HTTPS listener without a certificate authority.
//!
//! # Architecture
//!
//! Generation is a single linear step from [`Config`] to [`Credential`]:
//! capture the time, generate the key, build the certificate with
//! issuer == subject, sign it with its own key. Nothing is cached, persisted
//! or shared between calls, so concurrent callers need no coordination.
//! All operations return `Result` types; no `unwrap()` or panic.
//!
//! # Example
//!
//! ```rust,no_run
//! use selfsigned_tls::{generate, Config};
//! use selfsigned_tls::error::Result;
//!
//! fn example() -> Result<()> {
//!     let config = Config::default().with_common_name("api.localhost").with_expiry_days(7);
//!     let server_config = generate(config)?.server_config()?;
//!     // hand `server_config` to tokio-rustls, hyper, axum, ...
//!     Ok(())
//! }
//! ```

pub mod cert;
pub mod config;
pub mod crypto;
pub mod error;
pub mod net;

// Re-export commonly used types
pub use cert::deadline::generate_with_timeout;
pub use cert::self_signed::{generate, generate_with_defaults};
pub use config::{default_config, Config};
pub use error::{Result, SelfSignedError};
pub use net::credential::Credential;
