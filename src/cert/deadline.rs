//! Deadline-bounded generation.
//!
//! RSA key generation cannot be interrupted. To bound it, generation runs on
//! tokio's blocking pool and the caller stops waiting when the deadline
//! passes; the abandoned attempt finishes in the background and its result
//! is dropped.

use crate::cert::self_signed::generate;
use crate::config::Config;
use crate::error::{Result, SelfSignedError};
use crate::net::credential::Credential;
use std::time::Duration;
use tracing::warn;

/// Generate a credential, giving up after `timeout`.
///
/// Must be called from within a tokio runtime.
///
/// # Example
///
/// ```
/// use selfsigned_tls::cert::deadline::generate_with_timeout;
/// use selfsigned_tls::config::Config;
/// use std::time::Duration;
///
/// # async fn example() -> selfsigned_tls::error::Result<()> {
/// let credential = generate_with_timeout(Config::default(), Duration::from_secs(30)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn generate_with_timeout(config: Config, timeout: Duration) -> Result<Credential> {
    let task = tokio::task::spawn_blocking(move || generate(config));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(SelfSignedError::TaskError(join_error.to_string())),
        Err(_) => {
            warn!(?timeout, "credential generation exceeded deadline, abandoning attempt");
            Err(SelfSignedError::Timeout(timeout))
        }
    }
}
