//! Error types for the selfsigned-tls library.
//!
//! Generation itself only has two failure modes (key generation and
//! certificate encoding); the remaining variants belong to the helpers
//! around it: PEM handling, rustls configuration and JSON configs.

use thiserror::Error;

/// The main error type for selfsigned-tls operations.
#[derive(Error, Debug)]
pub enum SelfSignedError {
    /// Secure random RSA key generation failed
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Building, encoding or signing the certificate failed
    #[error("Certificate encoding error: {0}")]
    CertificateEncodingError(String),

    /// The credential could not be turned into a rustls configuration
    #[error("TLS configuration error: {0}")]
    TlsConfigError(String),

    /// A DER structure could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),

    /// PEM encoding/decoding error
    #[error("PEM error: {0}")]
    PemError(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generation did not finish before the caller's deadline
    #[error("Generation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The blocking generation task panicked or was cancelled
    #[error("Generation task failed: {0}")]
    TaskError(String),
}

/// A specialized Result type for selfsigned-tls operations.
pub type Result<T> = std::result::Result<T, SelfSignedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SelfSignedError::KeyGenerationError("entropy unavailable".to_string());
        assert_eq!(err.to_string(), "Key generation error: entropy unavailable");

        let err = SelfSignedError::CertificateEncodingError("bad template".to_string());
        assert_eq!(err.to_string(), "Certificate encoding error: bad template");
    }

    #[test]
    fn test_timeout_display() {
        let err = SelfSignedError::Timeout(std::time::Duration::from_millis(5));
        assert_eq!(err.to_string(), "Generation timed out after 5ms");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SelfSignedError>();
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SelfSignedError = json_err.into();
        assert!(matches!(err, SelfSignedError::JsonError(_)));
    }
}
