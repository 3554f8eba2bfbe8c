//! PEM decoding.
//!
//! Turns PEM text produced by [`Credential::certificate_pem`] and
//! [`Credential::private_key_pem`] back into DER. Everything stays in
//! memory; reading the text from wherever it was kept is up to the caller.
//!
//! [`Credential::certificate_pem`]: crate::net::credential::Credential::certificate_pem
//! [`Credential::private_key_pem`]: crate::net::credential::Credential::private_key_pem

use crate::error::{Result, SelfSignedError};
use rustls::pki_types::PrivateKeyDer;
use rustls_pemfile::Item;
use std::io::Cursor;

/// Load the first certificate from a PEM string as DER.
///
/// Non-certificate items before the certificate are skipped.
pub fn load_certificate_from_pem(pem_str: &str) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(pem_str.as_bytes());

    loop {
        match rustls_pemfile::read_one(&mut cursor)
            .map_err(|e| SelfSignedError::PemError(format!("Failed to read PEM: {}", e)))?
        {
            Some(Item::X509Certificate(cert_der)) => return Ok(cert_der.to_vec()),
            Some(_) => continue,
            None => {
                return Err(SelfSignedError::PemError(
                    "No certificate found in PEM".to_string(),
                ))
            }
        }
    }
}

/// Load the first private key (PKCS#8, PKCS#1 or SEC1) from a PEM string.
pub fn load_private_key_from_pem(pem_str: &str) -> Result<PrivateKeyDer<'static>> {
    let mut cursor = Cursor::new(pem_str.as_bytes());

    rustls_pemfile::private_key(&mut cursor)
        .map_err(|e| SelfSignedError::PemError(format!("Failed to read PEM: {}", e)))?
        .ok_or_else(|| SelfSignedError::PemError("No private key found in PEM".to_string()))
}
