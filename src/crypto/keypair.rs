//! RSA key operations.
//!
//! This module provides functions for generating RSA keypairs and for
//! signing / verifying with them using PKCS#1 v1.5 and SHA-256, the
//! combination used for the certificate signature.

use crate::error::{Result, SelfSignedError};
use rand::rngs::OsRng;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use std::time::Instant;
use tracing::debug;

/// Modulus size of every generated key.
pub const RSA_KEY_BITS: usize = 2048;

/// An RSA keypair consisting of a private key and its public half.
#[derive(Debug, Clone)]
pub struct RsaKeypair {
    pub secret: RsaPrivateKey,
    pub public: RsaPublicKey,
}

impl RsaKeypair {
    /// Create a new keypair from a private key.
    pub fn from_secret(secret: RsaPrivateKey) -> Self {
        let public = secret.to_public_key();
        Self { secret, public }
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.public.size() * 8
    }

    /// Sign a message (PKCS#1 v1.5, SHA-256).
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let signing_key = SigningKey::<Sha256>::new(self.secret.clone());
        let signature = signing_key
            .try_sign(message)
            .map_err(|e| SelfSignedError::CertificateEncodingError(format!("Signing failed: {}", e)))?;
        Ok(signature.to_vec())
    }

    /// Verify a PKCS#1 v1.5 / SHA-256 signature against the public key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        verify_signature(&self.public, message, signature)
    }

    /// Private key as PKCS#8 DER.
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let document = self.secret.to_pkcs8_der().map_err(|e| {
            SelfSignedError::CertificateEncodingError(format!("Failed to encode private key: {}", e))
        })?;
        Ok(document.as_bytes().to_vec())
    }

    /// Public key as a DER-encoded SubjectPublicKeyInfo.
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        let document = self.public.to_public_key_der().map_err(|e| {
            SelfSignedError::CertificateEncodingError(format!("Failed to encode public key: {}", e))
        })?;
        Ok(document.as_bytes().to_vec())
    }
}

/// Generate a new 2048-bit RSA keypair from the operating system's CSPRNG.
///
/// This is the slow part of credential generation and cannot be interrupted
/// once started.
///
/// # Example
///
/// ```
/// use selfsigned_tls::crypto::keypair::generate_rsa_keypair;
///
/// let keypair = generate_rsa_keypair().unwrap();
/// assert_eq!(keypair.bits(), 2048);
/// ```
pub fn generate_rsa_keypair() -> Result<RsaKeypair> {
    let started = Instant::now();
    let secret = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
        .map_err(|e| SelfSignedError::KeyGenerationError(e.to_string()))?;
    debug!(
        bits = RSA_KEY_BITS,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "generated RSA keypair"
    );
    Ok(RsaKeypair::from_secret(secret))
}

/// Decode an RSA public key from a DER SubjectPublicKeyInfo.
pub fn public_key_from_der(der: &[u8]) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_der(der)
        .map_err(|e| SelfSignedError::ParseError(format!("Invalid RSA public key: {}", e)))
}

/// Verify a PKCS#1 v1.5 / SHA-256 signature.
pub fn verify_signature(public: &RsaPublicKey, message: &[u8], signature: &[u8]) -> Result<()> {
    let signature = Signature::try_from(signature)
        .map_err(|e| SelfSignedError::ParseError(format!("Malformed signature: {}", e)))?;

    VerifyingKey::<Sha256>::new(public.clone())
        .verify(message, &signature)
        .map_err(|e| SelfSignedError::ParseError(format!("Signature verification failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_keypair_is_2048_bits() {
        let keypair = generate_rsa_keypair().unwrap();
        assert_eq!(keypair.bits(), 2048);
        assert_eq!(keypair.secret.to_public_key(), keypair.public);
    }

    #[test]
    fn test_generate_keypair_produces_different_keys() {
        let keypair1 = generate_rsa_keypair().unwrap();
        let keypair2 = generate_rsa_keypair().unwrap();

        assert_ne!(keypair1.public, keypair2.public);
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = generate_rsa_keypair().unwrap();
        let message = b"Hello, world!";

        let signature = keypair.sign(message).unwrap();
        assert_eq!(signature.len(), 256);
        assert!(keypair.verify(message, &signature).is_ok());
        assert!(keypair.verify(b"Goodbye, world!", &signature).is_err());
    }

    #[test]
    fn test_der_encodings() {
        let keypair = generate_rsa_keypair().unwrap();

        let pkcs8 = keypair.to_pkcs8_der().unwrap();
        assert_eq!(pkcs8[0], 0x30);

        let spki = keypair.public_key_der().unwrap();
        let decoded = public_key_from_der(&spki).unwrap();
        assert_eq!(decoded, keypair.public);
    }

    #[test]
    fn test_public_key_from_invalid_der() {
        let result = public_key_from_der(&[0x30, 0x00]);
        assert!(matches!(result, Err(SelfSignedError::ParseError(_))));
    }
}
