//! Cryptographic primitives.
//!
//! Only RSA is supported: every generated credential carries a fresh
//! 2048-bit key signing with PKCS#1 v1.5 over SHA-256.
//!
//! # Example
//!
//! ```rust
//! use selfsigned_tls::crypto::keypair::generate_rsa_keypair;
//!
//! # fn example() -> selfsigned_tls::error::Result<()> {
//! let keypair = generate_rsa_keypair()?;
//! let signature = keypair.sign(b"payload")?;
//! keypair.verify(b"payload", &signature)?;
//! # Ok(())
//! # }
//! ```

pub mod keypair;
