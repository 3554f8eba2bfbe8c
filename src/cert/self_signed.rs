//! Self-signed certificate generation.
//!
//! The certificate is its own issuer: the subject name doubles as the issuer
//! name and the freshly generated key signs the certificate that carries its
//! public half. There is no separate CA key.

use crate::cert::builder::{
    create_extensions, create_serial_number, create_subject, create_subject_public_key_info,
    create_validity, sha256_with_rsa_algorithm, validity_window,
};
use crate::config::Config;
use crate::crypto::keypair::{generate_rsa_keypair, RsaKeypair};
use crate::error::{Result, SelfSignedError};
use crate::net::credential::Credential;
use chrono::{DateTime, SubsecRound, Utc};
use der::asn1::BitString;
use der::Encode;
use tracing::{debug, info, warn};
use x509_cert::certificate::{Certificate, TbsCertificate, Version};
use x509_cert::time::Validity;

/// Generate a self-signed TLS credential from a config.
///
/// The config is not validated. A zero `expiry_days` produces a certificate
/// whose validity window is a single instant, a negative one a certificate
/// that is already expired.
///
/// # Errors
///
/// * [`SelfSignedError::KeyGenerationError`] if RSA key generation fails
/// * [`SelfSignedError::CertificateEncodingError`] if the certificate cannot
///   be encoded or signed, including when `expiry_days` moves `not_after`
///   out of chrono's range or before 1970. The window is checked before any
///   key is generated.
///
/// # Example
///
/// ```
/// use selfsigned_tls::cert::self_signed::generate;
/// use selfsigned_tls::config::Config;
///
/// # fn example() -> selfsigned_tls::error::Result<()> {
/// let config = Config::default().with_common_name("api.localhost");
/// let credential = generate(config)?;
/// assert_eq!(credential.cert_chain().len(), 1);
/// # Ok(())
/// # }
/// ```
pub fn generate(config: Config) -> Result<Credential> {
    if config.expiry_days <= 0 {
        warn!(
            expiry_days = config.expiry_days,
            "generating certificate with an empty or past validity window"
        );
    }

    // UTCTime has second precision; truncating here keeps the encoded
    // not_before equal to the timestamp used for the serial number.
    let now = Utc::now().trunc_subsecs(0);
    let validity = encode_validity(now, config.expiry_days)?;

    let keypair = generate_rsa_keypair()?;
    let cert = sign_certificate(&config, &keypair, now, validity)?;
    let cert_der = encode_certificate(&cert)?;
    let key_der = keypair.to_pkcs8_der()?;

    info!(
        common_name = %config.common_name,
        expiry_days = config.expiry_days,
        "generated self-signed certificate"
    );

    Ok(Credential::from_der(cert_der, key_der))
}

/// Generate a credential from [`Config::default`].
///
/// # Example
///
/// ```
/// use selfsigned_tls::cert::self_signed::generate_with_defaults;
///
/// let credential = generate_with_defaults().unwrap();
/// assert!(!credential.certificate_der().is_empty());
/// ```
pub fn generate_with_defaults() -> Result<Credential> {
    generate(Config::default())
}

/// Build and sign the certificate for an existing keypair at a fixed time.
pub fn self_sign(config: &Config, keypair: &RsaKeypair, now: DateTime<Utc>) -> Result<Certificate> {
    let validity = encode_validity(now, config.expiry_days)?;
    sign_certificate(config, keypair, now, validity)
}

/// Same as [`self_sign`], DER-encoded.
pub fn self_sign_der(config: &Config, keypair: &RsaKeypair, now: DateTime<Utc>) -> Result<Vec<u8>> {
    encode_certificate(&self_sign(config, keypair, now)?)
}

fn encode_validity(now: DateTime<Utc>, expiry_days: i64) -> Result<Validity> {
    let (not_before, not_after) = validity_window(now, expiry_days)?;
    debug!(%not_before, %not_after, "computed validity window");
    create_validity(not_before, not_after)
}

fn sign_certificate(
    config: &Config,
    keypair: &RsaKeypair,
    now: DateTime<Utc>,
    validity: Validity,
) -> Result<Certificate> {
    let serial_number = create_serial_number(&now)?;
    let subject = create_subject(config)?;
    let issuer = subject.clone();
    let spki = create_subject_public_key_info(keypair)?;
    let signature_algorithm = sha256_with_rsa_algorithm()?;
    let extensions = create_extensions(&config.subject_key_id)?;

    let tbs = TbsCertificate {
        version: Version::V3,
        serial_number,
        signature: signature_algorithm.clone(),
        issuer,
        validity,
        subject,
        subject_public_key_info: spki,
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions: Some(extensions),
    };

    let signature = sign_tbs(&tbs, keypair)?;

    Ok(Certificate {
        tbs_certificate: tbs,
        signature_algorithm,
        signature,
    })
}

fn encode_certificate(cert: &Certificate) -> Result<Vec<u8>> {
    cert.to_der().map_err(|e| {
        SelfSignedError::CertificateEncodingError(format!("Failed to encode certificate: {}", e))
    })
}

fn sign_tbs(tbs: &TbsCertificate, keypair: &RsaKeypair) -> Result<BitString> {
    let tbs_der = tbs.to_der().map_err(|e| {
        SelfSignedError::CertificateEncodingError(format!("Failed to encode TBS: {}", e))
    })?;

    let signature = keypair.sign(&tbs_der)?;

    BitString::from_bytes(&signature).map_err(|e| {
        SelfSignedError::CertificateEncodingError(format!(
            "Failed to create signature bitstring: {}",
            e
        ))
    })
}
