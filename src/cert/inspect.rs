//! Certificate inspection.
//!
//! Decodes the fields this crate writes into a certificate so callers (and
//! tests) can check what a generated credential actually contains.

use crate::cert::builder::from_x509_time;
use crate::crypto::keypair::{public_key_from_der, verify_signature};
use crate::error::{Result, SelfSignedError};
use chrono::{DateTime, Utc};
use const_oid::db::{rfc4519, rfc5280};
use const_oid::ObjectIdentifier;
use der::{Decode, Encode};
use rsa::traits::PublicKeyParts;
use x509_cert::certificate::Certificate;
use x509_cert::ext::pkix::{
    BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectKeyIdentifier,
};
use x509_cert::name::Name;

/// Decoded view of a generated certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    pub common_name: String,
    pub country: String,
    pub organization: String,
    pub organizational_unit: String,
    /// Whether the issuer name equals the subject name.
    pub self_issued: bool,
    /// Big-endian serial number octets as encoded.
    pub serial: Vec<u8>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub subject_key_id: Option<Vec<u8>>,
    /// `cA` flag of BasicConstraints, `None` if the extension is absent.
    pub is_ca: Option<bool>,
    pub key_usage: KeyUsageFlags,
    /// Extended key usage purposes, empty if the extension is absent.
    pub extended_key_usage: Vec<ObjectIdentifier>,
    /// RSA modulus size of the embedded public key.
    pub key_bits: usize,
}

/// The key usage bits this crate cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyUsageFlags {
    pub digital_signature: bool,
    pub key_encipherment: bool,
    pub key_cert_sign: bool,
}

impl CertificateInfo {
    /// Decode a DER certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let cert = Certificate::from_der(der)
            .map_err(|e| SelfSignedError::ParseError(format!("Failed to decode certificate: {}", e)))?;
        Self::from_certificate(&cert)
    }

    pub fn from_certificate(cert: &Certificate) -> Result<Self> {
        let tbs = &cert.tbs_certificate;

        let mut info = Self {
            common_name: attribute(&tbs.subject, rfc4519::CN)?,
            country: attribute(&tbs.subject, rfc4519::C)?,
            organization: attribute(&tbs.subject, rfc4519::O)?,
            organizational_unit: attribute(&tbs.subject, rfc4519::OU)?,
            self_issued: tbs.issuer == tbs.subject,
            serial: tbs.serial_number.as_bytes().to_vec(),
            not_before: from_x509_time(&tbs.validity.not_before)?,
            not_after: from_x509_time(&tbs.validity.not_after)?,
            subject_key_id: None,
            is_ca: None,
            key_usage: KeyUsageFlags::default(),
            extended_key_usage: Vec::new(),
            key_bits: embedded_key_bits(cert)?,
        };

        for ext in tbs.extensions.iter().flatten() {
            let value = ext.extn_value.as_bytes();
            if ext.extn_id == rfc5280::ID_CE_SUBJECT_KEY_IDENTIFIER {
                let ski = SubjectKeyIdentifier::from_der(value).map_err(parse_error)?;
                info.subject_key_id = Some(ski.0.as_bytes().to_vec());
            } else if ext.extn_id == rfc5280::ID_CE_BASIC_CONSTRAINTS {
                let constraints = BasicConstraints::from_der(value).map_err(parse_error)?;
                info.is_ca = Some(constraints.ca);
            } else if ext.extn_id == rfc5280::ID_CE_KEY_USAGE {
                let usage = KeyUsage::from_der(value).map_err(parse_error)?;
                info.key_usage = KeyUsageFlags {
                    digital_signature: usage.digital_signature(),
                    key_encipherment: usage.key_encipherment(),
                    key_cert_sign: usage.key_cert_sign(),
                };
            } else if ext.extn_id == rfc5280::ID_CE_EXT_KEY_USAGE {
                let usage = ExtendedKeyUsage::from_der(value).map_err(parse_error)?;
                info.extended_key_usage = usage.0;
            }
        }

        Ok(info)
    }

    /// Whether the certificate is restricted to TLS server authentication.
    pub fn is_server_auth_only(&self) -> bool {
        self.extended_key_usage == [rfc5280::ID_KP_SERVER_AUTH]
    }

    /// Unix seconds carried in the leading octets of the serial number.
    pub fn serial_timestamp(&self) -> Option<i64> {
        if self.serial.len() > 17 {
            return None;
        }
        let value = self
            .serial
            .iter()
            .fold(0u128, |acc, b| (acc << 8) | u128::from(*b));
        i64::try_from(value >> 64).ok()
    }

    /// Subject key id as lowercase hex.
    pub fn subject_key_id_hex(&self) -> Option<String> {
        self.subject_key_id.as_ref().map(hex::encode)
    }
}

fn parse_error(e: der::Error) -> SelfSignedError {
    SelfSignedError::ParseError(format!("Failed to decode extension: {}", e))
}

/// First value of `oid` in `name`; empty when the attribute is missing.
fn attribute(name: &Name, oid: ObjectIdentifier) -> Result<String> {
    let value = name
        .0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|atv| atv.oid == oid)
        .map(|atv| atv.value.value());

    match value {
        Some(bytes) => String::from_utf8(bytes.to_vec())
            .map_err(|e| SelfSignedError::ParseError(format!("Attribute is not UTF-8: {}", e))),
        None => Ok(String::new()),
    }
}

fn embedded_key_bits(cert: &Certificate) -> Result<usize> {
    let public_key = embedded_public_key(cert)?;
    Ok(public_key.size() * 8)
}

fn embedded_public_key(cert: &Certificate) -> Result<rsa::RsaPublicKey> {
    let spki_der = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| SelfSignedError::ParseError(format!("Failed to encode public key info: {}", e)))?;
    public_key_from_der(&spki_der)
}

/// Verify a DER certificate's signature with its own embedded public key.
///
/// # Example
///
/// ```
/// use selfsigned_tls::cert::inspect::verify_self_signature;
/// use selfsigned_tls::cert::self_signed::generate_with_defaults;
///
/// let credential = generate_with_defaults().unwrap();
/// assert!(verify_self_signature(credential.certificate_der()).is_ok());
/// ```
pub fn verify_self_signature(der: &[u8]) -> Result<()> {
    let cert = Certificate::from_der(der)
        .map_err(|e| SelfSignedError::ParseError(format!("Failed to decode certificate: {}", e)))?;

    let tbs_der = cert
        .tbs_certificate
        .to_der()
        .map_err(|e| SelfSignedError::ParseError(format!("Failed to encode TBS: {}", e)))?;

    let signature = cert.signature.as_bytes().ok_or_else(|| {
        SelfSignedError::ParseError("Signature has unused bits".to_string())
    })?;

    verify_signature(&embedded_public_key(&cert)?, &tbs_der, signature)
}
