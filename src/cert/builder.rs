//! Certificate builder utilities.
//!
//! Small functions producing the individual pieces of a TBS certificate:
//! the subject name, serial number, validity window, extensions, public key
//! info and signature algorithm.

use crate::config::Config;
use crate::crypto::keypair::RsaKeypair;
use crate::error::{Result, SelfSignedError};
use chrono::{DateTime, Days, Utc};
use const_oid::db::{rfc4519, rfc5280, rfc5912};
use const_oid::ObjectIdentifier;
use der::asn1::{Any, GeneralizedTime, OctetString, SetOfVec, UtcTime};
use der::{Decode, Encode, Tag};
use rand::rngs::OsRng;
use rand::RngCore;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use std::time::Duration;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::ext::pkix::{
    BasicConstraints, ExtendedKeyUsage, KeyUsage, KeyUsages, SubjectKeyIdentifier,
};
use x509_cert::ext::Extension;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::{Time, Validity};

fn encoding_error(context: &str, e: impl std::fmt::Display) -> SelfSignedError {
    SelfSignedError::CertificateEncodingError(format!("{}: {}", context, e))
}

/// Build the subject name from a config.
///
/// Each identity string becomes its own single-valued RDN, in the order
/// C, O, OU, CN. Empty strings are kept as empty attributes.
pub fn create_subject(config: &Config) -> Result<Name> {
    let attributes = [
        (rfc4519::C, config.country.as_str()),
        (rfc4519::O, config.organization.as_str()),
        (rfc4519::OU, config.organizational_unit.as_str()),
        (rfc4519::CN, config.common_name.as_str()),
    ];

    let rdns = attributes
        .into_iter()
        .map(|(oid, value)| single_attribute_rdn(oid, value))
        .collect::<Result<Vec<_>>>()?;

    Ok(RdnSequence(rdns))
}

fn single_attribute_rdn(oid: ObjectIdentifier, value: &str) -> Result<RelativeDistinguishedName> {
    let value = Any::new(Tag::Utf8String, value.as_bytes())
        .map_err(|e| encoding_error("Invalid attribute value", e))?;

    let attr_set = SetOfVec::try_from(vec![AttributeTypeAndValue { oid, value }])
        .map_err(|e| encoding_error("Failed to add attribute", e))?;

    Ok(RelativeDistinguishedName::from(attr_set))
}

/// Create a serial number from the generation timestamp.
///
/// The leading eight octets are the Unix time in seconds; eight random
/// octets follow so that certificates minted within the same second still
/// get distinct serials.
pub fn create_serial_number(now: &DateTime<Utc>) -> Result<SerialNumber> {
    let seconds = u64::try_from(now.timestamp())
        .map_err(|_| encoding_error("Timestamp predates the Unix epoch", now))?;

    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&seconds.to_be_bytes());
    OsRng.fill_bytes(&mut bytes[8..]);

    SerialNumber::new(&bytes).map_err(|e| encoding_error("Failed to create serial number", e))
}

/// Compute `(not_before, not_after)` by calendar-day arithmetic.
///
/// Negative `days` move `not_after` into the past.
pub fn validity_window(
    not_before: DateTime<Utc>,
    days: i64,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let not_after = if days >= 0 {
        not_before.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        not_before.checked_sub_days(Days::new(days.unsigned_abs()))
    };

    let not_after = not_after.ok_or_else(|| {
        SelfSignedError::CertificateEncodingError(format!(
            "Expiry of {} days is out of range",
            days
        ))
    })?;

    Ok((not_before, not_after))
}

/// Encode a validity window.
///
/// Bounds before 1970-01-01 cannot be encoded and fail with
/// [`SelfSignedError::CertificateEncodingError`].
pub fn create_validity(not_before: DateTime<Utc>, not_after: DateTime<Utc>) -> Result<Validity> {
    Ok(Validity {
        not_before: to_x509_time(not_before)?,
        not_after: to_x509_time(not_after)?,
    })
}

/// UTCTime through 2049, GeneralizedTime from 2050 on (RFC 5280 4.1.2.5).
///
/// Times before the Unix epoch are rejected with
/// [`SelfSignedError::CertificateEncodingError`]; `der` only encodes times
/// from 1970 on.
fn to_x509_time(time: DateTime<Utc>) -> Result<Time> {
    let seconds = u64::try_from(time.timestamp())
        .map_err(|_| encoding_error("Validity bound predates the Unix epoch", time))?;
    let since_epoch = Duration::from_secs(seconds);

    UtcTime::from_unix_duration(since_epoch)
        .map(Time::UtcTime)
        .or_else(|_| GeneralizedTime::from_unix_duration(since_epoch).map(Time::GeneralTime))
        .map_err(|e| encoding_error("Failed to encode validity bound", e))
}

/// Convert an X.509 time back into a chrono timestamp.
pub fn from_x509_time(time: &Time) -> Result<DateTime<Utc>> {
    let seconds = i64::try_from(time.to_unix_duration().as_secs())
        .map_err(|e| SelfSignedError::ParseError(format!("Time out of range: {}", e)))?;

    DateTime::<Utc>::from_timestamp(seconds, 0)
        .ok_or_else(|| SelfSignedError::ParseError(format!("Time out of range: {}", seconds)))
}

/// Build the certificate extensions.
///
/// KeyUsage and BasicConstraints are critical; ExtendedKeyUsage and the
/// SubjectKeyIdentifier are not.
pub fn create_extensions(subject_key_id: &[u8]) -> Result<Vec<Extension>> {
    let key_usage =
        KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment | KeyUsages::KeyCertSign);
    let extended_key_usage = ExtendedKeyUsage(vec![rfc5280::ID_KP_SERVER_AUTH]);
    let basic_constraints = BasicConstraints {
        ca: true,
        path_len_constraint: None,
    };
    let ski = OctetString::new(subject_key_id)
        .map_err(|e| encoding_error("Invalid subject key identifier", e))?;

    Ok(vec![
        create_extension(rfc5280::ID_CE_KEY_USAGE, true, &key_usage)?,
        create_extension(rfc5280::ID_CE_EXT_KEY_USAGE, false, &extended_key_usage)?,
        create_extension(rfc5280::ID_CE_BASIC_CONSTRAINTS, true, &basic_constraints)?,
        create_extension(
            rfc5280::ID_CE_SUBJECT_KEY_IDENTIFIER,
            false,
            &SubjectKeyIdentifier(ski),
        )?,
    ])
}

fn create_extension<T: Encode>(
    extn_id: ObjectIdentifier,
    critical: bool,
    value: &T,
) -> Result<Extension> {
    let der = value
        .to_der()
        .map_err(|e| encoding_error("Failed to encode extension", e))?;

    Ok(Extension {
        extn_id,
        critical,
        extn_value: OctetString::new(der)
            .map_err(|e| encoding_error("Failed to wrap extension", e))?,
    })
}

/// SubjectPublicKeyInfo for the keypair's public half.
pub fn create_subject_public_key_info(keypair: &RsaKeypair) -> Result<SubjectPublicKeyInfoOwned> {
    let der = keypair.public_key_der()?;
    SubjectPublicKeyInfoOwned::from_der(&der)
        .map_err(|e| encoding_error("Failed to decode public key info", e))
}

/// sha256WithRSAEncryption with the NULL parameters RFC 4055 requires.
pub fn sha256_with_rsa_algorithm() -> Result<AlgorithmIdentifierOwned> {
    let parameters = Any::new(Tag::Null, Vec::<u8>::new())
        .map_err(|e| encoding_error("Failed to encode algorithm parameters", e))?;

    Ok(AlgorithmIdentifierOwned {
        oid: rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
        parameters: Some(parameters),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use der::Tagged;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_create_subject_field_order() {
        let config = Config::default().with_common_name("example.test");
        let name = create_subject(&config).unwrap();

        let oids: Vec<_> = name.0.iter().map(|rdn| rdn.0.get(0).unwrap().oid).collect();
        assert_eq!(oids, vec![rfc4519::C, rfc4519::O, rfc4519::OU, rfc4519::CN]);
        assert!(name.0.iter().all(|rdn| rdn.0.len() == 1));
    }

    #[test]
    fn test_create_subject_empty_values() {
        let config = Config::default()
            .with_common_name("")
            .with_country("")
            .with_organization("")
            .with_organizational_unit("");
        let name = create_subject(&config).unwrap();

        assert_eq!(name.0.len(), 4);
        for rdn in name.0.iter() {
            assert!(rdn.0.get(0).unwrap().value.value().is_empty());
        }
    }

    #[test]
    fn test_serial_number_leads_with_timestamp() {
        let now = utc(2024, 6, 1);
        let serial = create_serial_number(&now).unwrap();

        let value = serial
            .as_bytes()
            .iter()
            .fold(0u128, |acc, b| (acc << 8) | u128::from(*b));
        assert_eq!((value >> 64) as i64, now.timestamp());
    }

    #[test]
    fn test_serial_numbers_differ_within_same_second() {
        let now = utc(2024, 6, 1);
        let a = create_serial_number(&now).unwrap();
        let b = create_serial_number(&now).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_validity_window_month_rollover() {
        let (not_before, not_after) = validity_window(utc(2024, 1, 31), 30).unwrap();
        assert_eq!(not_before, utc(2024, 1, 31));
        assert_eq!(not_after, utc(2024, 3, 1));
    }

    #[test]
    fn test_validity_window_year_rollover() {
        let (_, not_after) = validity_window(utc(2023, 12, 31), 1).unwrap();
        assert_eq!(not_after, utc(2024, 1, 1));
    }

    #[test]
    fn test_validity_window_zero_days() {
        let (not_before, not_after) = validity_window(utc(2024, 6, 1), 0).unwrap();
        assert_eq!(not_before, not_after);
    }

    #[test]
    fn test_validity_window_negative_days() {
        let (not_before, not_after) = validity_window(utc(2024, 3, 1), -1).unwrap();
        assert_eq!(not_after, utc(2024, 2, 29));
        assert!(not_after < not_before);
    }

    #[test]
    fn test_validity_window_out_of_range() {
        let result = validity_window(utc(2024, 3, 1), i64::MAX);
        assert!(matches!(result, Err(SelfSignedError::CertificateEncodingError(_))));
    }

    #[test]
    fn test_validity_time_kinds() {
        let validity = create_validity(utc(2049, 12, 31), utc(2050, 1, 1)).unwrap();
        assert!(matches!(validity.not_before, Time::UtcTime(_)));
        assert!(matches!(validity.not_after, Time::GeneralTime(_)));

        assert_eq!(from_x509_time(&validity.not_before).unwrap(), utc(2049, 12, 31));
        assert_eq!(from_x509_time(&validity.not_after).unwrap(), utc(2050, 1, 1));
    }

    #[test]
    fn test_validity_before_epoch_rejected() {
        let result = create_validity(utc(1969, 12, 31), utc(1970, 1, 2));
        assert!(matches!(result, Err(SelfSignedError::CertificateEncodingError(_))));
    }

    #[test]
    fn test_create_extensions() {
        let extensions = create_extensions(b"quickserve").unwrap();
        assert_eq!(extensions.len(), 4);

        let key_usage = extensions
            .iter()
            .find(|e| e.extn_id == rfc5280::ID_CE_KEY_USAGE)
            .unwrap();
        assert!(key_usage.critical);
        let decoded = KeyUsage::from_der(key_usage.extn_value.as_bytes()).unwrap();
        assert!(decoded.digital_signature());
        assert!(decoded.key_encipherment());
        assert!(decoded.key_cert_sign());
        assert!(!decoded.crl_sign());

        let ski = extensions
            .iter()
            .find(|e| e.extn_id == rfc5280::ID_CE_SUBJECT_KEY_IDENTIFIER)
            .unwrap();
        let decoded = SubjectKeyIdentifier::from_der(ski.extn_value.as_bytes()).unwrap();
        assert_eq!(decoded.0.as_bytes(), b"quickserve");
    }

    #[test]
    fn test_sha256_with_rsa_algorithm() {
        let alg = sha256_with_rsa_algorithm().unwrap();
        assert_eq!(alg.oid, rfc5912::SHA_256_WITH_RSA_ENCRYPTION);
        assert_eq!(alg.parameters.unwrap().tag(), Tag::Null);
    }
}
