//! Certificate configuration.
//!
//! A [`Config`] carries the identity and validity parameters of a generated
//! certificate. Nothing here is validated: empty strings, zero or negative
//! expiry and arbitrary subject key ids all go straight into the certificate.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Subject key id used by [`Config::default`] (ASCII `"quickserve"`).
pub const DEFAULT_SUBJECT_KEY_ID: [u8; 10] = [113, 117, 105, 99, 107, 115, 101, 114, 118, 101];

/// Parameters for a self-signed certificate.
///
/// Fields missing from a serialized config fall back to the default value of
/// that field, so `{"common_name": "api.test"}` is a complete config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Subject common name (CN).
    pub common_name: String,

    /// Subject country (C).
    pub country: String,

    /// Subject organization (O).
    pub organization: String,

    /// Subject organizational unit (OU).
    pub organizational_unit: String,

    /// Validity period in calendar days, counted from generation time.
    /// Zero yields an empty window, negative values an expired certificate.
    pub expiry_days: i64,

    /// Raw value of the SubjectKeyIdentifier extension.
    pub subject_key_id: Vec<u8>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            common_name: "localhost".to_string(),
            country: "dev".to_string(),
            organization: "dev".to_string(),
            organizational_unit: "dev".to_string(),
            expiry_days: 1,
            subject_key_id: DEFAULT_SUBJECT_KEY_ID.to_vec(),
        }
    }
}

impl Config {
    /// Parse a config from JSON. Absent fields take their defaults.
    ///
    /// # Example
    ///
    /// ```
    /// use selfsigned_tls::config::Config;
    ///
    /// let config = Config::from_json(r#"{"common_name": "api.test", "expiry_days": 7}"#).unwrap();
    /// assert_eq!(config.common_name, "api.test");
    /// assert_eq!(config.country, "dev");
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the config to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_common_name(mut self, common_name: impl Into<String>) -> Self {
        self.common_name = common_name.into();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = organization.into();
        self
    }

    pub fn with_organizational_unit(mut self, unit: impl Into<String>) -> Self {
        self.organizational_unit = unit.into();
        self
    }

    pub fn with_expiry_days(mut self, days: i64) -> Self {
        self.expiry_days = days;
        self
    }

    pub fn with_subject_key_id(mut self, id: impl Into<Vec<u8>>) -> Self {
        self.subject_key_id = id.into();
        self
    }
}

/// Return a fresh default config.
///
/// Equivalent to [`Config::default`]; every call builds a new value so there
/// is no shared instance to mutate.
pub fn default_config() -> Config {
    Config::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = default_config();
        assert_eq!(config.common_name, "localhost");
        assert_eq!(config.country, "dev");
        assert_eq!(config.organization, "dev");
        assert_eq!(config.organizational_unit, "dev");
        assert_eq!(config.expiry_days, 1);
        assert_eq!(config.subject_key_id, b"quickserve".to_vec());
    }

    #[test]
    fn test_default_is_fresh_each_call() {
        let mut first = default_config();
        first.common_name.push_str(".changed");
        assert_eq!(default_config().common_name, "localhost");
    }

    #[test]
    fn test_builder_setters() {
        let config = Config::default()
            .with_common_name("api.test")
            .with_country("NL")
            .with_organization("Acme")
            .with_organizational_unit("QA")
            .with_expiry_days(30)
            .with_subject_key_id(vec![1, 2, 3]);

        assert_eq!(config.common_name, "api.test");
        assert_eq!(config.country, "NL");
        assert_eq!(config.organization, "Acme");
        assert_eq!(config.organizational_unit, "QA");
        assert_eq!(config.expiry_days, 30);
        assert_eq!(config.subject_key_id, vec![1, 2, 3]);
    }

    #[test]
    fn test_from_json_partial() {
        let config = Config::from_json(r#"{"organization": "Acme", "expiry_days": -3}"#).unwrap();
        assert_eq!(config.organization, "Acme");
        assert_eq!(config.expiry_days, -3);
        assert_eq!(config.common_name, "localhost");
        assert_eq!(config.subject_key_id, DEFAULT_SUBJECT_KEY_ID.to_vec());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = Config::default().with_common_name("");
        let json = config.to_json().unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_from_json_invalid() {
        let result = Config::from_json("{\"expiry_days\": \"soon\"}");
        assert!(matches!(result, Err(crate::error::SelfSignedError::JsonError(_))));
    }
}
