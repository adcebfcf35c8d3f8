//! Firebase project configuration.
//!
//! The configuration record carries the same seven fields as the web SDK's
//! `firebaseConfig` object and serializes to the same camelCase JSON shape.
//! Values are sourced from the environment (see [`FirebaseConfig::from_env`])
//! rather than embedded in source.

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Errors raised while loading or validating a [`FirebaseConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable was not set.
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
    /// A configuration field was present but empty.
    #[error("configuration field {0} must not be empty")]
    EmptyField(&'static str),
    /// A configuration field failed a shape check.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

/// Immutable Firebase project configuration.
///
/// All seven fields are required. The record is never mutated after
/// construction; service clients copy what they need out of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseConfig {
    /// Web API key, sent as the `key` query parameter on every request.
    pub api_key: String,
    /// Auth handler domain, e.g. `my-project.firebaseapp.com`.
    pub auth_domain: String,
    /// Project id, e.g. `my-project`.
    pub project_id: String,
    /// Default storage bucket, e.g. `my-project.firebasestorage.app`.
    pub storage_bucket: String,
    /// Cloud Messaging sender id (numeric string).
    pub messaging_sender_id: String,
    /// Google app id, e.g. `1:1048415348944:web:e79b1b9a9350a77c`.
    pub app_id: String,
    /// Analytics measurement id, e.g. `G-ABC123DEF4`.
    pub measurement_id: String,
}

const ENV_VARS: [&str; 7] = [
    "FIREBASE_API_KEY",
    "FIREBASE_AUTH_DOMAIN",
    "FIREBASE_PROJECT_ID",
    "FIREBASE_STORAGE_BUCKET",
    "FIREBASE_MESSAGING_SENDER_ID",
    "FIREBASE_APP_ID",
    "FIREBASE_MEASUREMENT_ID",
];

fn required_env(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingEnv(name))
}

impl FirebaseConfig {
    /// Loads the configuration from `FIREBASE_*` environment variables.
    ///
    /// Every variable in [`ENV_VARS`] order is required:
    /// `FIREBASE_API_KEY`, `FIREBASE_AUTH_DOMAIN`, `FIREBASE_PROJECT_ID`,
    /// `FIREBASE_STORAGE_BUCKET`, `FIREBASE_MESSAGING_SENDER_ID`,
    /// `FIREBASE_APP_ID`, `FIREBASE_MEASUREMENT_ID`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            api_key: required_env(ENV_VARS[0])?,
            auth_domain: required_env(ENV_VARS[1])?,
            project_id: required_env(ENV_VARS[2])?,
            storage_bucket: required_env(ENV_VARS[3])?,
            messaging_sender_id: required_env(ENV_VARS[4])?,
            app_id: required_env(ENV_VARS[5])?,
            measurement_id: required_env(ENV_VARS[6])?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that every field is non-empty and roughly the right shape.
    ///
    /// Shape checks are deliberately loose: they catch swapped or truncated
    /// values, not every malformed credential the backend would reject.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields: [(&'static str, &str); 7] = [
            ("api_key", &self.api_key),
            ("auth_domain", &self.auth_domain),
            ("project_id", &self.project_id),
            ("storage_bucket", &self.storage_bucket),
            ("messaging_sender_id", &self.messaging_sender_id),
            ("app_id", &self.app_id),
            ("measurement_id", &self.measurement_id),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField(name));
            }
        }

        for (name, value) in [
            ("auth_domain", &self.auth_domain),
            ("storage_bucket", &self.storage_bucket),
        ] {
            if value.contains('/') || value.contains("://") {
                return Err(ConfigError::InvalidField {
                    field: name,
                    reason: format!("expected a bare host name, got {value:?}"),
                });
            }
        }

        if self.app_id.split(':').filter(|s| !s.is_empty()).count() < 3 {
            return Err(ConfigError::InvalidField {
                field: "app_id",
                reason: "expected a `:`-separated Google app id".to_string(),
            });
        }

        if !self.messaging_sender_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::InvalidField {
                field: "messaging_sender_id",
                reason: "expected a numeric sender id".to_string(),
            });
        }

        if !self.measurement_id.starts_with("G-") {
            return Err(ConfigError::InvalidField {
                field: "measurement_id",
                reason: "expected a `G-` prefixed measurement id".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> FirebaseConfig {
        FirebaseConfig {
            api_key: "AIzaTestKey".to_string(),
            auth_domain: "test-project.firebaseapp.com".to_string(),
            project_id: "test-project".to_string(),
            storage_bucket: "test-project.firebasestorage.app".to_string(),
            messaging_sender_id: "1234567890".to_string(),
            app_id: "1:1234567890:web:abc123def456".to_string(),
            measurement_id: "G-TESTSTREAM".to_string(),
        }
    }

    #[test]
    fn validate_accepts_well_formed_config() {
        sample_config().validate().unwrap();
    }

    #[test]
    fn validate_rejects_empty_field() {
        let mut config = sample_config();
        config.project_id = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyField("project_id"))
        ));
    }

    #[test]
    fn validate_rejects_url_shaped_domain() {
        let mut config = sample_config();
        config.auth_domain = "https://test-project.firebaseapp.com".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidField {
                field: "auth_domain",
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_malformed_app_id() {
        let mut config = sample_config();
        config.app_id = "not-an-app-id".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidField { field: "app_id", .. })
        ));
    }

    #[test]
    fn validate_rejects_non_ga4_measurement_id() {
        let mut config = sample_config();
        config.measurement_id = "UA-12345-6".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidField {
                field: "measurement_id",
                ..
            })
        ));
    }

    #[test]
    fn config_round_trips_the_web_json_shape() {
        let json = serde_json::json!({
            "apiKey": "AIzaTestKey",
            "authDomain": "test-project.firebaseapp.com",
            "projectId": "test-project",
            "storageBucket": "test-project.firebasestorage.app",
            "messagingSenderId": "1234567890",
            "appId": "1:1234567890:web:abc123def456",
            "measurementId": "G-TESTSTREAM"
        });
        let config: FirebaseConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config, sample_config());
    }

    #[test]
    fn from_env_reads_all_seven_variables() {
        // Single test mutates the process environment to avoid races with
        // parallel test threads.
        let sample = sample_config();
        let values = [
            sample.api_key.as_str(),
            sample.auth_domain.as_str(),
            sample.project_id.as_str(),
            sample.storage_bucket.as_str(),
            sample.messaging_sender_id.as_str(),
            sample.app_id.as_str(),
            sample.measurement_id.as_str(),
        ];
        for (name, value) in ENV_VARS.iter().zip(values) {
            std::env::set_var(name, value);
        }
        assert_eq!(FirebaseConfig::from_env().unwrap(), sample);

        std::env::remove_var("FIREBASE_APP_ID");
        assert!(matches!(
            FirebaseConfig::from_env(),
            Err(ConfigError::MissingEnv("FIREBASE_APP_ID"))
        ));
        for name in ENV_VARS {
            std::env::remove_var(name);
        }
    }
}
