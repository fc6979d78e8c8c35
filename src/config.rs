//! Runtime configuration from `CARDIOCHECK_*` environment variables.
//!
//! Read once at startup. Anything invalid is a startup error; nothing here is
//! re-read while serving.

use std::path::PathBuf;

use ed25519_dalek::VerifyingKey;

use crate::adapters::model::{manifest, LoadOptions};
use crate::domain::LabelPolicy;

pub const MODEL_PATH_ENV: &str = "CARDIOCHECK_MODEL_PATH";
pub const PUBKEY_FILE_ENV: &str = "CARDIOCHECK_MODEL_SIGNING_PUBKEY_B64_FILE";
pub const LABEL_POLICY_ENV: &str = "CARDIOCHECK_LABEL_POLICY";
pub const LOG_MODE_ENV: &str = "CARDIOCHECK_LOG_MODE";
pub const LOG_FILE_ENV: &str = "CARDIOCHECK_LOG_FILE";

/// Only honoured in debug builds.
#[cfg(debug_assertions)]
pub const ALLOW_UNSIGNED_MODELS_ENV: &str = "CARDIOCHECK_ALLOW_UNSIGNED_MODELS";

const DEFAULT_MODEL_PATH: &str = "models/heart_disease_model.json";
const DEFAULT_LOG_FILE: &str = "cardiocheck.log";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("Failed to read verifying key: {0}")]
    VerifyingKey(String),
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when stdin is a terminal, stderr otherwise
    Auto,
    File,
    Stdout,
    Stderr,
}

impl std::str::FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" => Ok(Self::Auto),
            "file" => Ok(Self::File),
            "stdout" => Ok(Self::Stdout),
            "stderr" => Ok(Self::Stderr),
            other => Err(format!(
                "unknown log mode {other:?} (expected auto, file, stdout or stderr)"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub mode: LogMode,
    pub file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// Artifact file or directory
    pub model_path: PathBuf,
    pub allow_unsigned_models: bool,
    pub verifying_key: Option<VerifyingKey>,
    pub label_policy: LabelPolicy,
    pub log: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            allow_unsigned_models: false,
            verifying_key: None,
            label_policy: LabelPolicy::default(),
            log: LogSettings {
                mode: LogMode::Auto,
                file: PathBuf::from(DEFAULT_LOG_FILE),
            },
        }
    }
}

#[cfg_attr(not(debug_assertions), allow(dead_code))]
pub(crate) fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}

impl Settings {
    /// Build settings from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable holds an invalid value or the
    /// verifying key file cannot be read or decoded.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    ///
    /// # Errors
    /// See [`Settings::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(path) = lookup(MODEL_PATH_ENV) {
            settings.model_path = PathBuf::from(path.trim());
        }

        if let Some(path) = lookup(PUBKEY_FILE_ENV) {
            let b64 = std::fs::read_to_string(path.trim())
                .map_err(|e| ConfigError::VerifyingKey(format!("{path}: {e}")))?;
            let key = manifest::verifying_key_from_b64(&b64)
                .map_err(|e| ConfigError::VerifyingKey(e.to_string()))?;
            settings.verifying_key = Some(key);
        }

        #[cfg(debug_assertions)]
        {
            settings.allow_unsigned_models = lookup(ALLOW_UNSIGNED_MODELS_ENV)
                .map(|v| parse_bool(&v))
                .unwrap_or(false);
        }

        if let Some(policy) = lookup(LABEL_POLICY_ENV) {
            settings.label_policy = policy.parse().map_err(|reason| ConfigError::Invalid {
                var: LABEL_POLICY_ENV,
                reason,
            })?;
        }

        if let Some(mode) = lookup(LOG_MODE_ENV) {
            settings.log.mode = mode.parse().map_err(|reason| ConfigError::Invalid {
                var: LOG_MODE_ENV,
                reason,
            })?;
        }

        if let Some(file) = lookup(LOG_FILE_ENV) {
            settings.log.file = PathBuf::from(file.trim());
        }

        Ok(settings)
    }

    /// Verification options for loading the classifier artifact.
    #[must_use]
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            allow_unsigned: self.allow_unsigned_models,
            verifying_key: self.verifying_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[])).expect("defaults");
        assert_eq!(settings.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(settings.label_policy, LabelPolicy::Strict);
        assert_eq!(settings.log.mode, LogMode::Auto);
        assert!(!settings.allow_unsigned_models);
        assert!(settings.verifying_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            (MODEL_PATH_ENV, "/srv/models"),
            (LABEL_POLICY_ENV, "lenient"),
            (LOG_MODE_ENV, "stderr"),
            (LOG_FILE_ENV, "/tmp/cc.log"),
        ]))
        .expect("valid settings");
        assert_eq!(settings.model_path, PathBuf::from("/srv/models"));
        assert_eq!(settings.label_policy, LabelPolicy::Lenient);
        assert_eq!(settings.log.mode, LogMode::Stderr);
        assert_eq!(settings.log.file, PathBuf::from("/tmp/cc.log"));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_allow_unsigned_in_debug() {
        let settings = Settings::from_lookup(lookup_from(&[(ALLOW_UNSIGNED_MODELS_ENV, "yes")]))
            .expect("valid settings");
        assert!(settings.allow_unsigned_models);
        assert!(settings.load_options().allow_unsigned);
    }

    #[test]
    fn test_invalid_label_policy() {
        let err = Settings::from_lookup(lookup_from(&[(LABEL_POLICY_ENV, "maybe")]))
            .expect_err("invalid policy");
        assert!(err.to_string().contains(LABEL_POLICY_ENV));
    }

    #[test]
    fn test_missing_key_file() {
        let err = Settings::from_lookup(lookup_from(&[(PUBKEY_FILE_ENV, "/nonexistent/key.b64")]))
            .expect_err("missing key file");
        assert!(matches!(err, ConfigError::VerifyingKey(_)));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("1"));
        assert!(parse_bool("YES"));
        assert!(!parse_bool("no"));
        assert!(!parse_bool(""));
    }
}
