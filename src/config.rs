//! Environment-driven settings.
//!
//! Everything is read once at startup. `Settings::from_lookup` takes the
//! variable source as a closure so tests never touch the process environment.

use std::path::PathBuf;

pub const MODEL_DIR_ENV: &str = "HEALTHRISK_MODEL_DIR";
pub const LOG_MODE_ENV: &str = "HEALTHRISK_LOG_MODE";
pub const LOG_FILE_ENV: &str = "HEALTHRISK_LOG_FILE";
pub const ALLOW_UNSIGNED_MODELS_ENV: &str = "HEALTHRISK_ALLOW_UNSIGNED_MODELS";
pub const MODEL_PUBKEY_ENV: &str = "HEALTHRISK_MODEL_PUBKEY_B64";
pub const MODEL_PUBKEY_FILE_ENV: &str = "HEALTHRISK_MODEL_PUBKEY_B64_FILE";
pub const MODEL_MAX_AGE_ENV: &str = "HEALTHRISK_MODEL_MAX_AGE_SECS";
pub const SANITIZE_MAX_BYTES_ENV: &str = "HEALTHRISK_SANITIZE_MAX_BYTES";

const DEFAULT_MODEL_DIR: &str = "models";
const DEFAULT_LOG_FILE: &str = "healthrisk.log";

/// Default sanitizer input cap, 16 KiB.
pub const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

/// Errors in the environment configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has invalid value {value:?}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Failed to read {name} file: {reason}")]
    Unreadable { name: &'static str, reason: String },
}

/// Where formatted log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogMode {
    /// stderr; stdout carries the response body
    Stderr,
    /// Append to a file
    File(PathBuf),
}

/// Source of the Ed25519 key that verifies the artifact manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyingKeySource {
    Base64(String),
    File(PathBuf),
}

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model_dir: PathBuf,
    pub log_mode: LogMode,
    /// Honoured only in debug builds
    pub allow_unsigned_models: bool,
    pub verifying_key: Option<VerifyingKeySource>,
    /// Reject manifests older than this many seconds
    pub model_max_age_secs: Option<i64>,
    /// Longest log line the sanitizer scans before truncating
    pub sanitize_max_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            log_mode: LogMode::Stderr,
            allow_unsigned_models: false,
            verifying_key: None,
            model_max_age_secs: None,
            sanitize_max_bytes: DEFAULT_SANITIZE_MAX_BYTES,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` for malformed values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `ConfigError` for malformed values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let model_dir = lookup(MODEL_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or(defaults.model_dir);

        let log_mode = match lookup(LOG_MODE_ENV).as_deref() {
            None | Some("stderr") => LogMode::Stderr,
            Some("file") => LogMode::File(
                lookup(LOG_FILE_ENV)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            ),
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: LOG_MODE_ENV,
                    value: other.to_string(),
                    reason: "expected \"stderr\" or \"file\"",
                })
            }
        };

        let allow_unsigned_models = lookup(ALLOW_UNSIGNED_MODELS_ENV)
            .map(|v| parse_bool(&v))
            .unwrap_or(false);

        // A key file takes precedence over an inline key.
        let verifying_key = lookup(MODEL_PUBKEY_FILE_ENV)
            .map(|p| VerifyingKeySource::File(PathBuf::from(p.trim())))
            .or_else(|| lookup(MODEL_PUBKEY_ENV).map(VerifyingKeySource::Base64));

        let model_max_age_secs = match lookup(MODEL_MAX_AGE_ENV) {
            None => None,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(secs) if secs > 0 => Some(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: MODEL_MAX_AGE_ENV,
                        value: raw,
                        reason: "expected a positive number of seconds",
                    })
                }
            },
        };

        let sanitize_max_bytes = match lookup(SANITIZE_MAX_BYTES_ENV) {
            None => defaults.sanitize_max_bytes,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(bytes) if bytes > 0 => bytes,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: SANITIZE_MAX_BYTES_ENV,
                        value: raw,
                        reason: "expected a positive byte count",
                    })
                }
            },
        };

        Ok(Self {
            model_dir,
            log_mode,
            allow_unsigned_models,
            verifying_key,
            model_max_age_secs,
            sanitize_max_bytes,
        })
    }
}

impl VerifyingKeySource {
    /// The base64 key text, reading the file if necessary.
    ///
    /// # Errors
    /// Returns `ConfigError::Unreadable` if the key file cannot be read.
    pub fn load_b64(&self) -> Result<String, ConfigError> {
        match self {
            Self::Base64(b64) => Ok(b64.trim().to_string()),
            Self::File(path) => std::fs::read_to_string(path)
                .map(|s| s.trim().to_string())
                .map_err(|e| ConfigError::Unreadable {
                    name: MODEL_PUBKEY_FILE_ENV,
                    reason: e.to_string(),
                }),
        }
    }
}

/// "1", "true", "TRUE", "yes" and "YES" are true; anything else is false.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}
