//! Runtime configuration for the shard consumer
//!
//! All configuration comes from the process environment at startup and is
//! immutable afterwards: one [`Config`] value is constructed in `main` and
//! passed by reference into every component. Secrets (tokens, passphrase,
//! salt, media key) are required; endpoints and loop tuning have defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_QUEUE_URL: &str = "https://queue.embercast.io/api";
const DEFAULT_MEDIA_URL: &str = "https://media.embercast.io";
const DEFAULT_SCRATCH_DIR: &str = "./multimedia";
const DEFAULT_CADENCE_SECS: u64 = 60;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Required environment variable is absent
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    /// A supplied value does not parse or fails validation
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

// ============================================================================
// Cadence Mode
// ============================================================================

/// How the loop spaces its iterations.
///
/// Additive sleeps the full cadence after each iteration, so slow handlers
/// stretch the wall-clock period (the historical behavior). Fixed-rate
/// subtracts the iteration's elapsed time, floored at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CadenceMode {
    #[default]
    Additive,
    FixedRate,
}

impl CadenceMode {
    /// Parse a mode name; unknown names yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "additive" => Some(Self::Additive),
            "fixed-rate" | "fixed_rate" | "fixedrate" => Some(Self::FixedRate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Additive => "additive",
            Self::FixedRate => "fixed-rate",
        }
    }
}

impl std::fmt::Display for CadenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Immutable runtime configuration for one shard process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Shard identifier; determines the owned slot range
    pub server_id: u32,

    /// Read-scope queue token
    pub read_token: String,

    /// Credential-scope queue token
    pub cred_token: String,

    /// Delete-scope queue token (acknowledgements)
    pub delete_token: String,

    /// Passphrase for credential decryption
    pub secret_key: String,

    /// Salt for credential key derivation
    pub salt: String,

    /// Bearer key for the media object store
    pub media_access_key: String,

    /// Base URL of the slot queue API
    pub queue_url: String,

    /// Base URL of the media object store
    pub media_url: String,

    /// Local scratch directory for fetched media
    pub scratch_dir: PathBuf,

    /// Seconds between loop iterations
    pub cadence_secs: u64,

    /// How the cadence sleep is computed
    pub cadence_mode: CadenceMode,

    /// HTTP request timeout in seconds
    pub http_timeout_secs: u64,
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `SERVER_ID`: shard identifier, a positive integer [required]
    /// - `READ_TOKEN`: queue read token [required]
    /// - `CRED_TOKEN`: queue credential token [required]
    /// - `DELETE_TOKEN`: queue delete token [required]
    /// - `SECRET_KEY`: credential decryption passphrase [required]
    /// - `SALT`: credential key derivation salt [required]
    /// - `MEDIA_ACCESS_KEY`: media store bearer key [required]
    /// - `EMBERCAST_QUEUE_URL`: queue base URL [default: https://queue.embercast.io/api]
    /// - `EMBERCAST_MEDIA_URL`: media store base URL [default: https://media.embercast.io]
    /// - `EMBERCAST_SCRATCH_DIR`: media scratch directory [default: ./multimedia]
    /// - `EMBERCAST_CADENCE_SECS`: seconds between iterations [default: 60]
    /// - `EMBERCAST_CADENCE_MODE`: additive or fixed-rate [default: additive]
    /// - `EMBERCAST_HTTP_TIMEOUT_SECS`: request timeout [default: 30]
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_id_raw = require_env("SERVER_ID")?;
        let server_id = server_id_raw.parse::<u32>().map_err(|_| {
            ConfigError::InvalidValue(
                "SERVER_ID".to_string(),
                format!("not a positive integer: {server_id_raw}"),
            )
        })?;

        Ok(Self {
            server_id,
            read_token: require_env("READ_TOKEN")?,
            cred_token: require_env("CRED_TOKEN")?,
            delete_token: require_env("DELETE_TOKEN")?,
            secret_key: require_env("SECRET_KEY")?,
            salt: require_env("SALT")?,
            media_access_key: require_env("MEDIA_ACCESS_KEY")?,
            queue_url: env::var("EMBERCAST_QUEUE_URL")
                .unwrap_or_else(|_| DEFAULT_QUEUE_URL.to_string()),
            media_url: env::var("EMBERCAST_MEDIA_URL")
                .unwrap_or_else(|_| DEFAULT_MEDIA_URL.to_string()),
            scratch_dir: env::var("EMBERCAST_SCRATCH_DIR")
                .unwrap_or_else(|_| DEFAULT_SCRATCH_DIR.to_string())
                .into(),
            cadence_secs: env::var("EMBERCAST_CADENCE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CADENCE_SECS),
            cadence_mode: env::var("EMBERCAST_CADENCE_MODE")
                .ok()
                .and_then(|s| CadenceMode::parse(&s))
                .unwrap_or_default(),
            http_timeout_secs: env::var("EMBERCAST_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        })
    }

    /// Get cadence as Duration
    pub fn cadence(&self) -> Duration {
        Duration::from_secs(self.cadence_secs)
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_id == 0 {
            return Err(ConfigError::InvalidValue(
                "server_id".to_string(),
                "shard identifiers start at 1".to_string(),
            ));
        }

        url::Url::parse(&self.queue_url).map_err(|e| {
            ConfigError::InvalidValue("queue_url".to_string(), e.to_string())
        })?;

        url::Url::parse(&self.media_url).map_err(|e| {
            ConfigError::InvalidValue("media_url".to_string(), e.to_string())
        })?;

        if self.secret_key.is_empty() {
            return Err(ConfigError::InvalidValue(
                "secret_key".to_string(),
                "passphrase cannot be empty".to_string(),
            ));
        }

        if self.salt.is_empty() {
            return Err(ConfigError::InvalidValue(
                "salt".to_string(),
                "salt cannot be empty".to_string(),
            ));
        }

        if self.cadence_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "cadence_secs".to_string(),
                "cadence must be at least one second".to_string(),
            ));
        }

        if self.http_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "http_timeout_secs".to_string(),
                "timeout must be at least one second".to_string(),
            ));
        }

        Ok(())
    }

    /// Display configuration (with secrets masked)
    pub fn display(&self) -> String {
        format!(
            "Shard Configuration\n\
             {:-<50}\n\
             Shard ID: {}\n\
             Queue URL: {}\n\
             Media URL: {}\n\
             Scratch Dir: {}\n\
             Cadence: {}s ({})\n\
             HTTP Timeout: {}s\n\
             Read Token: ***\n\
             Cred Token: ***\n\
             Delete Token: ***\n\
             Media Access Key: ***",
            "",
            self.server_id,
            self.queue_url,
            self.media_url,
            self.scratch_dir.display(),
            self.cadence_secs,
            self.cadence_mode,
            self.http_timeout_secs,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_id: 1,
            read_token: "read-token".to_string(),
            cred_token: "cred-token".to_string(),
            delete_token: "delete-token".to_string(),
            secret_key: "secret-key".to_string(),
            salt: "salt".to_string(),
            media_access_key: "media-key".to_string(),
            queue_url: DEFAULT_QUEUE_URL.to_string(),
            media_url: DEFAULT_MEDIA_URL.to_string(),
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            cadence_secs: DEFAULT_CADENCE_SECS,
            cadence_mode: CadenceMode::Additive,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
