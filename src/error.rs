//! Unified error handling for the embercast crate
//!
//! Each module defines its own error enum; this module consolidates them into
//! a single [`Error`] so the runner and binary can propagate any failure with
//! `?`. Fatality is decided per variant: a fatal error means the process
//! cannot make progress (bad config, unusable key, unbuildable client) and
//! should exit, anything else is local to one loop iteration.

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::config::ConfigError;
pub use crate::crypto::CryptoError;
pub use crate::publish::media::MediaError;
pub use crate::publish::PublishError;
pub use crate::queue::QueueError;
pub use crate::scheduler::SchedulerError;

/// Unified error type for the embercast crate
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading and validation errors
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Slot table and clock resolution errors
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Credential decryption errors
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Slot queue API errors
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// Publish dispatch and platform API errors
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),

    /// Media store errors
    #[error("media error: {0}")]
    Media(#[from] MediaError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether the process should stop rather than continue to the next slot
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Scheduler(e) => e.is_fatal(),
            Self::Crypto(e) => e.is_fatal(),
            Self::Queue(e) => e.is_fatal(),
            Self::Publish(_) => false,
            Self::Media(e) => e.is_fatal(),
            Self::Io(_) => false,
        }
    }

    /// Short category label for log fields
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Scheduler(_) => "scheduler",
            Self::Crypto(_) => "crypto",
            Self::Queue(_) => "queue",
            Self::Publish(_) => "publish",
            Self::Media(_) => "media",
            Self::Io(_) => "io",
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_fatal() {
        let err = Error::from(ConfigError::MissingEnvVar("SERVER_ID".to_string()));
        assert!(err.is_fatal());
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_item_local_errors_are_not_fatal() {
        let err = Error::from(PublishError::MissingField("page_id"));
        assert!(!err.is_fatal());
        assert_eq!(err.category(), "publish");

        let err = Error::from(QueueError::MalformedRequest { slot: 7 });
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_fatality_delegates_to_domain() {
        let err = Error::from(SchedulerError::construction(10, 9, 10));
        assert!(err.is_fatal());

        let err = Error::from(SchedulerError::slot_not_found(3, "14:30"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_error_conversion() {
        let crypto_err = CryptoError::KeyDerivation;
        let unified: Error = crypto_err.into();
        assert!(matches!(unified, Error::Crypto(_)));
        assert!(unified.is_fatal());
    }

    #[test]
    fn test_display_prefixes_domain() {
        let err = Error::from(ConfigError::MissingEnvVar("SALT".to_string()));
        assert!(err.to_string().starts_with("config error:"));
    }
}
