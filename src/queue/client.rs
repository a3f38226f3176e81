//! HTTP client for the remote slot queue
//!
//! The queue exposes two GET endpoints keyed by absolute slot id:
//!
//! - `GET {base}/slot/{id}` polls the slot for a queued item
//! - `GET {base}/ack/{id}` acknowledges the item so the queue drops it
//!
//! Both calls authenticate through query-string tokens. Poll responses are
//! status-coded: 200 carries an item, 404 means the slot is empty, 218 means
//! the slot is not assigned to any campaign, 400 means the request itself
//! was malformed, and anything else is treated as an authentication failure.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;

use super::item::QueueItem;

/// Non-standard status the queue uses for slots with no campaign assigned
const STATUS_UNASSIGNED: u16 = 218;

// ============================================================================
// Errors
// ============================================================================

/// Queue client errors
#[derive(Debug, Error)]
pub enum QueueError {
    /// HTTP client could not be constructed
    #[error("failed to initialize queue HTTP client: {0}")]
    Init(#[source] reqwest::Error),

    /// Network-level failure talking to the queue
    #[error("queue request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Queue answered 400: the poll request itself was malformed
    #[error("queue rejected poll for slot {slot} as malformed (HTTP 400)")]
    MalformedRequest { slot: u64 },

    /// Queue answered with an unexpected status; tokens are the usual cause
    #[error("queue denied access for slot {slot} (HTTP {status}); check authentication tokens")]
    AuthRejected { slot: u64, status: u16 },

    /// Queue answered 200 but the body did not parse as an item
    #[error("queue item for slot {slot} failed to parse: {source}")]
    Parse {
        slot: u64,
        #[source]
        source: reqwest::Error,
    },

    /// Queue refused to drop an item we published
    #[error("queue refused acknowledgement for slot {slot} (HTTP {status})")]
    AckRejected { slot: u64, status: u16 },
}

impl QueueError {
    /// Whether this error should stop the consumer entirely
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Init(_))
    }
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

// ============================================================================
// Poll Outcome
// ============================================================================

/// Decoded result of polling one slot
#[derive(Debug)]
pub enum PollOutcome {
    /// The slot held a queued post
    Item(QueueItem),

    /// The slot is assigned but currently has nothing queued (404)
    Empty,

    /// The slot is not assigned to any campaign (218)
    Unassigned,
}

impl PollOutcome {
    /// Whether the poll produced an item to publish
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Item(_))
    }
}

// ============================================================================
// Queue Client
// ============================================================================

/// Client for polling and acknowledging slots on the remote queue
#[derive(Debug, Clone)]
pub struct QueueClient {
    http: Client,
    base_url: String,
    server_id: u32,
    read_token: String,
    cred_token: String,
    delete_token: String,
}

impl QueueClient {
    /// Create a client from runtime configuration
    pub fn new(config: &Config) -> QueueResult<Self> {
        Self::from_parts(
            &config.queue_url,
            config.server_id,
            &config.read_token,
            &config.cred_token,
            &config.delete_token,
            config.http_timeout(),
        )
    }

    /// Create a client from explicit parts
    pub fn from_parts(
        base_url: &str,
        server_id: u32,
        read_token: &str,
        cred_token: &str,
        delete_token: &str,
        timeout: Duration,
    ) -> QueueResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(QueueError::Init)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            server_id,
            read_token: read_token.to_string(),
            cred_token: cred_token.to_string(),
            delete_token: delete_token.to_string(),
        })
    }

    /// Override the base URL (used by tests against a local mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Poll one slot for a queued item
    pub async fn poll(&self, slot: u64) -> QueueResult<PollOutcome> {
        let url = format!("{}/slot/{}", self.base_url, slot);

        tracing::debug!(slot, url = %url, "polling queue slot");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("server_id", self.server_id.to_string()),
                ("read_token", self.read_token.clone()),
                ("cred_token", self.cred_token.clone()),
            ])
            .send()
            .await?;

        let status = response.status();

        // Only exactly 200 carries an item; any other 2xx is off-contract
        // and reported like the other unexpected statuses.
        match status.as_u16() {
            200 => {
                let item = response
                    .json::<QueueItem>()
                    .await
                    .map_err(|source| QueueError::Parse { slot, source })?;
                Ok(PollOutcome::Item(item))
            }
            404 => Ok(PollOutcome::Empty),
            STATUS_UNASSIGNED => Ok(PollOutcome::Unassigned),
            400 => Err(QueueError::MalformedRequest { slot }),
            other => Err(QueueError::AuthRejected { slot, status: other }),
        }
    }

    /// Acknowledge a slot whose item has been published.
    ///
    /// The queue drops the item on acknowledgement; never call this before
    /// the publish round-trip has succeeded.
    pub async fn ack(&self, slot: u64) -> QueueResult<()> {
        let url = format!("{}/ack/{}", self.base_url, slot);

        tracing::debug!(slot, url = %url, "acknowledging queue slot");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("server_id", self.server_id.to_string()),
                ("read_token", self.read_token.clone()),
                ("delete_token", self.delete_token.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(QueueError::AckRejected {
                slot,
                status: status.as_u16(),
            })
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> QueueClient {
        QueueClient::from_parts(
            "http://localhost:9000/api/",
            3,
            "read",
            "cred",
            "delete",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = test_client();
        assert_eq!(client.base_url, "http://localhost:9000/api");

        let client = client.with_base_url("http://127.0.0.1:1234///");
        assert_eq!(client.base_url, "http://127.0.0.1:1234");
    }

    #[test]
    fn test_poll_outcome_hit() {
        assert!(PollOutcome::Item(QueueItem::default()).is_hit());
        assert!(!PollOutcome::Empty.is_hit());
        assert!(!PollOutcome::Unassigned.is_hit());
    }

    #[test]
    fn test_fatal_classification() {
        let err = QueueError::AuthRejected { slot: 7, status: 503 };
        assert!(!err.is_fatal());

        let err = QueueError::MalformedRequest { slot: 7 };
        assert!(!err.is_fatal());
    }
}
