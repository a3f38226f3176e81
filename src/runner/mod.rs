//! Shard consumer loop
//!
//! One runner owns one shard. At startup it computes the shard's slot
//! range, builds the weekly slot table once, and resolves the starting
//! cursor from the UTC clock. From then on it cycles: poll the cursor's
//! slot, dispatch any queued item through the routing table, acknowledge
//! only after the publish round-trip succeeds, advance the cursor with
//! wraparound, sleep one cadence tick.
//!
//! The loop never dies on an iteration-local failure. A handler or decrypt
//! error leaves the item queued (the slot recurs one week later), a poll or
//! acknowledge failure is reported and absorbed, and the cadence sleep is
//! the only retry mechanism. Delivery is therefore at-least-once: a crash
//! between publish and acknowledge redelivers the item on the next visit.

use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::{CadenceMode, Config};
use crate::crypto::CredentialCipher;
use crate::error::Result;
use crate::publish::media::MediaStore;
use crate::publish::{Credentials, DispatchTable, PreparedPost, PublishError};
use crate::queue::{PollOutcome, QueueClient, QueueItem};
use crate::scheduler::{clock, SlotRange, SlotTable};

// ============================================================================
// Tick Outcome
// ============================================================================

/// Outcome of servicing one slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Item published and acknowledged
    Published { slot: u64, route: &'static str },

    /// Slot is assigned but had nothing queued
    Empty { slot: u64 },

    /// Slot is not assigned to any campaign
    Unassigned { slot: u64 },

    /// Item-local failure; the item stays queued and nothing was acknowledged
    Failed { slot: u64, reason: String },
}

impl TickOutcome {
    /// Slot the outcome belongs to
    pub fn slot(&self) -> u64 {
        match self {
            Self::Published { slot, .. }
            | Self::Empty { slot }
            | Self::Unassigned { slot }
            | Self::Failed { slot, .. } => *slot,
        }
    }

    /// Whether the item was published and acknowledged
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

impl std::fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Published { route, .. } => write!(f, "published via {route}"),
            Self::Empty { .. } => write!(f, "empty"),
            Self::Unassigned { .. } => write!(f, "unassigned"),
            Self::Failed { reason, .. } => write!(f, "failed: {reason}"),
        }
    }
}

// ============================================================================
// Shard Runner
// ============================================================================

/// The long-running consumer for one shard's slot range
pub struct ShardRunner {
    /// Runtime configuration, read-only after startup
    config: Config,

    /// Weekly slot table, built once
    table: SlotTable,

    /// Currently active slot id, always within the shard's range
    cursor: u64,

    /// Remote queue client
    queue: QueueClient,

    /// Credential cipher shared by all dispatches
    cipher: CredentialCipher,

    /// Routing table for platform handlers
    dispatch: DispatchTable,

    /// Remote media store with local scratch
    media: MediaStore,
}

impl ShardRunner {
    /// Initialize a runner for the configured shard
    pub fn new(config: Config) -> Result<Self> {
        let queue = QueueClient::new(&config)?;
        let dispatch = DispatchTable::new(&config)?;
        let media = MediaStore::new(&config)?;

        Self::from_parts(config, queue, dispatch, media)
    }

    /// Assemble a runner from explicit components (tests point these at a
    /// local mock server)
    pub fn from_parts(
        config: Config,
        queue: QueueClient,
        dispatch: DispatchTable,
        media: MediaStore,
    ) -> Result<Self> {
        let range = SlotRange::for_shard(config.server_id);
        let table = SlotTable::for_range(range)?;
        let cursor = clock::current_slot(&table)?;
        let cipher = CredentialCipher::new(&config.secret_key, &config.salt)?;

        tracing::info!(
            shard = config.server_id,
            min = range.min(),
            max = range.max(),
            entries = table.len(),
            now = %chrono::Utc::now().format("%Y-%m-%d %H:%M UTC"),
            starting_slot = cursor,
            "shard runner initialized"
        );

        Ok(Self {
            config,
            table,
            cursor,
            queue,
            cipher,
            dispatch,
            media,
        })
    }

    /// Pin the starting cursor to a specific slot within the range
    pub fn with_cursor(mut self, slot: u64) -> Self {
        self.cursor = slot;
        self
    }

    /// Currently active slot id
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// The shard's slot range
    pub fn range(&self) -> SlotRange {
        self.table.range()
    }

    /// The weekly slot table
    pub fn table(&self) -> &SlotTable {
        &self.table
    }

    /// Service the slot under the cursor once.
    ///
    /// Dispatch failures of any kind are folded into the outcome with the
    /// acknowledgment withheld; only poll and acknowledge failures surface
    /// as errors, and the loop absorbs those too.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let slot = self.cursor;

        match self.queue.poll(slot).await? {
            PollOutcome::Item(item) => match self.dispatch_item(slot, &item).await {
                Ok(route) => {
                    self.queue.ack(slot).await?;
                    tracing::info!(slot, route, "published and acknowledged");
                    Ok(TickOutcome::Published { slot, route })
                }
                Err(err) => {
                    tracing::warn!(slot, error = %err, "dispatch failed, leaving item queued");
                    Ok(TickOutcome::Failed {
                        slot,
                        reason: err.to_string(),
                    })
                }
            },
            PollOutcome::Empty => {
                tracing::debug!(slot, "slot empty");
                Ok(TickOutcome::Empty { slot })
            }
            PollOutcome::Unassigned => {
                tracing::debug!(slot, "slot not assigned to a campaign");
                Ok(TickOutcome::Unassigned { slot })
            }
        }
    }

    /// Advance the cursor one slot, wrapping past the range's upper bound
    pub fn advance(&mut self) {
        self.cursor = self.range().next_after(self.cursor);
    }

    /// Decrypt, fetch media if the kind needs it, publish, clean up.
    ///
    /// Media cleanup runs after the publish attempt whether it succeeded or
    /// not; a failed fetch leaves the remote copy untouched.
    async fn dispatch_item(&self, slot: u64, item: &QueueItem) -> Result<&'static str> {
        let kind = item.kind();
        let handler = self.dispatch.handler(item.platform, kind)?;

        tracing::info!(
            slot,
            platform = %item.platform,
            kind = %kind,
            route = handler.name(),
            "dispatching queued item"
        );

        let credentials = Credentials::decrypt(item, &self.cipher)?;

        let media_file = if kind.needs_media() {
            let name = item
                .media_file_name()
                .ok_or(PublishError::MissingField("multimedia_url"))?;
            let path = self.media.fetch(name).await?;
            Some((name.to_string(), path))
        } else {
            None
        };

        let mut post = PreparedPost::new(item, &credentials);
        if let Some((_, path)) = &media_file {
            post = post.with_media(path);
        }

        let published = handler.publish(&post).await;

        if let Some((name, _)) = &media_file {
            if let Err(err) = self.media.cleanup(name).await {
                tracing::warn!(slot, file = name.as_str(), error = %err, "media cleanup failed");
            }
        }

        published?;
        Ok(handler.name())
    }

    /// Run the consumer loop until the shutdown signal flips or a fatal
    /// error surfaces. Iteration-local failures are logged and absorbed.
    ///
    /// In additive mode the cadence sleep starts after the iteration ends,
    /// so slow handlers stretch the wall-clock period. Fixed-rate mode
    /// subtracts the elapsed time, floored at zero.
    pub async fn run(&mut self, mut shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        let cadence = self.config.cadence();
        let mode = self.config.cadence_mode;

        tracing::info!(
            shard = self.config.server_id,
            cadence_secs = cadence.as_secs(),
            mode = %mode,
            "consumer loop running"
        );

        loop {
            if *shutdown_rx.borrow() {
                tracing::info!("shutdown signal received, stopping consumer loop");
                return Ok(());
            }

            let started = Instant::now();

            match self.tick().await {
                Ok(outcome) => {
                    tracing::debug!(slot = outcome.slot(), outcome = %outcome, "slot serviced")
                }
                Err(err) if err.is_fatal() => {
                    tracing::error!(
                        slot = self.cursor,
                        category = err.category(),
                        error = %err,
                        "fatal error, stopping consumer loop"
                    );
                    return Err(err);
                }
                Err(err) => {
                    tracing::error!(
                        slot = self.cursor,
                        category = err.category(),
                        error = %err,
                        "slot servicing failed"
                    )
                }
            }

            self.advance();

            let pause = match mode {
                CadenceMode::Additive => cadence,
                CadenceMode::FixedRate => cadence.saturating_sub(started.elapsed()),
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = shutdown_rx.changed() => {
                    tracing::info!("shutdown signal received, stopping consumer loop");
                    return Ok(());
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
