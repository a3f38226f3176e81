//! embercast - Sharded Social Queue Consumer
//!
//! A shard-aware consumer that drains a time-slot-addressed post queue and
//! publishes each item to its social platform.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Environment configuration and validation
//! - [`scheduler`] - Shard slot ranges, the weekly slot table, and clock resolution
//! - [`crypto`] - Credential decryption (derived-key token cipher)
//! - [`queue`] - Slot queue API client and the queue item model
//! - [`publish`] - Platform dispatch table, post handlers, and the media store
//! - [`runner`] - The poll/publish/acknowledge consumer loop
//!
//! # Example
//!
//! ```no_run
//! use embercast::config::Config;
//! use embercast::runner::ShardRunner;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     config.validate()?;
//!     let runner = ShardRunner::new(config)?;
//!     // runner.run(shutdown_rx).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod publish;
pub mod queue;
pub mod runner;
pub mod scheduler;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{CadenceMode, Config};
    pub use crate::crypto::CredentialCipher;
    pub use crate::error::{Error, Result};
    pub use crate::publish::DispatchTable;
    pub use crate::queue::{Platform, PollOutcome, PostKind, QueueClient, QueueItem};
    pub use crate::runner::{ShardRunner, TickOutcome};
    pub use crate::scheduler::{SlotRange, SlotTable};
}

// Direct re-exports for convenience
pub use queue::{Platform, PostKind, QueueItem};
