//! Remote slot queue: payload model and HTTP client
//!
//! The queue holds at most one post per absolute slot. [`client::QueueClient`]
//! polls a slot and, after a successful publish, acknowledges it so the queue
//! drops the item. [`item::QueueItem`] is the decoded payload.

pub mod client;
pub mod item;

pub use client::{PollOutcome, QueueClient, QueueError, QueueResult};
pub use item::{Platform, PostKind, QueueItem, Tags};
