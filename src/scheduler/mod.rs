//! Time-slot allocation and rotation scheduling
//!
//! Every shard owns a contiguous block of 10080 weekly minute-slots, derived
//! purely from its shard id. A lookup table built once at startup correlates
//! those slot ids with time-of-week labels, and the wall clock picks the
//! starting slot. After that only the cursor moves.
//!
//! # Overview
//!
//! ```text
//! shard id ──► SlotRange ──► SlotTable ──► clock resolution ──► cursor
//!   (1..N)      [min,max]    10080 rows       UTC now           slot id
//! ```
//!
//! Slot ids encode position within the shard's numeric range; the
//! (weekday, time) column always walks Monday 00:00 through Sunday 23:59 in
//! the same order regardless of where the range starts. Two shards therefore
//! service the same wall-clock minute under different slot ids, and a fleet
//! of N shards partitions `[1, 10080*N]` with no coordination.
//!
//! # Example
//!
//! ```
//! use embercast::scheduler::{clock, SlotRange, SlotTable};
//!
//! let range = SlotRange::for_shard(5);
//! assert_eq!((range.min(), range.max()), (40_321, 50_400));
//!
//! let table = SlotTable::for_range(range)?;
//! let starting = clock::current_slot(&table)?;
//! assert!(range.contains(starting));
//! # Ok::<(), embercast::scheduler::SchedulerError>(())
//! ```
//!
//! # Modules
//!
//! - [`range`] - Shard id to slot-range arithmetic
//! - [`table`] - Weekly table construction and lookup
//! - [`clock`] - UTC instant to active slot resolution
//! - [`error`] - Scheduler error types

pub mod clock;
pub mod error;
pub mod range;
pub mod table;

// Re-export main types
pub use error::{SchedulerError, SchedulerResult};
pub use range::{SlotRange, SLOTS_PER_WEEK};
pub use table::{SlotEntry, SlotTable};
