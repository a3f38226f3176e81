//! Shard to slot-range arithmetic
//!
//! Every shard owns a contiguous block of weekly minute-slots. The block is
//! derived purely from the shard id, so a fleet of N shards partitions
//! `[1, 10080*N]` with no coordination.

use serde::{Deserialize, Serialize};

/// Number of one-minute slots in a week (7 * 24 * 60)
pub const SLOTS_PER_WEEK: u64 = 10_080;

// ============================================================================
// Slot Range
// ============================================================================

/// Inclusive slot-id range owned by one shard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRange {
    min: u64,
    max: u64,
}

impl SlotRange {
    /// Range from raw bounds
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Compute the range for a shard id.
    ///
    /// Shard ids start at 1: shard 1 owns `[1, 10080]`, shard 2 owns
    /// `[10081, 20160]`, and so on. The arithmetic is defined only for
    /// positive ids; shard 0 yields the degenerate empty range `[1, 0]`
    /// rather than an error.
    pub fn for_shard(shard_id: u32) -> Self {
        let idx = u64::from(shard_id).saturating_sub(1);
        Self {
            min: SLOTS_PER_WEEK * idx + 1,
            max: SLOTS_PER_WEEK * u64::from(shard_id),
        }
    }

    /// Lower bound (inclusive)
    pub fn min(&self) -> u64 {
        self.min
    }

    /// Upper bound (inclusive)
    pub fn max(&self) -> u64 {
        self.max
    }

    /// Number of slots in the range
    pub fn len(&self) -> u64 {
        if self.max < self.min {
            0
        } else {
            self.max - self.min + 1
        }
    }

    /// Whether the range holds no slots
    pub fn is_empty(&self) -> bool {
        self.max < self.min
    }

    /// Whether a slot id falls inside the range
    pub fn contains(&self, slot: u64) -> bool {
        slot >= self.min && slot <= self.max
    }

    /// Next slot after `slot`, wrapping back to the lower bound past the end
    pub fn next_after(&self, slot: u64) -> u64 {
        if slot >= self.max {
            self.min
        } else {
            slot + 1
        }
    }
}

impl std::fmt::Display for SlotRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
