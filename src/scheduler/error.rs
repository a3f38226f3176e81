//! Error types for the scheduler module

use thiserror::Error;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The generated slot, weekday, and time sequences disagree in length.
    ///
    /// This is a construction-time invariant; hitting it means the table was
    /// built from an inconsistent range and the process must not start.
    #[error("slot table construction failed: {slots} slots, {weekdays} weekdays, {times} times")]
    Construction {
        slots: usize,
        weekdays: usize,
        times: usize,
    },

    /// No table row matches the requested weekday/time pair.
    #[error("no slot found for weekday {weekday} at {time}")]
    SlotNotFound { weekday: u8, time: String },

    /// A slot id outside the table's range was used for positional access.
    #[error("slot {slot} is outside the table range [{min}, {max}]")]
    SlotOutOfRange { slot: u64, min: u64, max: u64 },
}

impl SchedulerError {
    /// Create a construction error from the three sequence lengths
    pub fn construction(slots: usize, weekdays: usize, times: usize) -> Self {
        Self::Construction {
            slots,
            weekdays,
            times,
        }
    }

    /// Create a slot-not-found error
    pub fn slot_not_found(weekday: u8, time: impl Into<String>) -> Self {
        Self::SlotNotFound {
            weekday,
            time: time.into(),
        }
    }

    /// Construction failures are code defects; nothing downstream can fix them.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Construction { .. })
    }
}
