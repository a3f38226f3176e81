//! Weekly slot table construction and lookup
//!
//! The table correlates slot ids with time-of-week labels. It is built once
//! at startup and never mutated: slot ids run consecutively from the shard's
//! lower bound, while the (weekday, time) column always walks the full week
//! in a fixed order regardless of where the id range starts.

use serde::{Deserialize, Serialize};

use super::error::{SchedulerError, SchedulerResult};
use super::range::SlotRange;

// ============================================================================
// Slot Entry
// ============================================================================

/// One row of the weekly table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    /// Slot id within the shard's range
    pub slot: u64,

    /// ISO weekday, Monday = 1 .. Sunday = 7
    pub weekday: u8,

    /// Minute-of-day label, zero-padded "HH:MM"
    pub time: String,
}

impl std::fmt::Display for SlotEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot {} (weekday {} {})", self.slot, self.weekday, self.time)
    }
}

// ============================================================================
// Slot Table
// ============================================================================

/// Lookup table covering one full week at one-minute resolution
#[derive(Debug, Clone)]
pub struct SlotTable {
    range: SlotRange,
    entries: Vec<SlotEntry>,
}

impl SlotTable {
    /// Build the table for an inclusive `[min, max]` slot-id range.
    ///
    /// Entries are emitted weekday-major: weekday 1..7, then every minute of
    /// the day in order, with slot ids assigned consecutively from `min`.
    /// The id sequence and the time-of-week sequence are generated
    /// independently and must agree in length; a mismatch means the range
    /// does not span exactly one week and is a fatal construction error.
    pub fn build(min: u64, max: u64) -> SchedulerResult<Self> {
        let slots: Vec<u64> = (min..=max).collect();

        let mut weekdays = Vec::with_capacity(slots.len());
        let mut times = Vec::with_capacity(slots.len());
        for weekday in 1..=7u8 {
            for hour in 0..24u8 {
                for minute in 0..60u8 {
                    weekdays.push(weekday);
                    times.push(format!("{:02}:{:02}", hour, minute));
                }
            }
        }

        if slots.len() != weekdays.len() || slots.len() != times.len() {
            return Err(SchedulerError::construction(
                slots.len(),
                weekdays.len(),
                times.len(),
            ));
        }

        let entries = slots
            .into_iter()
            .zip(weekdays)
            .zip(times)
            .map(|((slot, weekday), time)| SlotEntry {
                slot,
                weekday,
                time,
            })
            .collect();

        Ok(Self {
            range: SlotRange::new(min, max),
            entries,
        })
    }

    /// Build the table for a shard's range
    pub fn for_range(range: SlotRange) -> SchedulerResult<Self> {
        Self::build(range.min(), range.max())
    }

    /// The slot-id range this table covers
    pub fn range(&self) -> SlotRange {
        self.range
    }

    /// Number of rows (always one week's worth for a valid table)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no rows
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All rows in construction order
    pub fn entries(&self) -> &[SlotEntry] {
        &self.entries
    }

    /// Find the slot id for a weekday/time pair.
    ///
    /// Exactly one row matches in a well-formed table; a miss can only come
    /// from a table built over an inconsistent range.
    pub fn slot_for(&self, weekday: u8, time: &str) -> SchedulerResult<u64> {
        self.entries
            .iter()
            .find(|entry| entry.weekday == weekday && entry.time == time)
            .map(|entry| entry.slot)
            .ok_or_else(|| SchedulerError::slot_not_found(weekday, time))
    }

    /// Positional access by slot id, used for labeling log output
    pub fn entry(&self, slot: u64) -> SchedulerResult<&SlotEntry> {
        if !self.range.contains(slot) {
            return Err(SchedulerError::SlotOutOfRange {
                slot,
                min: self.range.min(),
                max: self.range.max(),
            });
        }
        let index = (slot - self.range.min()) as usize;
        self.entries
            .get(index)
            .ok_or(SchedulerError::SlotOutOfRange {
                slot,
                min: self.range.min(),
                max: self.range.max(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_build_full_week() {
        let table = SlotTable::build(1, 10_080).unwrap();
        assert_eq!(table.len(), 10_080);

        let first = &table.entries()[0];
        assert_eq!(first.slot, 1);
        assert_eq!(first.weekday, 1);
        assert_eq!(first.time, "00:00");

        let last = &table.entries()[10_079];
        assert_eq!(last.slot, 10_080);
        assert_eq!(last.weekday, 7);
        assert_eq!(last.time, "23:59");
    }

    #[test]
    fn test_slot_ids_are_consecutive() {
        let table = SlotTable::build(10_081, 20_160).unwrap();
        for (i, entry) in table.entries().iter().enumerate() {
            assert_eq!(entry.slot, 10_081 + i as u64);
        }
    }

    #[test]
    fn test_time_labels_are_zero_padded() {
        let table = SlotTable::build(1, 10_080).unwrap();
        // 09:05 is minute 545 of Monday
        assert_eq!(table.entries()[545].time, "09:05");
    }

    #[test]
    fn test_weekday_time_pairs_are_unique() {
        let table = SlotTable::build(1, 10_080).unwrap();
        let pairs: HashSet<(u8, &str)> = table
            .entries()
            .iter()
            .map(|e| (e.weekday, e.time.as_str()))
            .collect();
        assert_eq!(pairs.len(), 10_080);
    }

    #[test]
    fn test_wrong_span_is_construction_error() {
        let err = SlotTable::build(1, 100).unwrap_err();
        assert!(matches!(err, SchedulerError::Construction { .. }));

        let err = SlotTable::build(1, 20_160).unwrap_err();
        assert!(matches!(err, SchedulerError::Construction { .. }));
    }

    #[test]
    fn test_slot_for_found() {
        let table = SlotTable::build(1, 10_080).unwrap();
        assert_eq!(table.slot_for(1, "00:00").unwrap(), 1);
        assert_eq!(table.slot_for(7, "23:59").unwrap(), 10_080);
    }

    #[test]
    fn test_slot_for_miss() {
        let table = SlotTable::build(1, 10_080).unwrap();
        let err = table.slot_for(8, "00:00").unwrap_err();
        assert!(matches!(err, SchedulerError::SlotNotFound { .. }));
    }

    #[test]
    fn test_entry_by_slot() {
        let table = SlotTable::build(40_321, 50_400).unwrap();
        let entry = table.entry(40_321).unwrap();
        assert_eq!(entry.weekday, 1);
        assert_eq!(entry.time, "00:00");

        assert!(table.entry(1).is_err());
        assert!(table.entry(50_401).is_err());
    }

    #[test]
    fn test_time_of_week_independent_of_min() {
        let base = SlotTable::build(1, 10_080).unwrap();
        let shifted = SlotTable::build(40_321, 50_400).unwrap();
        for (a, b) in base.entries().iter().zip(shifted.entries()) {
            assert_eq!(a.weekday, b.weekday);
            assert_eq!(a.time, b.time);
            assert_eq!(b.slot, a.slot + 40_320);
        }
    }
}
