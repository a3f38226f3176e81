//! Wall-clock to slot resolution
//!
//! The starting cursor is derived from UTC once at startup. Only the ISO
//! weekday and the minute-of-day matter; clock monotonicity does not.

use chrono::{DateTime, Datelike, Utc};

use super::error::SchedulerResult;
use super::table::SlotTable;

/// ISO weekday number for an instant, Monday = 1 .. Sunday = 7
pub fn weekday_number(instant: &DateTime<Utc>) -> u8 {
    instant.weekday().number_from_monday() as u8
}

/// Zero-padded "HH:MM" label for an instant
pub fn minute_label(instant: &DateTime<Utc>) -> String {
    instant.format("%H:%M").to_string()
}

/// Resolve the slot active at a given instant
pub fn slot_at(table: &SlotTable, instant: &DateTime<Utc>) -> SchedulerResult<u64> {
    table.slot_for(weekday_number(instant), &minute_label(instant))
}

/// Resolve the slot active right now
pub fn current_slot(table: &SlotTable) -> SchedulerResult<u64> {
    slot_at(table, &Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_weekday_numbering_is_iso() {
        // 2024-01-01 is a Monday, 2024-01-07 a Sunday
        assert_eq!(weekday_number(&at(2024, 1, 1, 12, 0)), 1);
        assert_eq!(weekday_number(&at(2024, 1, 3, 12, 0)), 3);
        assert_eq!(weekday_number(&at(2024, 1, 7, 12, 0)), 7);
    }

    #[test]
    fn test_minute_label_is_zero_padded() {
        assert_eq!(minute_label(&at(2024, 1, 1, 9, 5)), "09:05");
        assert_eq!(minute_label(&at(2024, 1, 1, 23, 59)), "23:59");
    }

    #[test]
    fn test_monday_midnight_resolves_to_min() {
        let table = SlotTable::build(1, 10_080).unwrap();
        let slot = slot_at(&table, &at(2024, 1, 1, 0, 0)).unwrap();
        assert_eq!(slot, 1);
    }

    #[test]
    fn test_sunday_last_minute_resolves_to_max() {
        let table = SlotTable::build(1, 10_080).unwrap();
        let slot = slot_at(&table, &at(2024, 1, 7, 23, 59)).unwrap();
        assert_eq!(slot, 10_080);
    }

    #[test]
    fn test_resolution_respects_range_offset() {
        let table = SlotTable::build(40_321, 50_400).unwrap();
        let slot = slot_at(&table, &at(2024, 1, 1, 0, 0)).unwrap();
        assert_eq!(slot, 40_321);
    }

    #[test]
    fn test_current_slot_lands_in_table() {
        let table = SlotTable::build(1, 10_080).unwrap();
        let slot = current_slot(&table).unwrap();
        assert!(table.range().contains(slot));
    }
}
