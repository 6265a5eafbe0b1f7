// ABOUTME: Shared utility functions for Cadence
// ABOUTME: ID generation and calendar math used by the task and sprint packages

use chrono::{DateTime, Datelike, Utc};

/// Generate a unique entity ID
pub fn generate_id() -> String {
    nanoid::nanoid!()
}

/// ISO-8601 week number (Monday-based) for a timestamp.
///
/// Used to stamp tasks at creation and to window the weekly leaderboard.
/// Always derived from an explicit timestamp so aggregations stay
/// deterministic under test.
pub fn iso_week(at: DateTime<Utc>) -> u32 {
    at.iso_week().week()
}

/// Whole seconds elapsed between two timestamps, clamped at zero.
///
/// Clocks that appear to run backwards (NTP step, bad row) contribute
/// nothing rather than a negative span.
pub fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_seconds().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_id_is_unique() {
        let id1 = generate_id();
        let id2 = generate_id();

        assert!(!id1.is_empty());
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_iso_week_monday_based() {
        // 2024-01-01 is a Monday and starts ISO week 1
        let monday = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        assert_eq!(iso_week(monday), 1);

        // The preceding Sunday still belongs to the old year's last week
        let sunday = Utc.with_ymd_and_hms(2023, 12, 31, 9, 0, 0).unwrap();
        assert_eq!(iso_week(sunday), 52);
    }

    #[test]
    fn test_seconds_between() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 1, 11, 30, 0).unwrap();

        assert_eq!(seconds_between(start, end), 5400);
        // Reversed order clamps to zero instead of going negative
        assert_eq!(seconds_between(end, start), 0);
    }
}
