use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::models::slot;

/// Sessions may not be edited within this window before their start.
pub const LOCK_WINDOW_MINUTES: i64 = 120;

/// Whether the session starting at `date` + the slot's start time is
/// inside the protection window relative to `now`. Starts that are
/// already in the past count as locked too; the window never reopens.
///
/// Checked on both sides of an edit: a locked session cannot be moved,
/// and a session cannot be moved *into* the window either.
pub fn is_locked(date: NaiveDate, slot_id: &str, now: NaiveDateTime) -> bool {
    let Some(start_time) = slot::start_time(slot_id) else {
        // unknown slot ids are handled by validation before this point
        return false;
    };
    let start = date.and_time(start_time);
    start <= now + Duration::minutes(LOCK_WINDOW_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_locked_inside_window() {
        // slot starts 10:00, now 09:00 -> 60 minutes remaining
        assert!(is_locked(d("2024-06-03"), "1000-1045", dt("2024-06-03 09:00")));
    }

    #[test]
    fn test_unlocked_outside_window() {
        // now 07:30 -> 150 minutes remaining
        assert!(!is_locked(d("2024-06-03"), "1000-1045", dt("2024-06-03 07:30")));
    }

    #[test]
    fn test_boundary_exactly_120_minutes() {
        assert!(is_locked(d("2024-06-03"), "1000-1045", dt("2024-06-03 08:00")));
    }

    #[test]
    fn test_past_start_stays_locked() {
        assert!(is_locked(d("2024-06-03"), "1000-1045", dt("2024-06-03 11:00")));
        assert!(is_locked(d("2024-06-03"), "1000-1045", dt("2024-06-04 09:00")));
    }

    #[test]
    fn test_monotonic_in_time() {
        let date = d("2024-06-03");
        let mut now = dt("2024-06-03 00:00");
        let mut seen_locked = false;
        for _ in 0..96 {
            let locked = is_locked(date, "1000-1045", now);
            if seen_locked {
                assert!(locked, "lock reopened at {now}");
            }
            seen_locked = seen_locked || locked;
            now += Duration::minutes(15);
        }
        assert!(seen_locked);
    }

    #[test]
    fn test_other_day_not_locked() {
        assert!(!is_locked(d("2024-06-10"), "1000-1045", dt("2024-06-03 09:00")));
    }
}
