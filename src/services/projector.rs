use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::models::{slot, AvailabilitySnapshot};
use crate::services::conflict;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Projection {
    /// Non-conflicting dates, in order; these populate the request's
    /// session list.
    pub dates: Vec<NaiveDate>,
    /// Dates that were generated but hit a full slot, with a display
    /// message each. They are flagged and dropped, never shifted to a
    /// later week.
    pub conflicts: BTreeMap<NaiveDate, String>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ProjectError {
    #[error("session count must be at least 1")]
    EmptyCount,
    #[error("weekday must be between 0 (Sunday) and 6")]
    BadWeekday,
    #[error("unknown slot id: {0}")]
    UnknownSlot(String),
}

/// Project a weekly-repeating series of sessions: align `start` forward to
/// the requested weekday (0-6, Sunday-first), then step in 7-day
/// increments, checking each generated date against the conflict rule for
/// the fixed slot.
pub fn project(
    start: NaiveDate,
    weekday: u32,
    slot_id: &str,
    session_count: usize,
    snapshot: &AvailabilitySnapshot,
) -> Result<Projection, ProjectError> {
    if session_count == 0 {
        return Err(ProjectError::EmptyCount);
    }
    if weekday > 6 {
        return Err(ProjectError::BadWeekday);
    }
    let slot_label = slot::label_for(slot_id)
        .ok_or_else(|| ProjectError::UnknownSlot(slot_id.to_string()))?;

    let mut aligned = start;
    while aligned.weekday().num_days_from_sunday() != weekday {
        aligned += Duration::days(1);
    }

    let mut dates = Vec::new();
    let mut conflicts = BTreeMap::new();

    for i in 0..session_count {
        let date = aligned + Duration::days(7 * i as i64);
        let decision = conflict::check(date, slot_id, "", snapshot);
        if decision.disabled {
            let reason = decision.reason.unwrap_or_default();
            conflicts.insert(
                date,
                format!("{date}: {slot_label} unavailable ({reason})"),
            );
        } else {
            dates.push(date);
        }
    }

    Ok(Projection { dates, conflicts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Booking, Session, Therapist};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn therapist(id: &str) -> Therapist {
        Therapist {
            id: id.to_string(),
            name: id.to_string(),
            holidays: vec![],
        }
    }

    fn booking_in_slot(id: &str, therapist_id: &str, date: &str, slot: &str) -> Booking {
        let now = chrono::Utc::now().naive_utc();
        Booking {
            id: id.to_string(),
            therapist_id: therapist_id.to_string(),
            patient_id: "p1".to_string(),
            sessions: vec![Session {
                id: format!("{id}-s0"),
                date: d(date),
                slot_id: slot.to_string(),
            }],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_aligns_start_to_weekday() {
        let snap = AvailabilitySnapshot::new(vec![therapist("t1")], vec![]);
        // 2024-06-01 is a Saturday; weekday 1 = Monday -> 2024-06-03.
        let proj = project(d("2024-06-01"), 1, "1000-1045", 3, &snap).unwrap();
        assert_eq!(
            proj.dates,
            vec![d("2024-06-03"), d("2024-06-10"), d("2024-06-17")]
        );
        assert!(proj.conflicts.is_empty());
    }

    #[test]
    fn test_start_already_on_weekday() {
        let snap = AvailabilitySnapshot::new(vec![therapist("t1")], vec![]);
        let proj = project(d("2024-06-03"), 1, "1000-1045", 1, &snap).unwrap();
        assert_eq!(proj.dates, vec![d("2024-06-03")]);
    }

    #[test]
    fn test_conflicting_date_flagged_and_dropped() {
        // One therapist, booked in the slot on 06-17: that Monday is full.
        let snap = AvailabilitySnapshot::new(
            vec![therapist("t1")],
            vec![booking_in_slot("b1", "t1", "2024-06-17", "1000-1045")],
        );
        let proj = project(d("2024-06-01"), 1, "1000-1045", 3, &snap).unwrap();
        assert_eq!(proj.dates, vec![d("2024-06-03"), d("2024-06-10")]);
        assert_eq!(proj.conflicts.len(), 1);
        let msg = proj.conflicts.get(&d("2024-06-17")).unwrap();
        assert!(msg.contains("2024-06-17"));
        assert!(msg.contains("10:00 - 10:45"));
        assert!(msg.contains(conflict::SLOT_FULL_MESSAGE));
    }

    #[test]
    fn test_never_shifts_past_conflicts() {
        // Even with a conflict in the middle, later dates stay on the
        // original 7-day progression.
        let snap = AvailabilitySnapshot::new(
            vec![therapist("t1")],
            vec![booking_in_slot("b1", "t1", "2024-06-10", "1000-1045")],
        );
        let proj = project(d("2024-06-03"), 1, "1000-1045", 3, &snap).unwrap();
        assert_eq!(proj.dates, vec![d("2024-06-03"), d("2024-06-17")]);
    }

    #[test]
    fn test_deterministic_for_same_snapshot() {
        let snap = AvailabilitySnapshot::new(
            vec![therapist("t1")],
            vec![booking_in_slot("b1", "t1", "2024-06-10", "1000-1045")],
        );
        let a = project(d("2024-06-01"), 1, "1000-1045", 4, &snap).unwrap();
        let b = project(d("2024-06-01"), 1, "1000-1045", 4, &snap).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_zero_count() {
        let snap = AvailabilitySnapshot::default();
        assert_eq!(
            project(d("2024-06-01"), 1, "1000-1045", 0, &snap),
            Err(ProjectError::EmptyCount)
        );
    }

    #[test]
    fn test_rejects_bad_weekday_and_slot() {
        let snap = AvailabilitySnapshot::default();
        assert_eq!(
            project(d("2024-06-01"), 7, "1000-1045", 1, &snap),
            Err(ProjectError::BadWeekday)
        );
        assert!(matches!(
            project(d("2024-06-01"), 1, "2400-2445", 1, &snap),
            Err(ProjectError::UnknownSlot(_))
        ));
    }
}
