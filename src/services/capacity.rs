use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::AvailabilitySnapshot;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct SlotCapacity {
    pub available_therapists: i64,
    pub booked_therapists: i64,
}

/// Count, for one (date, slot), how many therapists are available and how
/// many of those already hold a booking in that slot.
///
/// A therapist counts as booked once per slot no matter how many of their
/// sessions fall into it, so `booked_therapists` is a therapist count, not
/// a session count. Linear in therapists x bookings; fine for the month-or-
/// two ranges the screens request.
pub fn compute(date: NaiveDate, slot_id: &str, snapshot: &AvailabilitySnapshot) -> SlotCapacity {
    let mut available = 0i64;
    let mut booked = 0i64;

    for therapist in &snapshot.therapists {
        if !therapist.is_available_for_slot(date, slot_id) {
            continue;
        }
        available += 1;

        let slots_used: HashSet<&str> = snapshot
            .bookings
            .iter()
            .filter(|b| b.therapist_id == therapist.id)
            .flat_map(|b| b.sessions.iter())
            .filter(|s| s.date == date)
            .map(|s| s.slot_id.as_str())
            .collect();

        if slots_used.contains(slot_id) {
            booked += 1;
        }
    }

    SlotCapacity {
        available_therapists: available,
        booked_therapists: booked,
    }
}
