use chrono::NaiveDate;
use serde::Serialize;

use crate::models::AvailabilitySnapshot;
use crate::services::capacity;

pub const SLOT_FULL_MESSAGE: &str = "All slots are filled for this time";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlotDecision {
    pub disabled: bool,
    pub reason: Option<String>,
}

impl SlotDecision {
    fn allowed() -> Self {
        Self {
            disabled: false,
            reason: None,
        }
    }

    fn full() -> Self {
        Self {
            disabled: true,
            reason: Some(SLOT_FULL_MESSAGE.to_string()),
        }
    }
}

/// Decide whether a slot may take a new assignment on a date.
///
/// A slot is disabled when every available therapist already holds a
/// booking in it, unless it is the slot the session being edited already
/// holds (`retained_slot_id`), so retaining an assignment never blocks
/// itself. A day with zero available therapists is not disabled by this
/// rule; callers surface "no therapists" separately.
pub fn check(
    date: NaiveDate,
    slot_id: &str,
    retained_slot_id: &str,
    snapshot: &AvailabilitySnapshot,
) -> SlotDecision {
    let cap = capacity::compute(date, slot_id, snapshot);

    if cap.available_therapists > 0
        && cap.booked_therapists >= cap.available_therapists
        && slot_id != retained_slot_id
    {
        return SlotDecision::full();
    }

    SlotDecision::allowed()
}
