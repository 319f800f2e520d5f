use chrono::NaiveTime;
use serde::Serialize;

/// One of the clinic's fixed daily time windows, identified by an
/// `"HHMM-HHMM"` string id. The catalog never changes at runtime.
#[derive(Debug, Clone, Serialize)]
pub struct SlotDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub is_limited: bool,
}

// 45-minute windows from 08:30, with a 30-minute gap before the evening
// block, ending 20:15. The two early and three late windows take limited
// cases only and default to zero capacity.
const CATALOG: [SlotDefinition; 15] = [
    SlotDefinition { id: "0830-0915", label: "08:30 - 09:15", is_limited: true },
    SlotDefinition { id: "0915-1000", label: "09:15 - 10:00", is_limited: true },
    SlotDefinition { id: "1000-1045", label: "10:00 - 10:45", is_limited: false },
    SlotDefinition { id: "1045-1130", label: "10:45 - 11:30", is_limited: false },
    SlotDefinition { id: "1130-1215", label: "11:30 - 12:15", is_limited: false },
    SlotDefinition { id: "1215-1300", label: "12:15 - 13:00", is_limited: false },
    SlotDefinition { id: "1300-1345", label: "13:00 - 13:45", is_limited: false },
    SlotDefinition { id: "1345-1430", label: "13:45 - 14:30", is_limited: false },
    SlotDefinition { id: "1430-1515", label: "14:30 - 15:15", is_limited: false },
    SlotDefinition { id: "1515-1600", label: "15:15 - 16:00", is_limited: false },
    SlotDefinition { id: "1600-1645", label: "16:00 - 16:45", is_limited: false },
    SlotDefinition { id: "1645-1730", label: "16:45 - 17:30", is_limited: false },
    SlotDefinition { id: "1800-1845", label: "18:00 - 18:45", is_limited: true },
    SlotDefinition { id: "1845-1930", label: "18:45 - 19:30", is_limited: true },
    SlotDefinition { id: "1930-2015", label: "19:30 - 20:15", is_limited: true },
];

pub fn all() -> &'static [SlotDefinition] {
    &CATALOG
}

pub fn find(slot_id: &str) -> Option<&'static SlotDefinition> {
    CATALOG.iter().find(|s| s.id == slot_id)
}

pub fn label_for(slot_id: &str) -> Option<&'static str> {
    find(slot_id).map(|s| s.label)
}

pub fn is_limited(slot_id: &str) -> bool {
    find(slot_id).map(|s| s.is_limited).unwrap_or(false)
}

/// Start time-of-day of a slot, parsed from the first half of its id.
pub fn start_time(slot_id: &str) -> Option<NaiveTime> {
    let def = find(slot_id)?;
    let hhmm = &def.id[..4];
    let hour: u32 = hhmm[..2].parse().ok()?;
    let minute: u32 = hhmm[2..].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}
