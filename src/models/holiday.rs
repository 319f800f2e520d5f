use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A day (or part of a day) on which a therapist takes no sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Holiday {
    FullDay { date: NaiveDate },
    PartialDay { date: NaiveDate, slot_ids: Vec<String> },
}

impl Holiday {
    pub fn date(&self) -> NaiveDate {
        match self {
            Holiday::FullDay { date } => *date,
            Holiday::PartialDay { date, .. } => *date,
        }
    }

    /// Whether this holiday blocks the given slot on the given date.
    pub fn blocks(&self, date: NaiveDate, slot_id: &str) -> bool {
        match self {
            Holiday::FullDay { date: d } => *d == date,
            Holiday::PartialDay { date: d, slot_ids } => {
                *d == date && slot_ids.iter().any(|s| s == slot_id)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Therapist {
    pub id: String,
    pub name: String,
    pub holidays: Vec<Holiday>,
}

impl Therapist {
    /// A therapist is available on a date iff no full-day holiday covers it.
    /// Partial-day holidays only remove individual slots.
    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self
            .holidays
            .iter()
            .any(|h| matches!(h, Holiday::FullDay { date: d } if *d == date))
    }

    pub fn is_available_for_slot(&self, date: NaiveDate, slot_id: &str) -> bool {
        !self.holidays.iter().any(|h| h.blocks(date, slot_id))
    }
}
