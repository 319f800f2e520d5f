use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::slot;
use crate::services::{capacity, conflict};
use crate::state::AppState;

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date: {s}")))
}

// GET /api/slots
#[derive(Serialize)]
pub struct SlotResponse {
    id: &'static str,
    label: &'static str,
    is_limited: bool,
}

pub async fn get_slots() -> Json<Vec<SlotResponse>> {
    let slots = slot::all()
        .iter()
        .map(|s| SlotResponse {
            id: s.id,
            label: s.label,
            is_limited: s.is_limited,
        })
        .collect();
    Json(slots)
}

// GET /api/availability?start=YYYY-MM-DD&end=YYYY-MM-DD
#[derive(Deserialize)]
pub struct RangeQuery {
    pub start: String,
    pub end: String,
}

#[derive(Serialize)]
pub struct SlotAvailability {
    slot_id: &'static str,
    /// Capacity ceiling for the slot: the admin override when one is
    /// set, otherwise the number of therapists not on holiday.
    count: i64,
    booked: i64,
}

#[derive(Serialize)]
pub struct DayAvailability {
    date: NaiveDate,
    slots: Vec<SlotAvailability>,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<DayAvailability>>, AppError> {
    let start = parse_date(&query.start)?;
    let end = parse_date(&query.end)?;
    if end < start {
        return Err(AppError::Validation("end must not precede start".to_string()));
    }

    let (snapshot, overrides) = {
        let db = state.db.lock().unwrap();
        (
            queries::load_snapshot(&db, start, end)?,
            queries::slot_capacity_in_range(&db, start, end)?,
        )
    };

    let mut days = vec![];
    let mut date = start;
    while date <= end {
        let slots = slot::all()
            .iter()
            .map(|def| {
                let cap = capacity::compute(date, def.id, &snapshot);
                let count = overrides
                    .get(&(date, def.id.to_string()))
                    .copied()
                    .unwrap_or(cap.available_therapists);
                SlotAvailability {
                    slot_id: def.id,
                    count,
                    booked: cap.booked_therapists,
                }
            })
            .collect();
        days.push(DayAvailability { date, slots });
        date += chrono::Duration::days(1);
    }

    Ok(Json(days))
}

// GET /api/availability/day?date=YYYY-MM-DD&retained_slot=HHMM-HHMM
#[derive(Deserialize)]
pub struct DayQuery {
    pub date: String,
    #[serde(default)]
    pub retained_slot: String,
}

#[derive(Serialize)]
pub struct SlotPick {
    slot_id: &'static str,
    label: &'static str,
    is_limited: bool,
    available_therapists: i64,
    booked_therapists: i64,
    disabled: bool,
    reason: Option<String>,
}

/// Per-slot picker decisions for a single day, with the retained slot of
/// the session being edited exempt from the full-slot rule.
pub async fn get_day_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Vec<SlotPick>>, AppError> {
    let date = parse_date(&query.date)?;

    let snapshot = {
        let db = state.db.lock().unwrap();
        queries::load_snapshot(&db, date, date)?
    };

    let picks = slot::all()
        .iter()
        .map(|def| {
            let cap = capacity::compute(date, def.id, &snapshot);
            let decision = conflict::check(date, def.id, &query.retained_slot, &snapshot);
            SlotPick {
                slot_id: def.id,
                label: def.label,
                is_limited: def.is_limited,
                available_therapists: cap.available_therapists,
                booked_therapists: cap.booked_therapists,
                disabled: decision.disabled,
                reason: decision.reason,
            }
        })
        .collect();

    Ok(Json(picks))
}

// GET /api/packages
pub async fn get_packages(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<crate::models::Package>>, AppError> {
    let packages = {
        let db = state.db.lock().unwrap();
        queries::list_packages(&db)?
    };
    Ok(Json(packages))
}
