use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{slot, Booking, BookingRequest, Holiday, RequestStatus, Session, Therapist};
use crate::services::{capacity_defaults, lifecycle};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/requests
#[derive(Deserialize)]
pub struct RequestsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_requests(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<RequestsQuery>,
) -> Result<Json<Vec<BookingRequest>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let requests =
        queries::list_booking_requests(&db, query.status.as_deref(), query.limit.unwrap_or(50))?;
    Ok(Json(requests))
}

// POST /api/admin/requests/:id/approve
#[derive(Deserialize)]
pub struct ApproveRequestBody {
    pub therapist_id: String,
}

/// Approving a booking request materializes the appointment: a Booking
/// assigned to the chosen therapist, with one confirmed session per
/// requested date/slot.
pub async fn approve_request(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ApproveRequestBody>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();

    let request = queries::get_booking_request(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("request {id}")))?;
    lifecycle::validate_transition(&request.status, &RequestStatus::Approved)
        .map_err(|e| AppError::Conflict(e.to_string()))?;

    if queries::get_therapist(&db, &body.therapist_id)?.is_none() {
        return Err(AppError::NotFound(format!("therapist {}", body.therapist_id)));
    }

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        therapist_id: body.therapist_id,
        patient_id: request.patient_id.clone(),
        sessions: request
            .sessions
            .iter()
            .map(|s| Session {
                id: Uuid::new_v4().to_string(),
                date: s.date,
                slot_id: s.slot_id.clone(),
            })
            .collect(),
        created_at: now,
        updated_at: now,
    };
    queries::create_booking(&db, &booking)?;
    queries::update_request_status(&db, &id, &RequestStatus::Approved)?;

    tracing::info!("approved request {id} as booking {}", booking.id);
    Ok(Json(booking))
}

// POST /api/admin/requests/:id/reject
pub async fn reject_request(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let request = queries::get_booking_request(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("request {id}")))?;
    lifecycle::validate_transition(&request.status, &RequestStatus::Rejected)
        .map_err(|e| AppError::Conflict(e.to_string()))?;

    queries::update_request_status(&db, &id, &RequestStatus::Rejected)?;
    tracing::info!("rejected request {id}");
    Ok(Json(serde_json::json!({ "ok": true })))
}

// POST /api/admin/edit-requests/:id/approve
/// Approving an edit request rewrites the confirmed sessions it touches.
pub async fn approve_edit_request(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let request = queries::get_edit_request(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("edit request {id}")))?;
    lifecycle::validate_transition(&request.status, &RequestStatus::Approved)
        .map_err(|e| AppError::Conflict(e.to_string()))?;

    for edit in &request.sessions {
        if !queries::update_session(&db, &edit.session_id, edit.new_date, &edit.new_slot_id)? {
            return Err(AppError::NotFound(format!("session {}", edit.session_id)));
        }
    }
    queries::update_edit_request_status(&db, &id, &RequestStatus::Approved)?;

    tracing::info!(
        "approved edit request {id}, moved {} sessions",
        request.sessions.len()
    );
    Ok(Json(serde_json::json!({ "ok": true })))
}

// POST /api/admin/edit-requests/:id/reject
pub async fn reject_edit_request(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let request = queries::get_edit_request(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("edit request {id}")))?;
    lifecycle::validate_transition(&request.status, &RequestStatus::Rejected)
        .map_err(|e| AppError::Conflict(e.to_string()))?;

    queries::update_edit_request_status(&db, &id, &RequestStatus::Rejected)?;
    tracing::info!("rejected edit request {id}");
    Ok(Json(serde_json::json!({ "ok": true })))
}

// GET /api/admin/therapists
pub async fn get_therapists(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Therapist>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_therapists(&db)?))
}

// POST /api/admin/therapists
#[derive(Deserialize)]
pub struct CreateTherapistBody {
    pub name: String,
}

pub async fn create_therapist(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateTherapistBody>,
) -> Result<Json<Therapist>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if body.name.trim().is_empty() {
        return Err(AppError::Validation("therapist name is required".to_string()));
    }

    let therapist = Therapist {
        id: Uuid::new_v4().to_string(),
        name: body.name,
        holidays: vec![],
    };
    let db = state.db.lock().unwrap();
    queries::create_therapist(&db, &therapist.id, &therapist.name)?;
    Ok(Json(therapist))
}

// POST /api/admin/therapists/:id/holidays
#[derive(Deserialize)]
pub struct AddHolidayBody {
    pub date: NaiveDate,
    /// Omitted or empty = full-day holiday.
    #[serde(default)]
    pub slot_ids: Vec<String>,
    pub reason: Option<String>,
}

pub async fn add_holiday(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(therapist_id): Path<String>,
    Json(body): Json<AddHolidayBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    for slot_id in &body.slot_ids {
        if slot::find(slot_id).is_none() {
            return Err(AppError::Validation(format!("unknown slot id: {slot_id}")));
        }
    }

    let holiday = if body.slot_ids.is_empty() {
        Holiday::FullDay { date: body.date }
    } else {
        Holiday::PartialDay {
            date: body.date,
            slot_ids: body.slot_ids,
        }
    };

    let db = state.db.lock().unwrap();
    if queries::get_therapist(&db, &therapist_id)?.is_none() {
        return Err(AppError::NotFound(format!("therapist {therapist_id}")));
    }
    queries::add_holiday(
        &db,
        &Uuid::new_v4().to_string(),
        &therapist_id,
        &holiday,
        body.reason.as_deref(),
    )?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

// POST /api/admin/capacity/defaults
#[derive(Deserialize, Default)]
pub struct ApplyDefaultsBody {
    /// Overrides the configured default therapist count for this apply.
    pub count: Option<i64>,
}

pub async fn apply_capacity_defaults(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<ApplyDefaultsBody>>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let count = body
        .and_then(|Json(b)| b.count)
        .unwrap_or(state.config.default_therapist_count);
    if count < 0 {
        return Err(AppError::Validation("count must not be negative".to_string()));
    }

    let today = Utc::now().date_naive();
    let db = state.db.lock().unwrap();
    let written = capacity_defaults::apply_defaults(&db, today, count)?;
    Ok(Json(serde_json::json!({ "ok": true, "written": written })))
}

// PUT /api/admin/capacity
#[derive(Deserialize)]
pub struct SetCapacityBody {
    pub date: NaiveDate,
    pub slot_id: String,
    pub count: i64,
}

pub async fn set_capacity(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SetCapacityBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if slot::find(&body.slot_id).is_none() {
        return Err(AppError::Validation(format!("unknown slot id: {}", body.slot_id)));
    }
    if body.count < 0 {
        return Err(AppError::Validation("count must not be negative".to_string()));
    }

    let db = state.db.lock().unwrap();
    queries::upsert_slot_capacity(&db, body.date, &body.slot_id, body.count)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
