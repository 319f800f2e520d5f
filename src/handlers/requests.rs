use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{BookingRequest, RequestStatus, RequestedSession};
use crate::services::{lifecycle, projector};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RepeatSpec {
    pub start_date: NaiveDate,
    /// 0 = Sunday .. 6 = Saturday.
    pub weekday: u32,
    pub slot_id: String,
    pub session_count: usize,
}

#[derive(Deserialize)]
pub struct CreateRequestBody {
    pub patient_id: String,
    pub therapy_id: String,
    pub package_id: String,
    pub discount_note: Option<String>,
    #[serde(default)]
    pub sessions: Vec<RequestedSession>,
    pub repeat: Option<RepeatSpec>,
}

#[derive(Serialize)]
pub struct CreateRequestResponse {
    pub request: BookingRequest,
    /// Dates the weekly projection had to drop, with display messages.
    pub conflicts: Vec<String>,
}

// POST /api/requests
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateRequestBody>,
) -> Result<Json<CreateRequestResponse>, AppError> {
    let db = state.db.lock().unwrap();

    let package = queries::get_package(&db, &body.package_id)?
        .ok_or_else(|| AppError::NotFound(format!("package {}", body.package_id)))?;

    let (sessions, conflicts) = match &body.repeat {
        Some(repeat) => {
            // Snapshot covers the whole progression the projector can emit.
            let horizon =
                repeat.start_date + Duration::days(7 * repeat.session_count as i64 + 7);
            let snapshot = queries::load_snapshot(&db, repeat.start_date, horizon)?;
            let projection = projector::project(
                repeat.start_date,
                repeat.weekday,
                &repeat.slot_id,
                repeat.session_count,
                &snapshot,
            )
            .map_err(|e| AppError::Validation(e.to_string()))?;

            let sessions = projection
                .dates
                .iter()
                .map(|date| RequestedSession {
                    date: *date,
                    slot_id: repeat.slot_id.clone(),
                })
                .collect();
            (sessions, projection.conflicts.into_values().collect())
        }
        None => (body.sessions.clone(), vec![]),
    };

    lifecycle::validate_request_sessions(&sessions, &package)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let now = Utc::now().naive_utc();
    let request = BookingRequest {
        id: Uuid::new_v4().to_string(),
        patient_id: body.patient_id,
        therapy_id: body.therapy_id,
        package_id: body.package_id,
        sessions,
        status: RequestStatus::Pending,
        discount_note: body.discount_note,
        created_at: now,
        updated_at: now,
    };
    queries::create_booking_request(&db, &request)?;

    tracing::info!(
        "created booking request {} with {} sessions ({} dropped)",
        request.id,
        request.sessions.len(),
        conflicts.len()
    );

    Ok(Json(CreateRequestResponse { request, conflicts }))
}

// GET /api/requests/:id
pub async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingRequest>, AppError> {
    let db = state.db.lock().unwrap();
    let request = queries::get_booking_request(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("request {id}")))?;
    Ok(Json(request))
}

#[derive(Deserialize)]
pub struct UpdateRequestBody {
    pub sessions: Vec<RequestedSession>,
}

// PUT /api/requests/:id
pub async fn update_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateRequestBody>,
) -> Result<Json<BookingRequest>, AppError> {
    let db = state.db.lock().unwrap();

    let request = queries::get_booking_request(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("request {id}")))?;
    lifecycle::ensure_mutable(&request.status)
        .map_err(|e| AppError::Conflict(e.to_string()))?;

    let package = queries::get_package(&db, &request.package_id)?
        .ok_or_else(|| AppError::NotFound(format!("package {}", request.package_id)))?;
    lifecycle::validate_request_sessions(&body.sessions, &package)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    queries::replace_request_sessions(&db, &id, &body.sessions)?;
    let updated = queries::get_booking_request(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("request {id}")))?;
    Ok(Json(updated))
}

// DELETE /api/requests/:id
pub async fn delete_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();

    let request = queries::get_booking_request(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("request {id}")))?;
    lifecycle::ensure_mutable(&request.status)
        .map_err(|e| AppError::Conflict(e.to_string()))?;

    queries::delete_booking_request(&db, &id)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
