use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{RequestStatus, SessionEdit, SessionEditRequest};
use crate::services::lifecycle::{self, LifecycleError, PendingEdit};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateEditRequestBody {
    pub sessions: Vec<SessionEdit>,
}

// POST /api/appointments/:id/edit-requests
pub async fn create_edit_request(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    Json(body): Json<CreateEditRequestBody>,
) -> Result<Json<SessionEditRequest>, AppError> {
    let db = state.db.lock().unwrap();

    let booking = queries::get_booking(&db, &appointment_id)?
        .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id}")))?;

    let now = Utc::now().naive_utc();
    lifecycle::validate_edit_request(&booking.sessions, &body.sessions, now).map_err(
        |e| match e {
            LifecycleError::SessionLocked(_) | LifecycleError::ProposedTimeLocked(_) => {
                AppError::Locked(e.to_string())
            }
            other => AppError::Validation(other.to_string()),
        },
    )?;

    let request = SessionEditRequest {
        id: Uuid::new_v4().to_string(),
        appointment_id: appointment_id.clone(),
        sessions: body.sessions,
        status: RequestStatus::Pending,
        created_at: now,
    };
    queries::create_edit_request(&db, &request)?;

    tracing::info!(
        "created edit request {} for appointment {appointment_id} ({} sessions)",
        request.id,
        request.sessions.len()
    );

    Ok(Json(request))
}

// GET /api/appointments/:id/edit-requests/pending-map
pub async fn get_pending_map(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<HashMap<String, PendingEdit>>, AppError> {
    let db = state.db.lock().unwrap();

    if queries::get_booking(&db, &appointment_id)?.is_none() {
        return Err(AppError::NotFound(format!("appointment {appointment_id}")));
    }
    let requests = queries::list_edit_requests_for_appointment(&db, &appointment_id)?;
    Ok(Json(lifecycle::pending_map(&requests)))
}
