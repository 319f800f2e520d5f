use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{
    slot, Package, RequestStatus, RequestedSession, Session, SessionEdit, SessionEditRequest,
};
use crate::services::lock;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LifecycleError {
    #[error("request is no longer pending")]
    NotPending,

    #[error("request has already been decided")]
    AlreadyDecided,

    #[error("a request needs at least one session")]
    NoSessions,

    #[error("selected {selected} sessions but the package allows {allowed}")]
    TooManySessions { selected: usize, allowed: i64 },

    #[error("unknown slot id: {0}")]
    UnknownSlot(String),

    #[error("session {0} does not belong to this appointment")]
    UnknownSession(String),

    #[error("session {0} starts too soon to be edited")]
    SessionLocked(String),

    #[error("session {0} cannot be moved into the next two hours")]
    ProposedTimeLocked(String),
}

/// Requests move Pending -> Approved or Pending -> Rejected; both end
/// states are terminal.
pub fn validate_transition(
    current: &RequestStatus,
    next: &RequestStatus,
) -> Result<(), LifecycleError> {
    match (current, next) {
        (RequestStatus::Pending, RequestStatus::Approved)
        | (RequestStatus::Pending, RequestStatus::Rejected) => Ok(()),
        _ => Err(LifecycleError::AlreadyDecided),
    }
}

/// A booking request's session list may be replaced, and the request
/// deleted, only while it is pending.
pub fn ensure_mutable(status: &RequestStatus) -> Result<(), LifecycleError> {
    if *status == RequestStatus::Pending {
        Ok(())
    } else {
        Err(LifecycleError::NotPending)
    }
}

/// Validate the session list of a new or edited booking request against
/// the catalog and the package's session allowance.
pub fn validate_request_sessions(
    sessions: &[RequestedSession],
    package: &Package,
) -> Result<(), LifecycleError> {
    if sessions.is_empty() {
        return Err(LifecycleError::NoSessions);
    }
    if sessions.len() as i64 > package.total_sessions {
        return Err(LifecycleError::TooManySessions {
            selected: sessions.len(),
            allowed: package.total_sessions,
        });
    }
    for s in sessions {
        if slot::find(&s.slot_id).is_none() {
            return Err(LifecycleError::UnknownSlot(s.slot_id.clone()));
        }
    }
    Ok(())
}

/// Validate a bulk session edit request before anything is written.
///
/// Every touched session must exist on the appointment and sit outside
/// the lock window, every proposed slot must exist in the catalog, and
/// the proposed (date, slot) must itself be outside the window. A user
/// may not move a session into the blocked two hours even when its
/// current slot is not locked.
pub fn validate_edit_request(
    confirmed_sessions: &[Session],
    edits: &[SessionEdit],
    now: NaiveDateTime,
) -> Result<(), LifecycleError> {
    if edits.is_empty() {
        return Err(LifecycleError::NoSessions);
    }
    for edit in edits {
        let current = confirmed_sessions
            .iter()
            .find(|s| s.id == edit.session_id)
            .ok_or_else(|| LifecycleError::UnknownSession(edit.session_id.clone()))?;

        if slot::find(&edit.new_slot_id).is_none() {
            return Err(LifecycleError::UnknownSlot(edit.new_slot_id.clone()));
        }
        if lock::is_locked(current.date, &current.slot_id, now) {
            return Err(LifecycleError::SessionLocked(edit.session_id.clone()));
        }
        if lock::is_locked(edit.new_date, &edit.new_slot_id, now) {
            return Err(LifecycleError::ProposedTimeLocked(edit.session_id.clone()));
        }
    }
    Ok(())
}

/// The active proposal shown as a "Requested: <date>" overlay for one
/// confirmed session.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PendingEdit {
    pub request_id: String,
    pub status: RequestStatus,
    pub new_date: chrono::NaiveDate,
    pub new_slot_id: String,
}

/// Associate each session id with its most relevant active proposal: the
/// most recently created edit request touching it whose status is Pending
/// or Approved. Rejected requests never appear, so a session with only
/// rejected history shows no overlay.
pub fn pending_map(requests: &[SessionEditRequest]) -> HashMap<String, PendingEdit> {
    let mut by_created: Vec<&SessionEditRequest> = requests
        .iter()
        .filter(|r| r.status != RequestStatus::Rejected)
        .collect();
    by_created.sort_by_key(|r| r.created_at);

    let mut map = HashMap::new();
    for request in by_created {
        for edit in &request.sessions {
            map.insert(
                edit.session_id.clone(),
                PendingEdit {
                    request_id: request.id.clone(),
                    status: request.status.clone(),
                    new_date: edit.new_date,
                    new_slot_id: edit.new_slot_id.clone(),
                },
            );
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn package(total: i64) -> Package {
        Package {
            id: "pkg1".to_string(),
            name: "Starter".to_string(),
            total_sessions: total,
        }
    }

    fn requested(date: &str, slot: &str) -> RequestedSession {
        RequestedSession {
            date: d(date),
            slot_id: slot.to_string(),
        }
    }

    fn session(id: &str, date: &str, slot: &str) -> Session {
        Session {
            id: id.to_string(),
            date: d(date),
            slot_id: slot.to_string(),
        }
    }

    fn edit(session_id: &str, date: &str, slot: &str) -> SessionEdit {
        SessionEdit {
            session_id: session_id.to_string(),
            new_date: d(date),
            new_slot_id: slot.to_string(),
        }
    }

    fn edit_request(
        id: &str,
        status: RequestStatus,
        created_at: &str,
        sessions: Vec<SessionEdit>,
    ) -> SessionEditRequest {
        SessionEditRequest {
            id: id.to_string(),
            appointment_id: "a1".to_string(),
            sessions,
            status,
            created_at: dt(created_at),
        }
    }

    #[test]
    fn test_only_pending_transitions() {
        use RequestStatus::*;
        assert!(validate_transition(&Pending, &Approved).is_ok());
        assert!(validate_transition(&Pending, &Rejected).is_ok());
        assert!(validate_transition(&Approved, &Rejected).is_err());
        assert!(validate_transition(&Rejected, &Approved).is_err());
        assert!(validate_transition(&Approved, &Pending).is_err());
    }

    #[test]
    fn test_mutable_only_while_pending() {
        assert!(ensure_mutable(&RequestStatus::Pending).is_ok());
        assert_eq!(
            ensure_mutable(&RequestStatus::Approved),
            Err(LifecycleError::NotPending)
        );
    }

    #[test]
    fn test_session_count_bounded_by_package() {
        let sessions = vec![
            requested("2024-06-03", "1000-1045"),
            requested("2024-06-10", "1000-1045"),
            requested("2024-06-17", "1000-1045"),
        ];
        assert!(validate_request_sessions(&sessions, &package(3)).is_ok());
        assert_eq!(
            validate_request_sessions(&sessions, &package(2)),
            Err(LifecycleError::TooManySessions {
                selected: 3,
                allowed: 2
            })
        );
    }

    #[test]
    fn test_rejects_empty_and_unknown_slot() {
        assert_eq!(
            validate_request_sessions(&[], &package(3)),
            Err(LifecycleError::NoSessions)
        );
        let sessions = vec![requested("2024-06-03", "2500-2545")];
        assert!(matches!(
            validate_request_sessions(&sessions, &package(3)),
            Err(LifecycleError::UnknownSlot(_))
        ));
    }

    #[test]
    fn test_edit_request_rejects_locked_session() {
        let confirmed = vec![session("s1", "2024-06-03", "1000-1045")];
        let edits = vec![edit("s1", "2024-06-10", "1000-1045")];
        // 09:00 same day: 60 minutes before start, locked
        assert_eq!(
            validate_edit_request(&confirmed, &edits, dt("2024-06-03 09:00")),
            Err(LifecycleError::SessionLocked("s1".to_string()))
        );
        // far in advance: fine
        assert!(validate_edit_request(&confirmed, &edits, dt("2024-06-01 09:00")).is_ok());
    }

    #[test]
    fn test_edit_request_rejects_move_into_window() {
        let confirmed = vec![session("s1", "2024-06-10", "1000-1045")];
        // moving onto a slot starting within two hours of now
        let edits = vec![edit("s1", "2024-06-03", "1000-1045")];
        assert_eq!(
            validate_edit_request(&confirmed, &edits, dt("2024-06-03 09:00")),
            Err(LifecycleError::ProposedTimeLocked("s1".to_string()))
        );
    }

    #[test]
    fn test_edit_request_rejects_unknown_session() {
        let confirmed = vec![session("s1", "2024-06-10", "1000-1045")];
        let edits = vec![edit("nope", "2024-06-17", "1000-1045")];
        assert_eq!(
            validate_edit_request(&confirmed, &edits, dt("2024-06-01 09:00")),
            Err(LifecycleError::UnknownSession("nope".to_string()))
        );
    }

    #[test]
    fn test_pending_map_tracks_latest_active_proposal() {
        let requests = vec![
            edit_request(
                "r1",
                RequestStatus::Pending,
                "2024-05-01 10:00",
                vec![edit("s1", "2024-06-10", "1000-1045")],
            ),
            edit_request(
                "r2",
                RequestStatus::Pending,
                "2024-05-02 10:00",
                vec![edit("s1", "2024-06-17", "1045-1130")],
            ),
        ];
        let map = pending_map(&requests);
        let entry = map.get("s1").unwrap();
        assert_eq!(entry.request_id, "r2");
        assert_eq!(entry.new_date, d("2024-06-17"));
    }

    #[test]
    fn test_pending_map_excludes_rejected() {
        let requests = vec![edit_request(
            "r1",
            RequestStatus::Rejected,
            "2024-05-01 10:00",
            vec![edit("s1", "2024-06-10", "1000-1045")],
        )];
        assert!(pending_map(&requests).is_empty());
    }

    #[test]
    fn test_pending_map_keeps_approved() {
        let requests = vec![edit_request(
            "r1",
            RequestStatus::Approved,
            "2024-05-01 10:00",
            vec![edit("s1", "2024-06-10", "1000-1045")],
        )];
        let map = pending_map(&requests);
        assert_eq!(map.get("s1").unwrap().status, RequestStatus::Approved);
    }
}
