use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One confirmed session of an appointment: a date plus a catalog slot id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    pub date: NaiveDate,
    pub slot_id: String,
}

/// A confirmed assignment of sessions to a therapist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub therapist_id: String,
    pub patient_id: String,
    pub sessions: Vec<Session>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    pub name: String,
    pub total_sessions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "approved" => RequestStatus::Approved,
            "rejected" => RequestStatus::Rejected,
            _ => RequestStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// A date/slot pair selected on a booking request, before any therapist
/// is assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestedSession {
    pub date: NaiveDate,
    pub slot_id: String,
}

/// A parent-submitted, admin-reviewed proposal to create an appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: String,
    pub patient_id: String,
    pub therapy_id: String,
    pub package_id: String,
    pub sessions: Vec<RequestedSession>,
    pub status: RequestStatus,
    pub discount_note: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// One proposed change inside a session edit request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEdit {
    pub session_id: String,
    pub new_date: NaiveDate,
    pub new_slot_id: String,
}

/// A proposal to move one or more confirmed sessions of an appointment
/// to new date/slot pairs. Tracked independently per appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEditRequest {
    pub id: String,
    pub appointment_id: String,
    pub sessions: Vec<SessionEdit>,
    pub status: RequestStatus,
    pub created_at: NaiveDateTime,
}
