use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::models::{
    AvailabilitySnapshot, Booking, BookingRequest, Holiday, Package, RequestStatus,
    RequestedSession, Session, SessionEdit, SessionEditRequest, Therapist,
};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_date(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT).map_err(|e| anyhow::anyhow!("bad date {s}: {e}"))
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

fn now_str() -> String {
    Utc::now().naive_utc().format(DATETIME_FMT).to_string()
}

// ── Therapists & holidays ──

pub fn create_therapist(conn: &Connection, id: &str, name: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO therapists (id, name) VALUES (?1, ?2)",
        params![id, name],
    )?;
    Ok(())
}

pub fn add_holiday(
    conn: &Connection,
    id: &str,
    therapist_id: &str,
    holiday: &Holiday,
    reason: Option<&str>,
) -> anyhow::Result<()> {
    let (date, slot_ids) = match holiday {
        Holiday::FullDay { date } => (fmt_date(*date), None),
        Holiday::PartialDay { date, slot_ids } => {
            (fmt_date(*date), Some(serde_json::to_string(slot_ids)?))
        }
    };
    conn.execute(
        "INSERT INTO holidays (id, therapist_id, date, slot_ids, reason) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, therapist_id, date, slot_ids, reason],
    )?;
    Ok(())
}

fn holidays_for(conn: &Connection, therapist_id: &str) -> anyhow::Result<Vec<Holiday>> {
    let mut stmt =
        conn.prepare("SELECT date, slot_ids FROM holidays WHERE therapist_id = ?1 ORDER BY date")?;
    let rows = stmt.query_map(params![therapist_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
    })?;

    let mut holidays = vec![];
    for row in rows {
        let (date_str, slot_ids_json) = row?;
        let date = parse_date(&date_str)?;
        let holiday = match slot_ids_json {
            Some(json) => Holiday::PartialDay {
                date,
                slot_ids: serde_json::from_str(&json)?,
            },
            None => Holiday::FullDay { date },
        };
        holidays.push(holiday);
    }
    Ok(holidays)
}

pub fn list_therapists(conn: &Connection) -> anyhow::Result<Vec<Therapist>> {
    let mut stmt = conn.prepare("SELECT id, name FROM therapists ORDER BY name")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut therapists = vec![];
    for row in rows {
        let (id, name) = row?;
        let holidays = holidays_for(conn, &id)?;
        therapists.push(Therapist { id, name, holidays });
    }
    Ok(therapists)
}

pub fn get_therapist(conn: &Connection, id: &str) -> anyhow::Result<Option<Therapist>> {
    let result = conn.query_row(
        "SELECT id, name FROM therapists WHERE id = ?1",
        params![id],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
    );
    match result {
        Ok((id, name)) => {
            let holidays = holidays_for(conn, &id)?;
            Ok(Some(Therapist { id, name, holidays }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Packages ──

fn parse_package_row(row: &Row) -> rusqlite::Result<Package> {
    Ok(Package {
        id: row.get(0)?,
        name: row.get(1)?,
        total_sessions: row.get(2)?,
    })
}

pub fn list_packages(conn: &Connection) -> anyhow::Result<Vec<Package>> {
    let mut stmt =
        conn.prepare("SELECT id, name, total_sessions FROM packages ORDER BY total_sessions")?;
    let rows = stmt.query_map([], parse_package_row)?;

    let mut packages = vec![];
    for row in rows {
        packages.push(row?);
    }
    Ok(packages)
}

pub fn get_package(conn: &Connection, id: &str) -> anyhow::Result<Option<Package>> {
    let result = conn.query_row(
        "SELECT id, name, total_sessions FROM packages WHERE id = ?1",
        params![id],
        parse_package_row,
    );
    match result {
        Ok(p) => Ok(Some(p)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Bookings & sessions ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, therapist_id, patient_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            booking.id,
            booking.therapist_id,
            booking.patient_id,
            booking.created_at.format(DATETIME_FMT).to_string(),
            booking.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    for session in &booking.sessions {
        conn.execute(
            "INSERT INTO sessions (id, booking_id, date, slot_id) VALUES (?1, ?2, ?3, ?4)",
            params![session.id, booking.id, fmt_date(session.date), session.slot_id],
        )?;
    }
    Ok(())
}

fn sessions_for(conn: &Connection, booking_id: &str) -> anyhow::Result<Vec<Session>> {
    let mut stmt = conn
        .prepare("SELECT id, date, slot_id FROM sessions WHERE booking_id = ?1 ORDER BY date")?;
    let rows = stmt.query_map(params![booking_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut sessions = vec![];
    for row in rows {
        let (id, date_str, slot_id) = row?;
        sessions.push(Session {
            id,
            date: parse_date(&date_str)?,
            slot_id,
        });
    }
    Ok(sessions)
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, therapist_id, patient_id, created_at, updated_at FROM bookings WHERE id = ?1",
        params![id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        },
    );
    match result {
        Ok((id, therapist_id, patient_id, created_at, updated_at)) => {
            let sessions = sessions_for(conn, &id)?;
            Ok(Some(Booking {
                id,
                therapist_id,
                patient_id,
                sessions,
                created_at: parse_datetime(&created_at),
                updated_at: parse_datetime(&updated_at),
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Bookings that have at least one session in [start, end], with their
/// sessions filtered to that range. This is the engine's snapshot input;
/// sessions outside the range cannot affect capacity inside it.
pub fn bookings_in_range(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.therapist_id, b.patient_id, b.created_at, b.updated_at,
                s.id, s.date, s.slot_id
         FROM bookings b JOIN sessions s ON s.booking_id = b.id
         WHERE s.date >= ?1 AND s.date <= ?2
         ORDER BY b.id, s.date",
    )?;
    let rows = stmt.query_map(params![fmt_date(start), fmt_date(end)], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, String>(7)?,
        ))
    })?;

    let mut bookings: Vec<Booking> = vec![];
    for row in rows {
        let (id, therapist_id, patient_id, created_at, updated_at, sid, sdate, sslot) = row?;
        let session = Session {
            id: sid,
            date: parse_date(&sdate)?,
            slot_id: sslot,
        };
        match bookings.last_mut() {
            Some(last) if last.id == id => last.sessions.push(session),
            _ => bookings.push(Booking {
                id,
                therapist_id,
                patient_id,
                sessions: vec![session],
                created_at: parse_datetime(&created_at),
                updated_at: parse_datetime(&updated_at),
            }),
        }
    }
    Ok(bookings)
}

pub fn load_snapshot(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> anyhow::Result<AvailabilitySnapshot> {
    Ok(AvailabilitySnapshot::new(
        list_therapists(conn)?,
        bookings_in_range(conn, start, end)?,
    ))
}

pub fn update_session(
    conn: &Connection,
    session_id: &str,
    new_date: NaiveDate,
    new_slot_id: &str,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE sessions SET date = ?1, slot_id = ?2 WHERE id = ?3",
        params![fmt_date(new_date), new_slot_id, session_id],
    )?;
    Ok(count > 0)
}

// ── Booking requests ──

pub fn create_booking_request(conn: &Connection, request: &BookingRequest) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO booking_requests
           (id, patient_id, therapy_id, package_id, status, discount_note, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            request.id,
            request.patient_id,
            request.therapy_id,
            request.package_id,
            request.status.as_str(),
            request.discount_note,
            request.created_at.format(DATETIME_FMT).to_string(),
            request.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    insert_request_sessions(conn, &request.id, &request.sessions)?;
    Ok(())
}

fn insert_request_sessions(
    conn: &Connection,
    request_id: &str,
    sessions: &[RequestedSession],
) -> anyhow::Result<()> {
    for s in sessions {
        conn.execute(
            "INSERT INTO booking_request_sessions (request_id, date, slot_id) VALUES (?1, ?2, ?3)",
            params![request_id, fmt_date(s.date), s.slot_id],
        )?;
    }
    Ok(())
}

fn request_sessions_for(
    conn: &Connection,
    request_id: &str,
) -> anyhow::Result<Vec<RequestedSession>> {
    let mut stmt = conn.prepare(
        "SELECT date, slot_id FROM booking_request_sessions WHERE request_id = ?1 ORDER BY date",
    )?;
    let rows = stmt.query_map(params![request_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut sessions = vec![];
    for row in rows {
        let (date_str, slot_id) = row?;
        sessions.push(RequestedSession {
            date: parse_date(&date_str)?,
            slot_id,
        });
    }
    Ok(sessions)
}

pub fn get_booking_request(conn: &Connection, id: &str) -> anyhow::Result<Option<BookingRequest>> {
    let result = conn.query_row(
        "SELECT id, patient_id, therapy_id, package_id, status, discount_note, created_at, updated_at
         FROM booking_requests WHERE id = ?1",
        params![id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
            ))
        },
    );
    match result {
        Ok((id, patient_id, therapy_id, package_id, status, discount_note, created, updated)) => {
            let sessions = request_sessions_for(conn, &id)?;
            Ok(Some(BookingRequest {
                id,
                patient_id,
                therapy_id,
                package_id,
                sessions,
                status: RequestStatus::from_str(&status),
                discount_note,
                created_at: parse_datetime(&created),
                updated_at: parse_datetime(&updated),
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn replace_request_sessions(
    conn: &Connection,
    request_id: &str,
    sessions: &[RequestedSession],
) -> anyhow::Result<()> {
    conn.execute(
        "DELETE FROM booking_request_sessions WHERE request_id = ?1",
        params![request_id],
    )?;
    insert_request_sessions(conn, request_id, sessions)?;
    conn.execute(
        "UPDATE booking_requests SET updated_at = ?1 WHERE id = ?2",
        params![now_str(), request_id],
    )?;
    Ok(())
}

pub fn update_request_status(
    conn: &Connection,
    id: &str,
    status: &RequestStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE booking_requests SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now_str(), id],
    )?;
    Ok(count > 0)
}

pub fn delete_booking_request(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM booking_requests WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn list_booking_requests(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<BookingRequest>> {
    let ids: Vec<String> = match status_filter {
        Some(status) => {
            let mut stmt = conn.prepare(
                "SELECT id FROM booking_requests WHERE status = ?1 ORDER BY created_at DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![status, limit], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        }
        None => {
            let mut stmt =
                conn.prepare("SELECT id FROM booking_requests ORDER BY created_at DESC LIMIT ?1")?;
            let rows = stmt.query_map(params![limit], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        }
    };

    let mut requests = vec![];
    for id in ids {
        if let Some(request) = get_booking_request(conn, &id)? {
            requests.push(request);
        }
    }
    Ok(requests)
}

// ── Session edit requests ──

pub fn create_edit_request(conn: &Connection, request: &SessionEditRequest) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO edit_requests (id, appointment_id, status, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            request.id,
            request.appointment_id,
            request.status.as_str(),
            request.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    for edit in &request.sessions {
        conn.execute(
            "INSERT INTO edit_request_sessions (edit_request_id, session_id, new_date, new_slot_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                request.id,
                edit.session_id,
                fmt_date(edit.new_date),
                edit.new_slot_id
            ],
        )?;
    }
    Ok(())
}

fn edit_sessions_for(conn: &Connection, request_id: &str) -> anyhow::Result<Vec<SessionEdit>> {
    let mut stmt = conn.prepare(
        "SELECT session_id, new_date, new_slot_id FROM edit_request_sessions
         WHERE edit_request_id = ?1",
    )?;
    let rows = stmt.query_map(params![request_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut edits = vec![];
    for row in rows {
        let (session_id, date_str, slot_id) = row?;
        edits.push(SessionEdit {
            session_id,
            new_date: parse_date(&date_str)?,
            new_slot_id: slot_id,
        });
    }
    Ok(edits)
}

pub fn get_edit_request(conn: &Connection, id: &str) -> anyhow::Result<Option<SessionEditRequest>> {
    let result = conn.query_row(
        "SELECT id, appointment_id, status, created_at FROM edit_requests WHERE id = ?1",
        params![id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    );
    match result {
        Ok((id, appointment_id, status, created_at)) => {
            let sessions = edit_sessions_for(conn, &id)?;
            Ok(Some(SessionEditRequest {
                id,
                appointment_id,
                sessions,
                status: RequestStatus::from_str(&status),
                created_at: parse_datetime(&created_at),
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_edit_requests_for_appointment(
    conn: &Connection,
    appointment_id: &str,
) -> anyhow::Result<Vec<SessionEditRequest>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM edit_requests WHERE appointment_id = ?1 ORDER BY created_at ASC",
    )?;
    let ids: Vec<String> = stmt
        .query_map(params![appointment_id], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    let mut requests = vec![];
    for id in ids {
        if let Some(request) = get_edit_request(conn, &id)? {
            requests.push(request);
        }
    }
    Ok(requests)
}

pub fn update_edit_request_status(
    conn: &Connection,
    id: &str,
    status: &RequestStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE edit_requests SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

// ── Per-day slot capacity overrides ──

pub fn upsert_slot_capacity(
    conn: &Connection,
    date: NaiveDate,
    slot_id: &str,
    therapist_count: i64,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO slot_capacity (date, slot_id, therapist_count) VALUES (?1, ?2, ?3)
         ON CONFLICT(date, slot_id) DO UPDATE SET therapist_count = excluded.therapist_count",
        params![fmt_date(date), slot_id, therapist_count],
    )?;
    Ok(())
}

pub fn get_slot_capacity(
    conn: &Connection,
    date: NaiveDate,
    slot_id: &str,
) -> anyhow::Result<Option<i64>> {
    let result = conn.query_row(
        "SELECT therapist_count FROM slot_capacity WHERE date = ?1 AND slot_id = ?2",
        params![fmt_date(date), slot_id],
        |row| row.get(0),
    );
    match result {
        Ok(count) => Ok(Some(count)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn slot_capacity_in_range(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> anyhow::Result<HashMap<(NaiveDate, String), i64>> {
    let mut stmt = conn.prepare(
        "SELECT date, slot_id, therapist_count FROM slot_capacity WHERE date >= ?1 AND date <= ?2",
    )?;
    let rows = stmt.query_map(params![fmt_date(start), fmt_date(end)], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
        ))
    })?;

    let mut map = HashMap::new();
    for row in rows {
        let (date_str, slot_id, count) = row?;
        map.insert((parse_date(&date_str)?, slot_id), count);
    }
    Ok(map)
}
