use chrono::{Duration, NaiveDate};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::slot;

/// The bulk apply always targets the next 14 days, starting tomorrow.
pub const DEFAULT_APPLY_DAYS: i64 = 14;

/// Write the default therapist count for every slot over the next 14
/// days, excluding today. Existing per-day customization is overwritten
/// silently; a single confirmation modal guards this on the admin screen.
///
/// Limited slots always get 0, whatever the default count is.
pub fn apply_defaults(
    conn: &Connection,
    today: NaiveDate,
    default_count: i64,
) -> anyhow::Result<usize> {
    let mut written = 0;
    for offset in 1..=DEFAULT_APPLY_DAYS {
        let date = today + Duration::days(offset);
        for def in slot::all() {
            let count = if def.is_limited { 0 } else { default_count };
            queries::upsert_slot_capacity(conn, date, def.id, count)?;
            written += 1;
        }
    }
    tracing::info!(
        "applied default capacity {default_count} to {written} day-slots from {}",
        today + Duration::days(1)
    );
    Ok(written)
}
