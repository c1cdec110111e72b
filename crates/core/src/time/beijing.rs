use anyhow::Context;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

// Ledger dates follow Beijing time. Fixed offset, no DST and no tz database.
const BEIJING_OFFSET_SECS: i32 = 8 * 3600;

fn beijing_offset() -> anyhow::Result<FixedOffset> {
    FixedOffset::east_opt(BEIJING_OFFSET_SECS).context("invalid UTC+8 offset")
}

/// Calendar date the ledger row for `now_utc` is keyed by.
pub fn resolve_ledger_date(now_utc: DateTime<Utc>) -> anyhow::Result<NaiveDate> {
    let offset = beijing_offset()?;
    Ok(now_utc.with_timezone(&offset).date_naive())
}
