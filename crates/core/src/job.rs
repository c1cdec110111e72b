use crate::domain::row::{LedgerRow, UpdateOutcome};
use crate::ledger::LedgerFile;
use crate::price::PriceProvider;
use crate::time::beijing::resolve_ledger_date;
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyUpdateReport {
    pub date: NaiveDate,
    pub price_usd: u64,
    pub outcome: UpdateOutcome,
    pub dry_run: bool,
}

/// Emitted as each step completes, before the next one can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    DateResolved(NaiveDate),
    PriceFetched(u64),
}

/// Resolves today's ledger date, fetches the price, and records it.
///
/// The price is fetched before the ledger is opened, so a failed fetch never
/// touches the file. With `dry_run` the ledger is scanned but not written;
/// a missing date is still reported as `Inserted`.
pub async fn run_daily_update(
    provider: &dyn PriceProvider,
    ledger: &LedgerFile,
    now_utc: DateTime<Utc>,
    dry_run: bool,
    on_progress: &mut dyn FnMut(Progress),
) -> anyhow::Result<DailyUpdateReport> {
    let date = resolve_ledger_date(now_utc)?;
    tracing::info!(%date, provider = provider.provider_name(), "resolved ledger date");
    on_progress(Progress::DateResolved(date));

    let price_usd = provider.fetch_usd_price().await?;
    on_progress(Progress::PriceFetched(price_usd));
    let row = LedgerRow::new(date, price_usd);

    let existing = ledger.existing_dates()?;
    tracing::info!(
        path = %ledger.path().display(),
        existing_rows = existing.len(),
        dry_run,
        "scanned ledger"
    );

    let outcome = if dry_run {
        if ledger.contains_date(date)? {
            UpdateOutcome::AlreadyPresent(date)
        } else {
            UpdateOutcome::Inserted(row)
        }
    } else {
        ledger.insert_if_absent(&row)?
    };

    Ok(DailyUpdateReport {
        date,
        price_usd,
        outcome,
        dry_run,
    })
}
