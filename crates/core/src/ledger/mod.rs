use crate::domain::row::{LedgerRow, UpdateOutcome, DATE_FORMAT};
use anyhow::Context;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct EmptyLedgerError {
    pub path: PathBuf,
}

impl fmt::Display for EmptyLedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ledger file is empty: {}", self.path.display())
    }
}

impl std::error::Error for EmptyLedgerError {}

/// CSV ledger on disk: one header line followed by `date,price` rows,
/// newest first.
#[derive(Debug, Clone)]
pub struct LedgerFile {
    path: PathBuf,
}

impl LedgerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> anyhow::Result<String> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read ledger {}", self.path.display()))?;
        if contents.is_empty() {
            return Err(EmptyLedgerError {
                path: self.path.clone(),
            }
            .into());
        }
        Ok(contents)
    }

    /// First field of every non-blank line after the header.
    pub fn existing_dates(&self) -> anyhow::Result<BTreeSet<String>> {
        let contents = self.read()?;
        let dates = scan_dates(&contents).map(str::to_string).collect();
        Ok(dates)
    }

    pub fn contains_date(&self, date: NaiveDate) -> anyhow::Result<bool> {
        let contents = self.read()?;
        let key = date.format(DATE_FORMAT).to_string();
        let found = scan_dates(&contents).any(|d| d == key);
        Ok(found)
    }

    /// Inserts `row` right after the header unless its date is already
    /// recorded. The whole file is rewritten in place; there is no temp
    /// file, so a crash mid-write can truncate the ledger.
    pub fn insert_if_absent(&self, row: &LedgerRow) -> anyhow::Result<UpdateOutcome> {
        let contents = self.read()?;
        match insert_after_header(&contents, row) {
            Some(updated) => {
                std::fs::write(&self.path, updated)
                    .with_context(|| format!("failed to write ledger {}", self.path.display()))?;
                tracing::info!(
                    path = %self.path.display(),
                    date = %row.date,
                    price_usd = row.price_usd,
                    "inserted ledger row"
                );
                Ok(UpdateOutcome::Inserted(row.clone()))
            }
            None => {
                tracing::info!(path = %self.path.display(), date = %row.date, "date already recorded");
                Ok(UpdateOutcome::AlreadyPresent(row.date))
            }
        }
    }
}

fn scan_dates(contents: &str) -> impl Iterator<Item = &str> {
    contents
        .split_inclusive('\n')
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| line.split(',').next())
}

/// Returns the new file contents, or `None` when the row's date is already
/// present. Every existing line is kept byte-for-byte.
pub fn insert_after_header(contents: &str, row: &LedgerRow) -> Option<String> {
    let key = row.date.format(DATE_FORMAT).to_string();
    if scan_dates(contents).any(|d| d == key) {
        return None;
    }

    let mut lines = contents.split_inclusive('\n');
    let header = lines.next().unwrap_or("");
    let line = row.to_line();

    let mut out = String::with_capacity(contents.len() + line.len() + 2);
    out.push_str(header);
    if !header.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&line);
    out.push('\n');
    for rest in lines {
        out.push_str(rest);
    }
    Some(out)
}
