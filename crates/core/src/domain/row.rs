use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One priced day in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub price_usd: u64,
}

impl LedgerRow {
    pub fn new(date: NaiveDate, price_usd: u64) -> Self {
        Self { date, price_usd }
    }

    /// CSV line without the trailing newline, e.g. `2024-01-02,42000`.
    pub fn to_line(&self) -> String {
        format!("{},{}", self.date.format(DATE_FORMAT), self.price_usd)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Inserted(LedgerRow),
    AlreadyPresent(NaiveDate),
}

impl UpdateOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, UpdateOutcome::Inserted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_line_with_zero_padded_date() {
        let row = LedgerRow::new(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(), 67123);
        assert_eq!(row.to_line(), "2024-03-07,67123");
    }
}
