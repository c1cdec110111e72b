pub mod coingecko;
pub mod error;
pub mod types;

#[async_trait::async_trait]
pub trait PriceProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Current spot price in whole US dollars, truncated toward zero.
    async fn fetch_usd_price(&self) -> anyhow::Result<u64>;
}

/// Converts a quoted price into the ledger's integer dollars.
///
/// Truncates rather than rounds: 42000.9 becomes 42000.
pub fn truncate_price(value: f64) -> anyhow::Result<u64> {
    anyhow::ensure!(value.is_finite(), "price is not a finite number: {value}");
    anyhow::ensure!(value >= 0.0, "price must be non-negative (got {value})");
    anyhow::ensure!(
        value < u64::MAX as f64,
        "price does not fit in an integer: {value}"
    );
    Ok(value.trunc() as u64)
}
