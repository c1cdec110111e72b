pub mod domain;
pub mod job;
pub mod ledger;
pub mod price;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;
    use std::time::Duration;

    pub const DEFAULT_LEDGER_PATH: &str = "btc-price all.csv";
    pub const DEFAULT_PRICE_API_BASE_URL: &str = "https://api.coingecko.com";
    pub const DEFAULT_PRICE_API_TIMEOUT_SECS: u64 = 10;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub ledger_path: PathBuf,
        pub price_api_base_url: String,
        pub price_api_timeout: Duration,
        pub coingecko_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let price_api_timeout_secs = match std::env::var("PRICE_API_TIMEOUT_SECS") {
                Ok(s) => s
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("PRICE_API_TIMEOUT_SECS is not an integer: {s}"))?,
                Err(_) => DEFAULT_PRICE_API_TIMEOUT_SECS,
            };
            anyhow::ensure!(
                price_api_timeout_secs > 0,
                "PRICE_API_TIMEOUT_SECS must be positive"
            );

            Ok(Self {
                ledger_path: non_empty_var("LEDGER_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH)),
                price_api_base_url: non_empty_var("PRICE_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_PRICE_API_BASE_URL.to_string()),
                price_api_timeout: Duration::from_secs(price_api_timeout_secs),
                coingecko_api_key: non_empty_var("COINGECKO_API_KEY"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }
}
