use btc_ledger_core::config::Settings;
use btc_ledger_core::domain::row::{UpdateOutcome, DATE_FORMAT};
use btc_ledger_core::job::{run_daily_update, Progress};
use btc_ledger_core::ledger::{EmptyLedgerError, LedgerFile};
use btc_ledger_core::price::coingecko::CoinGeckoClient;
use btc_ledger_core::price::error::PriceFetchError;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "update_btc_price")]
struct Args {
    /// Ledger CSV to update. Overrides LEDGER_PATH.
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Fetch and check the ledger without writing it.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(&settings, &args).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        if let Some(fetch) = err.downcast_ref::<PriceFetchError>() {
            tracing::error!(provider = fetch.provider, stage = fetch.stage, "price fetch failed");
        } else if let Some(empty) = err.downcast_ref::<EmptyLedgerError>() {
            tracing::error!(path = %empty.path.display(), "ledger is empty");
        } else {
            tracing::error!(error = %format!("{err:#}"), "daily price update failed");
        }
    }
    result
}

async fn run(settings: &Settings, args: &Args) -> anyhow::Result<()> {
    let ledger_path = args
        .ledger
        .clone()
        .unwrap_or_else(|| settings.ledger_path.clone());
    let ledger = LedgerFile::new(ledger_path);
    let provider = CoinGeckoClient::from_settings(settings)?;

    println!("Updating bitcoin price ledger {}", ledger.path().display());

    let report = run_daily_update(
        &provider,
        &ledger,
        chrono::Utc::now(),
        args.dry_run,
        &mut print_progress,
    )
    .await?;

    let date = report.date.format(DATE_FORMAT);

    match (&report.outcome, report.dry_run) {
        (UpdateOutcome::Inserted(row), false) => {
            println!("Added record: {}", row.to_line());
        }
        (UpdateOutcome::Inserted(row), true) => {
            println!("Dry run: would add record: {}", row.to_line());
        }
        (UpdateOutcome::AlreadyPresent(_), _) => {
            println!("Price for {date} already recorded; no update");
        }
    }

    Ok(())
}

fn print_progress(progress: Progress) {
    match progress {
        Progress::DateResolved(date) => {
            println!("Ledger date (UTC+8): {}", date.format(DATE_FORMAT));
        }
        Progress::PriceFetched(price_usd) => {
            println!("Current bitcoin price: ${}", format_thousands(price_usd));
        }
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::time::Duration;

    #[test]
    fn groups_digits_by_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(97123), "97,123");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }

    fn settings_for(base_url: String, ledger_path: PathBuf) -> Settings {
        Settings {
            ledger_path,
            price_api_base_url: base_url,
            price_api_timeout: Duration::from_secs(5),
            coingecko_api_key: None,
            sentry_dsn: None,
        }
    }

    #[tokio::test]
    async fn upstream_error_fails_the_run_without_touching_ledger() {
        let app = Router::new().route(
            "/api/v3/simple/price",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream down") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("btc-price all.csv");
        let original = "date,price_usd\n2024-01-01,42500\n";
        std::fs::write(&path, original).unwrap();

        let settings = settings_for(format!("http://{addr}"), path.clone());
        let args = Args::try_parse_from(["update_btc_price"]).unwrap();

        let err = run(&settings, &args).await.unwrap_err();
        assert_eq!(err.downcast_ref::<PriceFetchError>().unwrap().stage, "http");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[tokio::test]
    async fn ledger_flag_overrides_configured_path() {
        let app = Router::new().route(
            "/api/v3/simple/price",
            get(|| async { Json(serde_json::json!({"bitcoin": {"usd": 42000.9}})) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let configured = dir.path().join("configured.csv");
        let flagged = dir.path().join("flagged.csv");
        std::fs::write(&configured, "date,price_usd\n").unwrap();
        std::fs::write(&flagged, "date,price_usd\n").unwrap();

        let settings = settings_for(format!("http://{addr}"), configured.clone());
        let args = Args::try_parse_from([
            "update_btc_price",
            "--ledger",
            flagged.to_str().unwrap(),
        ])
        .unwrap();

        run(&settings, &args).await.unwrap();
        assert_eq!(std::fs::read_to_string(&configured).unwrap(), "date,price_usd\n");
        let written = std::fs::read_to_string(&flagged).unwrap();
        let second = written.lines().nth(1).unwrap();
        assert!(second.ends_with(",42000"), "unexpected row: {second}");
    }

    #[test]
    fn runs_without_arguments() {
        let args = Args::try_parse_from(["update_btc_price"]).unwrap();
        assert!(args.ledger.is_none());
        assert!(!args.dry_run);
    }
}
