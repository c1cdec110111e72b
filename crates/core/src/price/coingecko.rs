use crate::config::Settings;
use crate::price::error::PriceFetchError;
use crate::price::types::{quote, SimplePriceResponse};
use crate::price::{truncate_price, PriceProvider};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;

const PROVIDER_NAME: &str = "coingecko";
const SIMPLE_PRICE_PATH: &str = "/api/v3/simple/price";
const COIN_ID: &str = "bitcoin";
const VS_CURRENCY: &str = "usd";

#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl CoinGeckoClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.price_api_base_url.clone(),
            settings.coingecko_api_key.clone(),
            settings.price_api_timeout,
        )
    }

    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build price api http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            timeout,
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), SIMPLE_PRICE_PATH)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("application/json"));
        if let Some(api_key) = &self.api_key {
            headers.insert("x-cg-demo-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    fn error(&self, stage: &'static str, detail: String) -> anyhow::Error {
        PriceFetchError {
            provider: PROVIDER_NAME,
            stage,
            detail,
        }
        .into()
    }

    fn describe_request_error(&self, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            format!("timed out after {:?}: {err}", self.timeout)
        } else {
            err.to_string()
        }
    }
}

#[async_trait::async_trait]
impl PriceProvider for CoinGeckoClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn fetch_usd_price(&self) -> Result<u64> {
        let url = self.url();
        let headers = self.headers()?;

        let res = self
            .http
            .get(url)
            .headers(headers)
            .query(&[("ids", COIN_ID), ("vs_currencies", VS_CURRENCY)])
            .send()
            .await
            .map_err(|err| self.error("request", self.describe_request_error(&err)))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|err| self.error("request", self.describe_request_error(&err)))?;

        if !status.is_success() {
            return Err(self.error("http", format!("status={status}: {text}")));
        }

        let parsed = serde_json::from_str::<SimplePriceResponse>(&text)
            .map_err(|err| self.error("decode", format!("{err}: {text}")))?;
        let value = quote(&parsed, COIN_ID, VS_CURRENCY).ok_or_else(|| {
            self.error(
                "decode",
                format!("missing field {COIN_ID}.{VS_CURRENCY}: {text}"),
            )
        })?;

        let price = truncate_price(value).map_err(|err| self.error("decode", format!("{err:#}")))?;
        tracing::debug!(provider = PROVIDER_NAME, raw = value, price_usd = price, "fetched price");
        Ok(price)
    }
}
