use crate::config::Settings;
use crate::domain::momentum::PriceSeries;
use crate::ingest::error::DataUnavailable;
use crate::ingest::types::{ChartEnvelope, ChartResponse};
use crate::time::lookback::Lookback;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 3;
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) gem-recommender/0.1";

#[async_trait::async_trait]
pub trait PriceProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Daily prices for `ticker` over `lookback`, ascending by date.
    async fn fetch_price_series(&self, ticker: &str, lookback: Lookback) -> Result<PriceSeries>;
}

#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
}

impl YahooChartProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .price_provider_base_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("PRICE_PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("PRICE_PROVIDER_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES)
            .max(1);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build price provider http client")?;

        Ok(Self {
            http,
            base_url,
            retries,
        })
    }

    fn url(&self, ticker: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            ticker.trim()
        )
    }

    async fn fetch_once(&self, ticker: &str, lookback: Lookback) -> Result<PriceSeries> {
        let res = self
            .http
            .get(self.url(ticker))
            .query(&[
                ("range", lookback.to_string()),
                ("interval", "1d".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("price request for {ticker} failed"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read price provider response")?;

        parse_chart_response(ticker, status, &text)
    }
}

/// Maps one chart endpoint reply to a series. Unknown symbols come back as 404 with a regular
/// JSON body carrying a chart error; those become [`DataUnavailable`].
fn parse_chart_response(ticker: &str, status: StatusCode, text: &str) -> Result<PriceSeries> {
    let parsed = serde_json::from_str::<ChartResponse>(text);
    if !status.is_success() {
        if let Ok(ChartResponse {
            chart:
                ChartEnvelope {
                    error: Some(err), ..
                },
        }) = parsed
        {
            let detail = format!("{}: {}", err.code, err.description);
            return Err(DataUnavailable::new(ticker, detail).into());
        }
        anyhow::bail!("price provider HTTP {status} for {ticker}: {text}");
    }

    let chart = parsed.with_context(|| {
        format!("failed to parse price provider response for {ticker}: {text}")
    })?;
    Ok(chart.into_price_series(ticker)?)
}

fn should_retry(err: &anyhow::Error, attempt: u32, retries: u32) -> bool {
    !err.is::<DataUnavailable>() && attempt < retries
}

#[async_trait::async_trait]
impl PriceProvider for YahooChartProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch_price_series(&self, ticker: &str, lookback: Lookback) -> Result<PriceSeries> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(ticker, lookback).await {
                Ok(series) => return Ok(series),
                Err(err) => {
                    if !should_retry(&err, attempt, self.retries) {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ticker, ?backoff, error = %err, "price fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}
