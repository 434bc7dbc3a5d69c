use crate::domain::momentum::{PricePoint, PriceSeries};
use crate::ingest::error::DataUnavailable;
use chrono::DateTime;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    pub result: Option<Vec<ChartData>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartData {
    pub timestamp: Option<Vec<i64>>,
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
    pub adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjClose {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Daily series from the adjusted-close column, or the close column when no adjusted value
    /// is present at all. Columns are never mixed. Points without a positive price are dropped.
    pub fn into_price_series(self, ticker: &str) -> Result<PriceSeries, DataUnavailable> {
        if let Some(err) = self.chart.error {
            return Err(DataUnavailable::new(
                ticker,
                format!("{}: {}", err.code, err.description),
            ));
        }

        let data = self
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| DataUnavailable::new(ticker, "empty chart result"))?;

        let timestamps = data.timestamp.unwrap_or_default();
        let close = data
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();
        let adjclose = data
            .indicators
            .adjclose
            .and_then(|a| a.into_iter().next())
            .map(|a| a.adjclose)
            .unwrap_or_default();
        let prices = if adjclose.iter().any(Option::is_some) {
            adjclose
        } else {
            close
        };

        let mut points = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let Some(date) = DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()) else {
                continue;
            };
            match prices.get(i).copied().flatten() {
                Some(price) if price.is_finite() && price > 0.0 => {
                    points.push(PricePoint { date, price })
                }
                _ => continue,
            }
        }

        if points.is_empty() {
            return Err(DataUnavailable::new(ticker, "no priced observations"));
        }

        Ok(PriceSeries::new(points))
    }
}
