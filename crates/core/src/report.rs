use crate::domain::instrument::{Instrument, InstrumentTable};
use crate::domain::momentum::{compute_momentum, Momentum, MomentumReport, PriceSeries};
use crate::domain::recommendation::{recommend, Recommendation};
use crate::ingest::provider::PriceProvider;
use crate::time::lookback::Lookback;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Everything the presentation layer needs from one evaluation cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GemReport {
    pub lookback: Lookback,
    pub generated_at: DateTime<Utc>,
    pub momentums: Vec<MomentumRow>,
    pub recommendation: RecommendationView,
    pub returns: Vec<ReturnSeries>,
    /// One message per failed fetch.
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumRow {
    pub instrument: Instrument,
    pub ticker: String,
    pub name: String,
    pub momentum: Momentum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationView {
    pub instrument: Option<Instrument>,
    /// Empty when nothing could be recommended.
    pub ticker: String,
    pub name: String,
    pub rationale: String,
}

impl RecommendationView {
    pub fn new(rec: Recommendation, table: &InstrumentTable) -> Self {
        let (ticker, name) = match rec.choice {
            Some(i) => (table.get(i).ticker.clone(), table.get(i).name.clone()),
            None => (String::new(), String::new()),
        };
        Self {
            instrument: rec.choice,
            ticker,
            name,
            rationale: rec.rationale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    pub instrument: Instrument,
    pub ticker: String,
    pub points: Vec<ReturnPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub return_pct: f64,
}

/// Percent return of every observation relative to the first one.
pub fn cumulative_returns(series: &PriceSeries) -> Vec<ReturnPoint> {
    let Some(base) = series.first().map(|p| p.price) else {
        return Vec::new();
    };

    series
        .points()
        .iter()
        .map(|p| ReturnPoint {
            date: p.date,
            return_pct: (p.price / base - 1.0) * 100.0,
        })
        .collect()
}

/// Runs one GEM cycle. Fetch failures drop the instrument and are reported in `errors`;
/// this never fails as a whole.
pub async fn evaluate(
    provider: &dyn PriceProvider,
    table: &InstrumentTable,
    lookback: Lookback,
) -> GemReport {
    let (equity_a, equity_b, bond) = tokio::join!(
        provider.fetch_price_series(&table.equity_a.ticker, lookback),
        provider.fetch_price_series(&table.equity_b.ticker, lookback),
        provider.fetch_price_series(&table.bond.ticker, lookback),
    );
    let fetched = [
        (Instrument::EquityA, equity_a),
        (Instrument::EquityB, equity_b),
        (Instrument::Bond, bond),
    ];

    let mut report = MomentumReport::new();
    let mut momentums = Vec::new();
    let mut returns = Vec::new();
    let mut errors = Vec::new();

    for (instrument, result) in fetched {
        let info = table.get(instrument);
        match result {
            Ok(series) => {
                let momentum = compute_momentum(&series);
                tracing::debug!(
                    ticker = %info.ticker,
                    points = series.points().len(),
                    momentum = ?momentum,
                    "momentum computed"
                );
                report.insert(instrument, momentum);
                momentums.push(MomentumRow {
                    instrument,
                    ticker: info.ticker.clone(),
                    name: info.name.clone(),
                    momentum,
                });
                returns.push(ReturnSeries {
                    instrument,
                    ticker: info.ticker.clone(),
                    points: cumulative_returns(&series),
                });
            }
            Err(err) => {
                tracing::warn!(
                    ticker = %info.ticker,
                    provider = provider.provider_name(),
                    error = %err,
                    "price fetch failed; instrument omitted"
                );
                errors.push(format!("failed to fetch {}: {err:#}", info.ticker));
            }
        }
    }

    let recommendation = recommend(&report, table);
    tracing::info!(
        %lookback,
        ticker = recommendation.ticker(table),
        rationale = %recommendation.rationale,
        failed = errors.len(),
        "gem recommendation"
    );

    GemReport {
        lookback,
        generated_at: Utc::now(),
        momentums,
        recommendation: RecommendationView::new(recommendation, table),
        returns,
        errors,
    }
}
