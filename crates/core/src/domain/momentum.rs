use crate::domain::instrument::Instrument;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Price observations for one instrument, ascending by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }
}

impl FromIterator<PricePoint> for PriceSeries {
    fn from_iter<I: IntoIterator<Item = PricePoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Momentum {
    Defined(f64),
    /// Fewer than two observations.
    Undefined,
}

impl Momentum {
    pub fn value(self) -> Option<f64> {
        match self {
            Momentum::Defined(v) => Some(v),
            Momentum::Undefined => None,
        }
    }
}

/// Total return between the first and last observation of the series.
///
/// The series is taken as already sliced to the lookback window; no date arithmetic happens here.
pub fn compute_momentum(series: &PriceSeries) -> Momentum {
    let [first, .., last] = series.points() else {
        return Momentum::Undefined;
    };

    let ret = last.price / first.price - 1.0;
    if ret.is_finite() {
        Momentum::Defined(ret)
    } else {
        Momentum::Undefined
    }
}

/// Momentum per instrument for one evaluation. A missing key means the fetch failed upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MomentumReport(BTreeMap<Instrument, Momentum>);

impl MomentumReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, instrument: Instrument, momentum: Momentum) {
        self.0.insert(instrument, momentum);
    }

    pub fn get(&self, instrument: Instrument) -> Option<Momentum> {
        self.0.get(&instrument).copied()
    }

    pub fn contains(&self, instrument: Instrument) -> bool {
        self.0.contains_key(&instrument)
    }
}

impl FromIterator<(Instrument, Momentum)> for MomentumReport {
    fn from_iter<I: IntoIterator<Item = (Instrument, Momentum)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                price,
            })
            .collect()
    }

    #[test]
    fn short_series_is_undefined() {
        assert_eq!(compute_momentum(&series(&[])), Momentum::Undefined);
        assert_eq!(compute_momentum(&series(&[101.5])), Momentum::Undefined);
    }

    #[test]
    fn uses_first_and_last_observation_only() {
        let m = compute_momentum(&series(&[100.0, 250.0, 80.0, 112.0]))
            .value()
            .unwrap();
        assert!((m - 0.12).abs() < 1e-9);

        let m = compute_momentum(&series(&[50.0, 40.0])).value().unwrap();
        assert!((m - (-0.2)).abs() < 1e-9);
    }

    #[test]
    fn non_finite_ratio_is_undefined() {
        assert_eq!(compute_momentum(&series(&[0.0, 10.0])), Momentum::Undefined);
        assert_eq!(
            compute_momentum(&series(&[10.0, f64::NAN])),
            Momentum::Undefined
        );
    }

    #[test]
    fn serializes_with_explicit_kind() {
        let report: MomentumReport = [
            (Instrument::EquityA, Momentum::Defined(0.25)),
            (Instrument::Bond, Momentum::Undefined),
        ]
        .into_iter()
        .collect();

        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "equity_a": {"kind": "defined", "value": 0.25},
                "bond": {"kind": "undefined"}
            })
        );

        let back: MomentumReport = serde_json::from_value(v).unwrap();
        assert_eq!(back, report);
    }
}
