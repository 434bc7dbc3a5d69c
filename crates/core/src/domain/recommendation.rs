use crate::domain::instrument::{Instrument, InstrumentTable};
use crate::domain::momentum::{Momentum, MomentumReport};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// `None` when no instrument had usable data.
    pub choice: Option<Instrument>,
    pub rationale: String,
}

impl Recommendation {
    /// Ticker of the chosen instrument, or `""` when nothing could be recommended.
    pub fn ticker<'a>(&self, table: &'a InstrumentTable) -> &'a str {
        self.choice.map_or("", |i| table.get(i).ticker.as_str())
    }
}

/// Applies the GEM rule: the stronger of the two equities if its momentum is positive,
/// otherwise the bond. The bond's own momentum is never consulted.
pub fn recommend(report: &MomentumReport, table: &InstrumentTable) -> Recommendation {
    let eligible: Vec<(Instrument, f64)> = Instrument::EQUITIES
        .into_iter()
        .filter_map(|i| report.get(i).and_then(Momentum::value).map(|v| (i, v)))
        .collect();

    // Strictly greater replaces, so ties stay with the earlier equity.
    let best = eligible.iter().copied().reduce(|best, candidate| {
        if candidate.1 > best.1 {
            candidate
        } else {
            best
        }
    });

    if let Some((instrument, momentum)) = best {
        if momentum > 0.0 {
            return Recommendation {
                choice: Some(instrument),
                rationale: format!(
                    "{} had the highest return: {}",
                    table.get(instrument).name,
                    format_pct(momentum)
                ),
            };
        }
    }

    if !report.contains(Instrument::Bond) {
        return Recommendation {
            choice: None,
            rationale: "No data available to generate a recommendation.".to_string(),
        };
    }

    let rationale = if eligible.is_empty() {
        "No equity data available → bond recommendation.".to_string()
    } else {
        let returns = eligible
            .iter()
            .map(|(i, v)| format!("{}: {}", table.get(*i).ticker, format_pct(*v)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("No positive equity returns ({returns}) → bonds.")
    };

    Recommendation {
        choice: Some(Instrument::Bond),
        rationale,
    }
}

/// `0.123` -> `"12.3%"`.
pub fn format_pct(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(entries: &[(Instrument, Momentum)]) -> MomentumReport {
        entries.iter().copied().collect()
    }

    #[test]
    fn empty_report_yields_no_recommendation() {
        let table = InstrumentTable::default();
        let rec = recommend(&MomentumReport::new(), &table);
        assert_eq!(rec.choice, None);
        assert_eq!(rec.ticker(&table), "");
        assert_eq!(
            rec.rationale,
            "No data available to generate a recommendation."
        );
    }

    #[test]
    fn picks_stronger_positive_equity() {
        let table = InstrumentTable::default();
        let rec = recommend(
            &report(&[
                (Instrument::EquityA, Momentum::Defined(0.10)),
                (Instrument::EquityB, Momentum::Defined(0.05)),
            ]),
            &table,
        );
        assert_eq!(rec.choice, Some(Instrument::EquityA));
        assert_eq!(rec.ticker(&table), "CSPX.L");
        assert_eq!(
            rec.rationale,
            "iShares Core S&P 500 UCITS ETF (Acc) had the highest return: 10.0%"
        );

        let rec = recommend(
            &report(&[
                (Instrument::EquityA, Momentum::Defined(-0.01)),
                (Instrument::EquityB, Momentum::Defined(0.123)),
                (Instrument::Bond, Momentum::Defined(0.5)),
            ]),
            &table,
        );
        assert_eq!(rec.choice, Some(Instrument::EquityB));
        assert!(rec.rationale.ends_with("12.3%"));
    }

    #[test]
    fn negative_equities_fall_back_to_bond_regardless_of_bond_momentum() {
        let table = InstrumentTable::default();
        let rec = recommend(
            &report(&[
                (Instrument::EquityA, Momentum::Defined(-0.05)),
                (Instrument::EquityB, Momentum::Defined(-0.10)),
                (Instrument::Bond, Momentum::Undefined),
            ]),
            &table,
        );
        assert_eq!(rec.choice, Some(Instrument::Bond));
        assert_eq!(
            rec.rationale,
            "No positive equity returns (CSPX.L: -5.0%, IWDA.AS: -10.0%) → bonds."
        );
    }

    #[test]
    fn zero_momentum_is_not_positive() {
        let table = InstrumentTable::default();
        let rec = recommend(
            &report(&[
                (Instrument::EquityB, Momentum::Defined(0.0)),
                (Instrument::Bond, Momentum::Defined(-0.02)),
            ]),
            &table,
        );
        assert_eq!(rec.choice, Some(Instrument::Bond));
        assert_eq!(
            rec.rationale,
            "No positive equity returns (IWDA.AS: 0.0%) → bonds."
        );
    }

    #[test]
    fn bond_only_uses_no_equity_wording() {
        let table = InstrumentTable::default();
        let rec = recommend(&report(&[(Instrument::Bond, Momentum::Defined(0.03))]), &table);
        assert_eq!(rec.choice, Some(Instrument::Bond));
        assert_eq!(rec.rationale, "No equity data available → bond recommendation.");
    }

    #[test]
    fn undefined_equities_are_not_eligible() {
        let table = InstrumentTable::default();
        let rec = recommend(
            &report(&[
                (Instrument::EquityA, Momentum::Undefined),
                (Instrument::EquityB, Momentum::Undefined),
            ]),
            &table,
        );
        assert_eq!(rec.choice, None);

        let rec = recommend(
            &report(&[
                (Instrument::EquityA, Momentum::Undefined),
                (Instrument::EquityB, Momentum::Defined(-0.01)),
                (Instrument::Bond, Momentum::Undefined),
            ]),
            &table,
        );
        assert_eq!(rec.choice, Some(Instrument::Bond));
        assert_eq!(
            rec.rationale,
            "No positive equity returns (IWDA.AS: -1.0%) → bonds."
        );
    }

    #[test]
    fn tie_goes_to_first_equity() {
        let table = InstrumentTable::default();
        let rec = recommend(
            &report(&[
                (Instrument::EquityA, Momentum::Defined(0.07)),
                (Instrument::EquityB, Momentum::Defined(0.07)),
            ]),
            &table,
        );
        assert_eq!(rec.choice, Some(Instrument::EquityA));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let table = InstrumentTable::default();
        let r = report(&[
            (Instrument::EquityA, Momentum::Defined(-0.2)),
            (Instrument::Bond, Momentum::Defined(0.01)),
        ]);
        assert_eq!(recommend(&r, &table), recommend(&r, &table));
    }

    #[test]
    fn formats_one_decimal_percent() {
        assert_eq!(format_pct(0.1234), "12.3%");
        assert_eq!(format_pct(-0.02), "-2.0%");
        assert_eq!(format_pct(1.5), "150.0%");
    }
}
