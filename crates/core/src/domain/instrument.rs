use serde::{Deserialize, Serialize};

/// The three slots of the GEM strategy: two ranked equity candidates and one defensive asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    EquityA,
    EquityB,
    Bond,
}

impl Instrument {
    /// Ranked candidates in preference order. Ties go to the earlier entry.
    pub const EQUITIES: [Instrument; 2] = [Instrument::EquityA, Instrument::EquityB];

    pub const ALL: [Instrument; 3] = [Instrument::EquityA, Instrument::EquityB, Instrument::Bond];

    fn env_prefix(self) -> &'static str {
        match self {
            Instrument::EquityA => "GEM_EQUITY_A",
            Instrument::EquityB => "GEM_EQUITY_B",
            Instrument::Bond => "GEM_BOND",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentInfo {
    pub ticker: String,
    pub name: String,
}

impl InstrumentInfo {
    fn new(ticker: &str, name: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            name: name.to_string(),
        }
    }
}

/// Ticker and display name for each slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentTable {
    pub equity_a: InstrumentInfo,
    pub equity_b: InstrumentInfo,
    pub bond: InstrumentInfo,
}

impl Default for InstrumentTable {
    fn default() -> Self {
        Self {
            equity_a: InstrumentInfo::new("CSPX.L", "iShares Core S&P 500 UCITS ETF (Acc)"),
            equity_b: InstrumentInfo::new("IWDA.AS", "iShares Core MSCI World UCITS ETF (Acc)"),
            bond: InstrumentInfo::new("VUTY.L", "Vanguard USD Treasury Bond UCITS ETF (Acc)"),
        }
    }
}

impl InstrumentTable {
    /// Defaults, overridden by `GEM_{EQUITY_A,EQUITY_B,BOND}_{TICKER,NAME}`.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut out = Self::default();

        for instrument in Instrument::ALL {
            let prefix = instrument.env_prefix();
            let info = out.get_mut(instrument);

            if let Some(ticker) = non_blank(lookup(&format!("{prefix}_TICKER"))) {
                info.ticker = ticker;
            }
            if let Some(name) = non_blank(lookup(&format!("{prefix}_NAME"))) {
                info.name = name;
            }
        }

        out
    }

    pub fn get(&self, instrument: Instrument) -> &InstrumentInfo {
        match instrument {
            Instrument::EquityA => &self.equity_a,
            Instrument::EquityB => &self.equity_b,
            Instrument::Bond => &self.bond,
        }
    }

    fn get_mut(&mut self, instrument: Instrument) -> &mut InstrumentInfo {
        match instrument {
            Instrument::EquityA => &mut self.equity_a,
            Instrument::EquityB => &mut self.equity_b,
            Instrument::Bond => &mut self.bond,
        }
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_table_matches_gem_trackers() {
        let table = InstrumentTable::default();
        assert_eq!(table.get(Instrument::EquityA).ticker, "CSPX.L");
        assert_eq!(table.get(Instrument::EquityB).ticker, "IWDA.AS");
        assert_eq!(table.get(Instrument::Bond).ticker, "VUTY.L");
    }

    #[test]
    fn overrides_apply_per_slot_and_ignore_blanks() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("GEM_EQUITY_B_TICKER", " VWCE.DE "),
            ("GEM_EQUITY_B_NAME", "Vanguard FTSE All-World"),
            ("GEM_BOND_TICKER", "   "),
        ]);
        let table = InstrumentTable::from_vars(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(table.equity_b.ticker, "VWCE.DE");
        assert_eq!(table.equity_b.name, "Vanguard FTSE All-World");
        assert_eq!(table.bond, InstrumentTable::default().bond);
        assert_eq!(table.equity_a, InstrumentTable::default().equity_a);
    }
}
