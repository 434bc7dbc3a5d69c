use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// History window requested from the price provider, in the provider's period vocabulary
/// (`5d`, `6mo`, `1y`, `ytd`, `max`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Lookback {
    Days(u32),
    Months(u32),
    Years(u32),
    YearToDate,
    Max,
}

impl Default for Lookback {
    fn default() -> Self {
        Lookback::Years(1)
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookback::Days(n) => write!(f, "{n}d"),
            Lookback::Months(n) => write!(f, "{n}mo"),
            Lookback::Years(n) => write!(f, "{n}y"),
            Lookback::YearToDate => f.write_str("ytd"),
            Lookback::Max => f.write_str("max"),
        }
    }
}

impl FromStr for Lookback {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "ytd" => return Ok(Lookback::YearToDate),
            "max" => return Ok(Lookback::Max),
            _ => {}
        }

        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .with_context(|| format!("lookback is missing a unit: {s:?}"))?;
        let (count, unit) = s.split_at(split);
        let n: u32 = count
            .parse()
            .with_context(|| format!("lookback is missing a count: {s:?}"))?;
        anyhow::ensure!(n > 0, "lookback must be non-empty: {s:?}");

        match unit {
            "d" => Ok(Lookback::Days(n)),
            "mo" => Ok(Lookback::Months(n)),
            "y" => Ok(Lookback::Years(n)),
            _ => bail!("unknown lookback unit {unit:?} (expected d, mo or y)"),
        }
    }
}

impl TryFrom<String> for Lookback {
    type Error = anyhow::Error;

    fn try_from(s: String) -> anyhow::Result<Self> {
        s.parse()
    }
}

impl From<Lookback> for String {
    fn from(l: Lookback) -> Self {
        l.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_periods() {
        assert_eq!("1y".parse::<Lookback>().unwrap(), Lookback::Years(1));
        assert_eq!("6mo".parse::<Lookback>().unwrap(), Lookback::Months(6));
        assert_eq!(" 5D ".parse::<Lookback>().unwrap(), Lookback::Days(5));
        assert_eq!("ytd".parse::<Lookback>().unwrap(), Lookback::YearToDate);
        assert_eq!("max".parse::<Lookback>().unwrap(), Lookback::Max);
    }

    #[test]
    fn rejects_malformed_periods() {
        assert!("".parse::<Lookback>().is_err());
        assert!("12".parse::<Lookback>().is_err());
        assert!("y".parse::<Lookback>().is_err());
        assert!("0y".parse::<Lookback>().is_err());
        assert!("3w".parse::<Lookback>().is_err());
    }

    #[test]
    fn displays_as_provider_token() {
        assert_eq!(Lookback::default().to_string(), "1y");
        assert_eq!(Lookback::Months(3).to_string(), "3mo");
        assert_eq!(Lookback::YearToDate.to_string(), "ytd");
    }
}
