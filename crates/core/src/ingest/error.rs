use std::fmt;

/// The provider answered, but has no usable prices for the ticker/window. Not worth retrying.
#[derive(Debug, Clone)]
pub struct DataUnavailable {
    pub ticker: String,
    pub detail: String,
}

impl DataUnavailable {
    pub fn new(ticker: &str, detail: impl Into<String>) -> Self {
        Self {
            ticker: ticker.to_string(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for DataUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no data for {}: {}", self.ticker, self.detail)
    }
}

impl std::error::Error for DataUnavailable {}
