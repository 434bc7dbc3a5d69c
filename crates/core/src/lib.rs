pub mod domain;
pub mod ingest;
pub mod report;
pub mod storage;
pub mod time;

pub mod config {
    use anyhow::Context;

    use crate::domain::instrument::InstrumentTable;
    use crate::time::lookback::Lookback;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub price_provider_base_url: Option<String>,
        pub lookback: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                price_provider_base_url: std::env::var("PRICE_PROVIDER_BASE_URL").ok(),
                lookback: std::env::var("GEM_LOOKBACK").ok(),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        /// Momentum window; `1y` unless `GEM_LOOKBACK` says otherwise.
        pub fn lookback(&self) -> anyhow::Result<Lookback> {
            match self.lookback.as_deref().map(str::trim) {
                Some(s) if !s.is_empty() => s
                    .parse()
                    .with_context(|| format!("invalid GEM_LOOKBACK: {s}")),
                _ => Ok(Lookback::default()),
            }
        }

        pub fn instruments(&self) -> InstrumentTable {
            InstrumentTable::from_env()
        }
    }
}
