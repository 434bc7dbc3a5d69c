use anyhow::Context;
use clap::Parser;
use gem_core::ingest::provider::YahooChartProvider;
use gem_core::time::lookback::Lookback;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "gem_worker")]
struct Args {
    /// Snapshot as-of date (YYYY-MM-DD). Defaults to today's UTC date, weekends rolled back.
    #[arg(long)]
    as_of_date: Option<String>,

    /// Momentum window (e.g. 1y, 6mo). Overrides GEM_LOOKBACK.
    #[arg(long)]
    lookback: Option<Lookback>,

    /// Print the report instead of writing it to the database.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = gem_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let as_of_date =
        gem_core::time::market::resolve_as_of_date(args.as_of_date.as_deref(), chrono::Utc::now())?;
    let lookback = match args.lookback {
        Some(l) => l,
        None => settings.lookback()?,
    };
    let instruments = settings.instruments();
    let provider = YahooChartProvider::from_settings(&settings)?;

    let report = gem_core::report::evaluate(&provider, &instruments, lookback).await;
    for error in &report.errors {
        tracing::warn!(%as_of_date, error = %error, "instrument skipped");
    }

    if args.dry_run {
        tracing::info!(
            %as_of_date,
            dry_run = true,
            ticker = %report.recommendation.ticker,
            "gem run (dry-run)"
        );
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    gem_core::storage::migrate(&pool).await?;

    // The lock lives on this connection; release must go through the same one.
    let mut lock_conn = pool
        .acquire()
        .await
        .context("acquire lock connection failed")?;

    let acquired =
        gem_core::storage::lock::try_acquire_as_of_date_lock(&mut lock_conn, as_of_date).await?;
    if !acquired {
        tracing::warn!(%as_of_date, "as_of_date lock not acquired; another run in progress");
        return Ok(());
    }

    let persisted = gem_core::storage::snapshots::persist_snapshot(&pool, as_of_date, &report).await;

    match gem_core::storage::lock::release_as_of_date_lock(&mut lock_conn, as_of_date).await {
        Ok(true) => {}
        Ok(false) => tracing::warn!(%as_of_date, "as_of_date lock was not held at release"),
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(%as_of_date, error = %err, "as_of_date lock release failed");
        }
    }

    match persisted {
        Ok(snapshot_id) => {
            tracing::info!(
                %as_of_date,
                %snapshot_id,
                ticker = %report.recommendation.ticker,
                "persisted gem snapshot"
            );
            Ok(())
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(%as_of_date, error = %err, "gem snapshot persist failed");
            Err(err)
        }
    }
}

fn init_sentry(settings: &gem_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
