use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gem_core::domain::instrument::InstrumentTable;
use gem_core::ingest::provider::{PriceProvider, YahooChartProvider};
use gem_core::report::{GemReport, ReturnSeries};
use gem_core::storage::snapshots::StoredSnapshot;
use gem_core::time::lookback::Lookback;

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

    let lookback = settings.lookback()?;
    let instruments = settings.instruments();
    let provider: Arc<dyn PriceProvider> = Arc::new(YahooChartProvider::from_settings(&settings)?);

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match gem_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; snapshots disabled");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; snapshots disabled");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "DATABASE_URL missing; snapshots disabled");
            None
        }
    };

    let state = AppState {
        provider,
        instruments: Arc::new(instruments),
        lookback,
        pool,
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(get_live_report))
        .route("/returns", get(get_live_returns))
        .route("/snapshots/latest", get(get_latest_snapshot))
        .route("/snapshots/:as_of_date", get(get_snapshot_by_date))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, %lookback, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    provider: Arc<dyn PriceProvider>,
    instruments: Arc<InstrumentTable>,
    lookback: Lookback,
    pool: Option<PgPool>,
}

impl AppState {
    async fn evaluate(&self) -> GemReport {
        gem_core::report::evaluate(self.provider.as_ref(), &self.instruments, self.lookback).await
    }
}

async fn get_live_report(State(state): State<AppState>) -> Json<GemReport> {
    Json(state.evaluate().await)
}

async fn get_live_returns(State(state): State<AppState>) -> Json<Vec<ReturnSeries>> {
    Json(state.evaluate().await.returns)
}

async fn get_latest_snapshot(
    State(state): State<AppState>,
) -> Result<Json<StoredSnapshot>, StatusCode> {
    load_snapshot(&state, None).await
}

async fn get_snapshot_by_date(
    State(state): State<AppState>,
    Path(as_of_date): Path<String>,
) -> Result<Json<StoredSnapshot>, StatusCode> {
    let as_of_date =
        NaiveDate::parse_from_str(&as_of_date, "%Y-%m-%d").map_err(|_| StatusCode::BAD_REQUEST)?;

    load_snapshot(&state, Some(as_of_date)).await
}

async fn load_snapshot(
    state: &AppState,
    as_of_date: Option<NaiveDate>,
) -> Result<Json<StoredSnapshot>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let snapshot = gem_core::storage::snapshots::fetch_snapshot(pool, as_of_date)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "snapshot query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(snapshot))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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

#[cfg(test)]
mod tests {
    use super::*;
    use gem_core::config::Settings;

    fn state_without_db() -> AppState {
        let settings = Settings {
            database_url: None,
            sentry_dsn: None,
            price_provider_base_url: Some("http://127.0.0.1:9".to_string()),
            lookback: None,
        };
        AppState {
            provider: Arc::new(YahooChartProvider::from_settings(&settings).unwrap()),
            instruments: Arc::new(InstrumentTable::default()),
            lookback: Lookback::default(),
            pool: None,
        }
    }

    #[tokio::test]
    async fn malformed_date_is_bad_request() {
        let res = get_snapshot_by_date(
            State(state_without_db()),
            Path("2026-13-01".to_string()),
        )
        .await;
        assert_eq!(res.err(), Some(StatusCode::BAD_REQUEST));

        let res = get_snapshot_by_date(State(state_without_db()), Path("latest".to_string())).await;
        assert_eq!(res.err(), Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn snapshots_without_db_are_unavailable() {
        let res = get_latest_snapshot(State(state_without_db())).await;
        assert_eq!(res.err(), Some(StatusCode::SERVICE_UNAVAILABLE));

        let res = get_snapshot_by_date(
            State(state_without_db()),
            Path("2026-01-02".to_string()),
        )
        .await;
        assert_eq!(res.err(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }
}
