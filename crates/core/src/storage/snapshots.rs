use crate::report::GemReport;
use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct StoredSnapshot {
    pub snapshot_id: Uuid,
    pub as_of_date: NaiveDate,
    pub report: GemReport,
}

pub async fn persist_snapshot(
    pool: &sqlx::PgPool,
    as_of_date: NaiveDate,
    report: &GemReport,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let report_json = serde_json::to_value(report).context("serialize gem report failed")?;

    sqlx::query(
        "INSERT INTO gem_snapshots (id, as_of_date, generated_at, lookback, ticker, rationale, report, errors) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .persistent(false)
    .bind(id)
    .bind(as_of_date)
    .bind(report.generated_at)
    .bind(report.lookback.to_string())
    .bind(snapshot_ticker(report))
    .bind(&report.recommendation.rationale)
    .bind(report_json)
    .bind(&report.errors)
    .execute(pool)
    .await
    .context("insert gem_snapshots failed")?;

    Ok(id)
}

/// `None` when no instrument was recommended.
fn snapshot_ticker(report: &GemReport) -> Option<&str> {
    report
        .recommendation
        .instrument
        .map(|_| report.recommendation.ticker.as_str())
}

/// Most recent snapshot, optionally restricted to one as-of date.
pub async fn fetch_snapshot(
    pool: &sqlx::PgPool,
    as_of_date: Option<NaiveDate>,
) -> anyhow::Result<Option<StoredSnapshot>> {
    let row = match as_of_date {
        Some(d) => {
            sqlx::query_as::<_, (Uuid, NaiveDate, serde_json::Value)>(
                "SELECT id, as_of_date, report \
                 FROM gem_snapshots \
                 WHERE as_of_date = $1 \
                 ORDER BY generated_at DESC \
                 LIMIT 1",
            )
            .persistent(false)
            .bind(d)
            .fetch_optional(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, (Uuid, NaiveDate, serde_json::Value)>(
                "SELECT id, as_of_date, report \
                 FROM gem_snapshots \
                 ORDER BY as_of_date DESC, generated_at DESC \
                 LIMIT 1",
            )
            .persistent(false)
            .fetch_optional(pool)
            .await?
        }
    };

    let Some((snapshot_id, as_of_date, report_json)) = row else {
        return Ok(None);
    };

    let report = serde_json::from_value::<GemReport>(report_json)
        .with_context(|| format!("invalid report JSON in DB for snapshot_id={snapshot_id}"))?;

    Ok(Some(StoredSnapshot {
        snapshot_id,
        as_of_date,
        report,
    }))
}
