use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Snapshot date for a worker run: the explicit `YYYY-MM-DD` argument if given, otherwise
/// today's UTC date rolled back to the previous weekday.
pub fn resolve_as_of_date(
    as_of_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?);
    }

    let mut date = now_utc.date_naive();
    while is_weekend(date) {
        date = date - Duration::days(1);
    }

    Ok(date)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}
