use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use std::collections::HashSet;

// NYSE closes 16:00 New York, i.e. 21:00 UTC in winter and 20:00 UTC in summer.
// Using the later one keeps the cutoff conservative year-round.
const CLOSE_CUTOFF_HOUR_UTC: u32 = 21;

/// Latest US session whose close has already happened at `now_utc`.
pub fn expected_session_date(now_utc: DateTime<Utc>) -> NaiveDate {
    let mut date = now_utc.date_naive();
    if now_utc.hour() < CLOSE_CUTOFF_HOUR_UTC {
        date = date - Duration::days(1);
    }

    let holidays = configured_holidays(now_utc.year());
    while is_weekend(date) || holidays.contains(&date) {
        date = date - Duration::days(1);
    }

    date
}

/// True when the feed's newest bar predates the expected session.
pub fn is_stale(last_bar_date: NaiveDate, now_utc: DateTime<Utc>) -> bool {
    last_bar_date < expected_session_date(now_utc)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}

fn configured_holidays(year: i32) -> HashSet<NaiveDate> {
    // Fixed-date closures only. Floating holidays (Thanksgiving, Good Friday, ...)
    // come from US_MARKET_HOLIDAYS="YYYY-MM-DD,YYYY-MM-DD".
    let mut out = HashSet::new();
    // Rollback never crosses more than one year boundary.
    for y in [year - 1, year] {
        for (m, d) in [(1, 1), (6, 19), (7, 4), (12, 25)] {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                out.insert(date);
            }
        }
    }

    if let Ok(s) = std::env::var("US_MARKET_HOLIDAYS") {
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match NaiveDate::parse_from_str(part, "%Y-%m-%d") {
                Ok(d) => {
                    out.insert(d);
                }
                Err(err) => tracing::warn!(value = part, error = %err, "ignoring bad US_MARKET_HOLIDAYS entry"),
            }
        }
    }

    out
}
