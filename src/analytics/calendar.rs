//! Calendar helpers: Monday-based week keys, month grids, week navigation
//!
//! Everything works on local `NaiveDate`s built explicitly from timestamps,
//! never on string comparisons of ISO timestamps.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

use crate::error::ParseError;

/// Local calendar date of a UTC timestamp in the given timezone
pub fn local_date<Tz: TimeZone>(ts: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    ts.with_timezone(tz).date_naive()
}

/// Monday of the ISO week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Stable week identifier: the Monday as `YYYY-MM-DD`
pub fn week_key(date: NaiveDate) -> String {
    week_start(date).format("%Y-%m-%d").to_string()
}

/// Move `delta` weeks forward (or back when negative) from the week of `date`
pub fn shift_week(date: NaiveDate, delta: i64) -> NaiveDate {
    week_start(date) + Duration::weeks(delta)
}

/// Monday through Sunday of the week containing `date`
pub fn week_days(date: NaiveDate) -> [NaiveDate; 7] {
    let monday = week_start(date);
    std::array::from_fn(|i| monday + Duration::days(i as i64))
}

pub fn is_current_week(date: NaiveDate, today: NaiveDate) -> bool {
    week_start(date) == week_start(today)
}

/// Monday-first grid for a month. Days outside the month are `None`.
pub fn month_grid(year: i32, month: u32) -> Result<Vec<[Option<NaiveDate>; 7]>, ParseError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(ParseError::InvalidMonth { year, month })?;

    let mut rows = Vec::new();
    let mut cursor = week_start(first);
    loop {
        let row: [Option<NaiveDate>; 7] = std::array::from_fn(|i| {
            let day = cursor + Duration::days(i as i64);
            (day.month() == month && day.year() == year).then_some(day)
        });
        if row.iter().all(Option::is_none) {
            break;
        }
        rows.push(row);
        cursor += Duration::weeks(1);
    }

    Ok(rows)
}
