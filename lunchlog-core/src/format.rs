//! Formatting helpers for terminal output.

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Format a distance in metres (e.g., "150m", "1.2km").
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{}m", meters.round() as i64)
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}

/// Five-glyph star bar: ★ per whole point, ☆ for a fractional part, · for the rest.
pub fn format_rating_stars(rating: f64) -> String {
    let rating = rating.clamp(0.0, 5.0);
    let full = rating.floor() as usize;
    let half = usize::from(rating.fract() > 0.0);
    let empty = 5 - full - half;
    format!("{}{}{}", "★".repeat(full), "☆".repeat(half), "·".repeat(empty))
}

fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    match (today - day).num_days() {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        _ => day.format("%a, %b %-d").to_string(),
    }
}

/// Local calendar day of `ts` relative to `now` ("today", "yesterday", "Mon, Jan 15").
pub fn format_day(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    day_label(
        ts.with_timezone(&Local).date_naive(),
        now.with_timezone(&Local).date_naive(),
    )
}

/// Like [`format_day`] for a stored `YYYY-MM-DD` key. Unparseable keys are shown as-is.
pub fn format_day_key(day: &str, now: DateTime<Utc>) -> String {
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(date) => day_label(date, now.with_timezone(&Local).date_naive()),
        Err(_) => day.to_string(),
    }
}

/// Local wall-clock time as `HH:MM`.
pub fn format_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M").to_string()
}
