//! Trailing history window.
//!
//! The history view and its statistics only look at the last seven days,
//! measured as a plain duration back from "now" (not calendar midnights).

use chrono::{DateTime, Duration, Utc};

use crate::types::HistoryRecord;

/// Length of the trailing window in days
pub const WINDOW_DAYS: i64 = 7;

/// The trailing window as a duration (168 hours).
pub fn window() -> Duration {
    Duration::days(WINDOW_DAYS)
}

/// Earliest `selected_at` still inside the window ending at `now`.
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - window()
}

/// Keep the records chosen within the trailing window ending at `now`.
///
/// The boundary is inclusive. Survivors keep their input order and the input
/// is left untouched.
pub fn filter_recent(records: &[HistoryRecord], now: DateTime<Utc>) -> Vec<HistoryRecord> {
    let cutoff = window_start(now);
    let kept: Vec<HistoryRecord> = records
        .iter()
        .filter(|record| record.selected_at >= cutoff)
        .cloned()
        .collect();

    tracing::debug!(
        total = records.len(),
        kept = kept.len(),
        cutoff = %cutoff,
        "Filtered history to trailing window"
    );

    kept
}
