//! History page data: the trailing window, its category stats and pie arcs.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::arcs::{arcs_for, Arc};
use super::categories::{compute_stats, CategoryStat};
use super::window::{filter_recent, window_start};
use crate::types::HistoryRecord;

/// Everything the history view shows, computed from one fetch of history.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryReport {
    /// Reference instant the window ends at
    pub now: DateTime<Utc>,
    /// Inclusive start of the window
    pub window_start: DateTime<Utc>,
    /// Records inside the window, in source order
    pub records: Vec<HistoryRecord>,
    pub stats: Vec<CategoryStat>,
    pub arcs: Vec<Arc>,
}

/// Records sharing one stored calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct DayGroup<'a> {
    pub day: String,
    pub records: Vec<&'a HistoryRecord>,
}

impl HistoryReport {
    /// Run filter -> stats -> arcs over a full history list.
    pub fn build(history: &[HistoryRecord], now: DateTime<Utc>) -> Self {
        let records = filter_recent(history, now);
        let stats = compute_stats(&records);
        let arcs = arcs_for(&stats);

        tracing::info!(
            fetched = history.len(),
            in_window = records.len(),
            categories = stats.len(),
            "Built history report"
        );

        Self {
            now,
            window_start: window_start(now),
            records,
            stats,
            arcs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Group the windowed records by their stored day.
    ///
    /// Groups appear in first-seen order and keep record order within a day.
    pub fn by_day(&self) -> Vec<DayGroup<'_>> {
        let mut groups: Vec<DayGroup<'_>> = Vec::new();
        for record in &self.records {
            let day = record.day();
            match groups.iter_mut().find(|g| g.day == day) {
                Some(group) => group.records.push(record),
                None => groups.push(DayGroup {
                    day,
                    records: vec![record],
                }),
            }
        }
        groups
    }

    /// The most chosen category, first-seen wins ties
    pub fn top_category(&self) -> Option<&CategoryStat> {
        self.stats
            .iter()
            .fold(None, |best: Option<&CategoryStat>, stat| match best {
                Some(b) if b.count >= stat.count => Some(b),
                _ => Some(stat),
            })
    }
}
