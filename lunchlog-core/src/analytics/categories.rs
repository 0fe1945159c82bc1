//! Category distribution of a history list.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::HistoryRecord;

/// How often one category was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStat {
    pub category: String,
    pub count: usize,
    /// Share of all records, rounded half-up to a whole percent
    pub percentage: u32,
}

/// Group `records` by exact category string and compute each group's share.
///
/// Categories appear in the order they are first seen. An empty input yields
/// no stats. Percentages are rounded independently, so their sum can be off
/// 100 by a little when there are many categories.
pub fn compute_stats(records: &[HistoryRecord]) -> Vec<CategoryStat> {
    let total = records.len();
    if total == 0 {
        return Vec::new();
    }

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let category = record.restaurant_category.as_str();
        let count = counts.entry(category).or_insert_with(|| {
            order.push(category);
            0
        });
        *count += 1;
    }

    order
        .into_iter()
        .map(|category| {
            let count = counts[category];
            CategoryStat {
                category: category.to_string(),
                count,
                percentage: rounded_percentage(count, total),
            }
        })
        .collect()
}

/// `round(100 * count / total)` with halves rounded up, in exact integer math.
///
/// `total` must be non-zero.
pub fn rounded_percentage(count: usize, total: usize) -> u32 {
    let count = count as u64;
    let total = total as u64;
    ((200 * count + total) / (2 * total)) as u32
}
