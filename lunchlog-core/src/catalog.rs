//! Queries over an in-memory restaurant catalog.
//!
//! Shared by the fixture and local sources, which both hold the full catalog;
//! the remote backend answers the same questions server-side.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::analytics::filter_recent;
use crate::geo::distance_m;
use crate::types::{HistoryRecord, Location, Recommendation, Recommendations, Restaurant};

/// Recommendations only consider restaurants this close
pub const MAX_DISTANCE_M: f64 = 1_000.0;

/// Upper bound on returned recommendations
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Restaurants with `distance` measured from `at`, nearest first.
///
/// `category` filters by exact match.
pub fn nearby(catalog: &[Restaurant], at: Location, category: Option<&str>) -> Vec<Restaurant> {
    let mut result: Vec<Restaurant> = catalog
        .iter()
        .filter(|r| category.map_or(true, |c| r.category == c))
        .map(|r| {
            let mut r = r.clone();
            r.distance = distance_m(at, r.location()).round();
            r
        })
        .collect();
    result.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    result
}

/// [`nearby`] restricted to `radius_m` metres.
pub fn within_radius(catalog: &[Restaurant], at: Location, radius_m: f64) -> Vec<Restaurant> {
    nearby(catalog, at, None)
        .into_iter()
        .filter(|r| r.distance <= radius_m)
        .collect()
}

/// Restaurants of one category, catalog order.
pub fn by_category(catalog: &[Restaurant], category: &str) -> Vec<Restaurant> {
    catalog
        .iter()
        .filter(|r| r.category == category)
        .cloned()
        .collect()
}

/// Case-insensitive substring search on name, description and category.
pub fn search(catalog: &[Restaurant], query: &str) -> Vec<Restaurant> {
    let query = query.to_lowercase();
    catalog
        .iter()
        .filter(|r| {
            r.name.to_lowercase().contains(&query)
                || r.description.to_lowercase().contains(&query)
                || r.category.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

/// Suggest lunch spots near `at`, favouring categories not eaten lately.
///
/// Candidates are restaurants within [`MAX_DISTANCE_M`]. They are ranked by how
/// often their category was chosen in the trailing window ending at `now`,
/// then by distance, then by rating.
pub fn recommend(
    catalog: &[Restaurant],
    at: Location,
    history: &[HistoryRecord],
    now: DateTime<Utc>,
) -> Recommendations {
    let candidates = within_radius(catalog, at, MAX_DISTANCE_M);

    let mut recent_counts: HashMap<&str, usize> = HashMap::new();
    let recent = filter_recent(history, now);
    for record in &recent {
        *recent_counts
            .entry(record.restaurant_category.as_str())
            .or_default() += 1;
    }

    let mut ranked: Vec<(&Restaurant, usize)> = candidates
        .iter()
        .map(|r| (r, recent_counts.get(r.category.as_str()).copied().unwrap_or(0)))
        .collect();
    ranked.sort_by(|(a, a_count), (b, b_count)| {
        a_count
            .cmp(b_count)
            .then(a.distance.total_cmp(&b.distance))
            .then(b.rating.total_cmp(&a.rating))
    });

    let recommendations = ranked
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .map(|(r, count)| Recommendation {
            id: r.id,
            reason: reason(r, count),
        })
        .collect();

    Recommendations {
        recommendations,
        total_count: candidates.len(),
        user_location: at.to_string(),
    }
}

fn reason(restaurant: &Restaurant, recent_count: usize) -> String {
    let freshness = match recent_count {
        0 => format!("no {} this week", restaurant.category),
        1 => format!("{} once this week", restaurant.category),
        n => format!("{} {} times this week", restaurant.category, n),
    };
    format!(
        "{}, {}m away, rated {:.1}",
        freshness, restaurant.distance, restaurant.rating
    )
}
