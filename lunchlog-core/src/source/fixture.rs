//! In-memory source over the bundled sample data.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::{validate_rating, LunchSource};
use crate::catalog;
use crate::db::Preference;
use crate::error::{Error, Result};
use crate::types::{HistoryRecord, Location, Recommendations, Restaurant, RestaurantDetail};

const RESTAURANTS_JSON: &str = include_str!("../../fixtures/restaurants.json");
const HISTORY_JSON: &str = include_str!("../../fixtures/history.json");

/// Bundled restaurant catalog with menus and reviews
pub fn sample_restaurants() -> Result<Vec<RestaurantDetail>> {
    Ok(serde_json::from_str(RESTAURANTS_JSON)?)
}

/// Bundled history, newest first
pub fn sample_history() -> Result<Vec<HistoryRecord>> {
    Ok(serde_json::from_str(HISTORY_JSON)?)
}

/// Catalog and history held in memory. Nothing is persisted.
pub struct FixtureSource {
    details: Vec<RestaurantDetail>,
    catalog: Vec<Restaurant>,
    history: Mutex<Vec<HistoryRecord>>,
    preferences: Mutex<HashMap<i64, Preference>>,
}

impl FixtureSource {
    pub fn new() -> Result<Self> {
        Ok(Self::with_data(sample_restaurants()?, sample_history()?))
    }

    /// Build from explicit data, e.g. an empty history for tests
    pub fn with_data(details: Vec<RestaurantDetail>, history: Vec<HistoryRecord>) -> Self {
        let catalog = details.iter().map(|d| d.restaurant.clone()).collect();
        Self {
            details,
            catalog,
            history: Mutex::new(history),
            preferences: Mutex::new(HashMap::new()),
        }
    }

    /// The stored rating for a restaurant, if any
    pub fn preference(&self, restaurant_id: i64) -> Option<Preference> {
        self.preferences
            .lock()
            .unwrap()
            .get(&restaurant_id)
            .cloned()
    }

    fn find(&self, id: i64) -> Result<&RestaurantDetail> {
        self.details
            .iter()
            .find(|d| d.restaurant.id == id)
            .ok_or(Error::RestaurantNotFound(id))
    }
}

impl LunchSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    fn restaurants(&self, at: Location, category: Option<&str>) -> Result<Vec<Restaurant>> {
        Ok(catalog::nearby(&self.catalog, at, category))
    }

    fn nearby(&self, at: Location, radius_m: f64) -> Result<Vec<Restaurant>> {
        Ok(catalog::within_radius(&self.catalog, at, radius_m))
    }

    fn recommend(&self, at: Location) -> Result<Recommendations> {
        let history = self.history.lock().unwrap();
        Ok(catalog::recommend(&self.catalog, at, &history, Utc::now()))
    }

    fn restaurant_detail(&self, id: i64) -> Result<RestaurantDetail> {
        self.find(id).cloned()
    }

    fn restaurants_by_category(&self, category: &str) -> Result<Vec<Restaurant>> {
        Ok(catalog::by_category(&self.catalog, category))
    }

    fn search(&self, query: &str) -> Result<Vec<Restaurant>> {
        Ok(catalog::search(&self.catalog, query))
    }

    fn history(&self) -> Result<Vec<HistoryRecord>> {
        Ok(self.history.lock().unwrap().clone())
    }

    fn history_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoryRecord>> {
        let history = self.history.lock().unwrap();
        Ok(history
            .iter()
            .filter(|r| r.selected_at >= start && r.selected_at <= end)
            .cloned()
            .collect())
    }

    fn record_selection(&self, restaurant_id: i64) -> Result<i64> {
        let restaurant = &self.find(restaurant_id)?.restaurant;
        let mut history = self.history.lock().unwrap();
        let id = history.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        history.insert(0, HistoryRecord::snapshot(id, restaurant, Utc::now()));
        tracing::info!(id, restaurant_id, "Recorded selection in memory");
        Ok(id)
    }

    fn delete_history(&self, id: i64) -> Result<()> {
        let mut history = self.history.lock().unwrap();
        let before = history.len();
        history.retain(|r| r.id != id);
        if history.len() == before {
            return Err(Error::HistoryNotFound(id));
        }
        Ok(())
    }

    fn update_preference(
        &self,
        restaurant_id: i64,
        rating: f64,
        comment: Option<&str>,
    ) -> Result<()> {
        validate_rating(rating)?;
        self.find(restaurant_id)?;
        self.preferences.lock().unwrap().insert(
            restaurant_id,
            Preference {
                restaurant_id,
                rating,
                comment: comment.map(str::to_string),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }
}
