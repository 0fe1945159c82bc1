//! SQLite-backed source; history survives between runs.

use std::path::Path;

use chrono::{DateTime, Utc};

use super::fixture::sample_restaurants;
use super::{validate_rating, LunchSource};
use crate::catalog;
use crate::db::{Database, Preference};
use crate::error::{Error, Result};
use crate::types::{HistoryRecord, Location, Recommendations, Restaurant, RestaurantDetail};

pub struct LocalSource {
    db: Database,
}

impl LocalSource {
    /// Open (or create) the store at `path`, seeding the catalog on first use.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::open(path)?;
        Self::from_database(db)
    }

    pub fn from_database(db: Database) -> Result<Self> {
        db.migrate()?;
        if db.restaurant_count()? == 0 {
            let restaurants = sample_restaurants()?;
            for detail in &restaurants {
                db.upsert_restaurant(detail)?;
            }
            tracing::info!(count = restaurants.len(), "Seeded restaurant catalog");
        }
        Ok(Self { db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn find(&self, id: i64) -> Result<RestaurantDetail> {
        self.db
            .get_restaurant(id)?
            .ok_or(Error::RestaurantNotFound(id))
    }
}

impl LunchSource for LocalSource {
    fn name(&self) -> &'static str {
        "local"
    }

    fn restaurants(&self, at: Location, category: Option<&str>) -> Result<Vec<Restaurant>> {
        Ok(catalog::nearby(&self.db.list_restaurants()?, at, category))
    }

    fn nearby(&self, at: Location, radius_m: f64) -> Result<Vec<Restaurant>> {
        Ok(catalog::within_radius(
            &self.db.list_restaurants()?,
            at,
            radius_m,
        ))
    }

    fn recommend(&self, at: Location) -> Result<Recommendations> {
        let now = Utc::now();
        let history = self
            .db
            .list_history_between(crate::analytics::window_start(now), now)?;
        Ok(catalog::recommend(
            &self.db.list_restaurants()?,
            at,
            &history,
            now,
        ))
    }

    fn restaurant_detail(&self, id: i64) -> Result<RestaurantDetail> {
        self.find(id)
    }

    fn restaurants_by_category(&self, category: &str) -> Result<Vec<Restaurant>> {
        Ok(catalog::by_category(&self.db.list_restaurants()?, category))
    }

    fn search(&self, query: &str) -> Result<Vec<Restaurant>> {
        Ok(catalog::search(&self.db.list_restaurants()?, query))
    }

    fn history(&self) -> Result<Vec<HistoryRecord>> {
        self.db.list_history()
    }

    fn history_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoryRecord>> {
        self.db.list_history_between(start, end)
    }

    fn record_selection(&self, restaurant_id: i64) -> Result<i64> {
        let detail = self.find(restaurant_id)?;
        let record = self.db.insert_history(&detail.restaurant, Utc::now())?;
        tracing::info!(id = record.id, restaurant_id, "Recorded selection");
        Ok(record.id)
    }

    fn delete_history(&self, id: i64) -> Result<()> {
        if !self.db.delete_history(id)? {
            return Err(Error::HistoryNotFound(id));
        }
        tracing::info!(id, "Deleted history record");
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
        self.db.upsert_preference(&Preference {
            restaurant_id,
            rating,
            comment: comment.map(str::to_string),
            updated_at: Utc::now(),
        })
    }
}
