//! Data sources for restaurants and lunch history.
//!
//! Every command talks to a [`LunchSource`]; which implementation backs it is
//! decided once from configuration by [`create_source`].

mod fixture;
mod local;
mod remote;

pub use fixture::FixtureSource;
pub use local::LocalSource;
pub use remote::RemoteSource;

use chrono::{DateTime, Utc};

use crate::config::{Config, SourceKind};
use crate::error::{Error, Result};
use crate::types::{HistoryRecord, Location, Recommendations, Restaurant, RestaurantDetail};

/// Highest rating a user can give
pub const MAX_RATING: f64 = 5.0;

/// A source of restaurant and history data.
pub trait LunchSource: Send + Sync {
    /// Short identifier for logs and `status` output
    fn name(&self) -> &'static str;

    /// Restaurants with distances from `at`, nearest first
    fn restaurants(&self, at: Location, category: Option<&str>) -> Result<Vec<Restaurant>>;

    /// Restaurants within `radius_m` metres of `at`
    fn nearby(&self, at: Location, radius_m: f64) -> Result<Vec<Restaurant>>;

    fn recommend(&self, at: Location) -> Result<Recommendations>;

    fn restaurant_detail(&self, id: i64) -> Result<RestaurantDetail>;

    fn restaurants_by_category(&self, category: &str) -> Result<Vec<Restaurant>>;

    fn search(&self, query: &str) -> Result<Vec<Restaurant>>;

    /// All history records
    fn history(&self) -> Result<Vec<HistoryRecord>>;

    /// History with `start <= selected_at <= end`
    fn history_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoryRecord>>;

    /// Log that a restaurant was chosen now. Returns the new history id.
    fn record_selection(&self, restaurant_id: i64) -> Result<i64>;

    fn delete_history(&self, id: i64) -> Result<()>;

    fn update_preference(&self, restaurant_id: i64, rating: f64, comment: Option<&str>)
        -> Result<()>;
}

/// Build the source selected by `config.source.kind`.
pub fn create_source(config: &Config) -> Result<Box<dyn LunchSource>> {
    tracing::info!(source = config.source.kind.as_str(), "Opening data source");
    match config.source.kind {
        SourceKind::Fixture => Ok(Box::new(FixtureSource::new()?)),
        SourceKind::Local => Ok(Box::new(LocalSource::open(&Config::database_path())?)),
        SourceKind::Remote => Ok(Box::new(RemoteSource::new(&config.api)?)),
    }
}

/// Reject ratings outside `0.0..=5.0` (and NaN).
pub fn validate_rating(rating: f64) -> Result<()> {
    if (0.0..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "rating must be between 0 and {}, got {}",
            MAX_RATING, rating
        )))
    }
}
