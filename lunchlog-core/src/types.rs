//! Core domain types for lunchlog
//!
//! These types mirror the JSON the lunch backend speaks (camelCase field names),
//! so the same structs serve the fixture files, the SQLite store and the REST client.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Restaurant** | A place in the catalog, with position and display snapshot fields |
//! | **Category** | Free-text cuisine label ("한식", "카페", ...) shared with the catalog |
//! | **History record** | A timestamped log entry that a restaurant was chosen |
//! | **Window** | The trailing 7 days used to scope history and its statistics |

use crate::error::{Error, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================
// Location
// ============================================

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Seoul City Hall; used whenever no position is known.
    pub const DEFAULT: Location = Location {
        latitude: 37.5665,
        longitude: 126.9780,
    };

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

// ============================================
// Restaurants
// ============================================

pub const DEFAULT_PHONE: &str = "02-1234-5678";
pub const DEFAULT_OPENING_HOURS: &str = "11:00 - 22:00";
pub const DEFAULT_PRICE_RANGE: &str = "1만원 - 2만원";

/// A restaurant as shown in lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    /// Image URL
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub address: String,
    /// 0.0 - 5.0
    #[serde(default)]
    pub rating: f64,
    /// Metres from the position the list was requested for
    #[serde(default)]
    pub distance: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_address: Option<String>,
}

impl Restaurant {
    pub fn location(&self) -> Location {
        Location::new(self.latitude, self.longitude)
    }
}

/// A restaurant with everything the detail page shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDetail {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    #[serde(default = "default_opening_hours")]
    pub opening_hours: String,
    #[serde(default = "default_price_range")]
    pub price_range: String,
    #[serde(default)]
    pub menu: Vec<MenuItem>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl RestaurantDetail {
    /// Phone number, falling back to the catalog default when unknown
    pub fn phone(&self) -> &str {
        self.restaurant.phone.as_deref().unwrap_or(DEFAULT_PHONE)
    }

    /// Mean review rating, if there are reviews
    pub fn average_review_rating(&self) -> Option<f64> {
        if self.reviews.is_empty() {
            return None;
        }
        let sum: f64 = self.reviews.iter().map(|r| r.rating).sum();
        Some(sum / self.reviews.len() as f64)
    }
}

fn default_opening_hours() -> String {
    DEFAULT_OPENING_HOURS.to_string()
}

fn default_price_range() -> String {
    DEFAULT_PRICE_RANGE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    /// Won
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub user_name: String,
    pub rating: f64,
    pub comment: String,
    pub date: String,
}

// ============================================
// Recommendations
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Restaurant id
    pub id: i64,
    pub reason: String,
}

/// Response of the recommendation endpoint (snake_case on the wire).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub recommendations: Vec<Recommendation>,
    /// Number of candidates that were considered
    pub total_count: usize,
    pub user_location: String,
}

// ============================================
// History
// ============================================

/// A record that a restaurant was chosen.
///
/// Name, category and image are a snapshot taken when the record was created;
/// later catalog edits do not change existing records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: i64,
    pub restaurant_id: i64,
    pub restaurant_name: String,
    pub restaurant_category: String,
    #[serde(default)]
    pub restaurant_image: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub selected_at: DateTime<Utc>,
    /// Calendar day (`YYYY-MM-DD`) of `selected_at` in the creator's timezone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl HistoryRecord {
    /// Create the record for choosing `restaurant` at `selected_at`.
    ///
    /// `date` is derived here, in the local timezone, and never recomputed.
    pub fn snapshot(id: i64, restaurant: &Restaurant, selected_at: DateTime<Utc>) -> Self {
        Self::snapshot_in(id, restaurant, selected_at, &Local)
    }

    /// Like [`HistoryRecord::snapshot`] with an explicit timezone for `date`.
    pub fn snapshot_in<Tz: TimeZone>(
        id: i64,
        restaurant: &Restaurant,
        selected_at: DateTime<Utc>,
        tz: &Tz,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let date = selected_at
            .with_timezone(tz)
            .format("%Y-%m-%d")
            .to_string();
        Self {
            id,
            restaurant_id: restaurant.id,
            restaurant_name: restaurant.name.clone(),
            restaurant_category: restaurant.category.clone(),
            restaurant_image: restaurant.image.clone(),
            selected_at,
            date: Some(date),
        }
    }

    /// Day key for grouping.
    ///
    /// The stored `date` wins; the local day of `selected_at` is only used when
    /// the backend did not send one.
    pub fn day(&self) -> String {
        match &self.date {
            Some(date) => date.clone(),
            None => self
                .selected_at
                .with_timezone(&Local)
                .format("%Y-%m-%d")
                .to_string(),
        }
    }
}

/// Parse a history timestamp.
///
/// Accepts RFC 3339 instants and offset-less ISO-8601 date-times, which are read
/// as local time. Anything else is an [`Error::InvalidTimestamp`].
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| Error::InvalidTimestamp(format!("{:?}: {}", raw, e)))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| Error::InvalidTimestamp(format!("{:?}: not a valid local time", raw)))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

// ============================================
// Categories
// ============================================

/// An entry of the display vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub icon: &'static str,
    /// Chart colour as `#rrggbb`
    pub color: &'static str,
}

/// Colour for categories outside the vocabulary
pub const UNKNOWN_CATEGORY_COLOR: &str = "#95a5a6";

/// Categories offered by the filter view, in display order.
#[rustfmt::skip]
pub const CATEGORIES: &[Category] = &[
    Category { name: "한식", icon: "🍚", color: "#ff6b6b" },
    Category { name: "중식", icon: "🥢", color: "#feca57" },
    Category { name: "일식", icon: "🍣", color: "#45b7d1" },
    Category { name: "양식", icon: "🍝", color: "#4ecdc4" },
    Category { name: "분식", icon: "🍜", color: "#a55eea" },
    Category { name: "샐러드", icon: "🥗", color: "#26de81" },
    Category { name: "카페", icon: "☕", color: "#fed330" },
    Category { name: "디저트", icon: "🍰", color: "#fc5c65" },
];

/// Look up a category in the vocabulary (exact match).
pub fn category(name: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.name == name)
}

/// Chart colour for any category string.
pub fn category_color(name: &str) -> &'static str {
    category(name).map(|c| c.color).unwrap_or(UNKNOWN_CATEGORY_COLOR)
}
