//! Database repository layer
//!
//! Provides query and insert operations for the catalog, history and ratings.

use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

/// A user's rating of a restaurant.
#[derive(Debug, Clone, PartialEq)]
pub struct Preference {
    pub restaurant_id: i64,
    /// 0.0 - 5.0
    pub rating: f64,
    pub comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

const RESTAURANT_COLUMNS: &str = "id, name, description, category, image, address, rating, \
     latitude, longitude, url, phone, road_address";

const HISTORY_COLUMNS: &str = "id, restaurant_id, restaurant_name, restaurant_category, \
     restaurant_image, selected_at, date";

/// Fixed-width UTC form so that text ordering matches time ordering.
fn timestamp_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn timestamp_from_sql(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    // ============================================
    // Restaurant operations
    // ============================================

    /// Insert or update a restaurant with its menu and reviews
    pub fn upsert_restaurant(&self, detail: &RestaurantDetail) -> Result<()> {
        let r = &detail.restaurant;
        let menu = serde_json::to_string(&detail.menu)?;
        let reviews = serde_json::to_string(&detail.reviews)?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO restaurants (
                id, name, description, category, image, address, rating,
                latitude, longitude, url, phone, road_address,
                opening_hours, price_range, menu, reviews
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                category = excluded.category,
                image = excluded.image,
                address = excluded.address,
                rating = excluded.rating,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                url = excluded.url,
                phone = excluded.phone,
                road_address = excluded.road_address,
                opening_hours = excluded.opening_hours,
                price_range = excluded.price_range,
                menu = excluded.menu,
                reviews = excluded.reviews
            "#,
            params![
                r.id,
                r.name,
                r.description,
                r.category,
                r.image,
                r.address,
                r.rating,
                r.latitude,
                r.longitude,
                r.url,
                r.phone,
                r.road_address,
                detail.opening_hours,
                detail.price_range,
                menu,
                reviews,
            ],
        )?;
        Ok(())
    }

    /// All restaurants, by id. `distance` is left at zero.
    pub fn list_restaurants(&self) -> Result<Vec<Restaurant>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM restaurants ORDER BY id",
            RESTAURANT_COLUMNS
        ))?;
        let rows = stmt.query_map([], Self::row_to_restaurant)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::from)
    }

    /// Get a restaurant with menu and reviews by ID
    pub fn get_restaurant(&self, id: i64) -> Result<Option<RestaurantDetail>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!(
                "SELECT {}, opening_hours, price_range, menu, reviews FROM restaurants WHERE id = ?",
                RESTAURANT_COLUMNS
            ),
            [id],
            Self::row_to_restaurant_detail,
        )
        .optional()
        .map_err(Error::from)
    }

    pub fn restaurant_count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM restaurants", [], |r| r.get(0))?;
        Ok(count)
    }

    fn row_to_restaurant(row: &Row) -> rusqlite::Result<Restaurant> {
        Ok(Restaurant {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            category: row.get("category")?,
            image: row.get("image")?,
            address: row.get("address")?,
            rating: row.get("rating")?,
            distance: 0.0,
            latitude: row.get("latitude")?,
            longitude: row.get("longitude")?,
            url: row.get("url")?,
            phone: row.get("phone")?,
            road_address: row.get("road_address")?,
        })
    }

    fn row_to_restaurant_detail(row: &Row) -> rusqlite::Result<RestaurantDetail> {
        let menu_str: String = row.get("menu")?;
        let reviews_str: String = row.get("reviews")?;

        Ok(RestaurantDetail {
            restaurant: Self::row_to_restaurant(row)?,
            opening_hours: row.get("opening_hours")?,
            price_range: row.get("price_range")?,
            menu: serde_json::from_str(&menu_str).unwrap_or_default(),
            reviews: serde_json::from_str(&reviews_str).unwrap_or_default(),
        })
    }

    // ============================================
    // History operations
    // ============================================

    /// Record that `restaurant` was chosen at `selected_at`.
    ///
    /// Returns the stored record with its assigned id. `selected_at` is kept
    /// at millisecond precision, the same as a later read returns.
    pub fn insert_history(
        &self,
        restaurant: &Restaurant,
        selected_at: DateTime<Utc>,
    ) -> Result<HistoryRecord> {
        let conn = self.conn.lock().unwrap();
        let mut record = HistoryRecord::snapshot(0, restaurant, selected_at.trunc_subsecs(3));
        conn.execute(
            r#"
            INSERT INTO history (
                restaurant_id, restaurant_name, restaurant_category,
                restaurant_image, selected_at, date
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.restaurant_id,
                record.restaurant_name,
                record.restaurant_category,
                record.restaurant_image,
                timestamp_to_sql(record.selected_at),
                record.date,
            ],
        )?;
        record.id = conn.last_insert_rowid();
        Ok(record)
    }

    /// All history, newest first
    pub fn list_history(&self) -> Result<Vec<HistoryRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM history ORDER BY selected_at DESC, id DESC",
            HISTORY_COLUMNS
        ))?;
        let rows = stmt.query_map([], Self::row_to_history)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::from)
    }

    /// History with `start <= selected_at <= end`, newest first
    pub fn list_history_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoryRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM history
             WHERE selected_at >= ?1 AND selected_at <= ?2
             ORDER BY selected_at DESC, id DESC",
            HISTORY_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![timestamp_to_sql(start), timestamp_to_sql(end)],
            Self::row_to_history,
        )?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::from)
    }

    /// Delete a history record. Returns false when no such record existed.
    pub fn delete_history(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM history WHERE id = ?", [id])?;
        Ok(deleted > 0)
    }

    pub fn history_count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM history", [], |r| r.get(0))?;
        Ok(count)
    }

    fn row_to_history(row: &Row) -> rusqlite::Result<HistoryRecord> {
        let selected_at_str: String = row.get("selected_at")?;

        Ok(HistoryRecord {
            id: row.get("id")?,
            restaurant_id: row.get("restaurant_id")?,
            restaurant_name: row.get("restaurant_name")?,
            restaurant_category: row.get("restaurant_category")?,
            restaurant_image: row.get("restaurant_image")?,
            selected_at: timestamp_from_sql(5, &selected_at_str)?,
            date: row.get("date")?,
        })
    }

    // ============================================
    // Preference operations
    // ============================================

    /// Insert or replace the user's rating of a restaurant
    pub fn upsert_preference(&self, pref: &Preference) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO preferences (restaurant_id, rating, comment, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(restaurant_id) DO UPDATE SET
                rating = excluded.rating,
                comment = excluded.comment,
                updated_at = excluded.updated_at
            "#,
            params![
                pref.restaurant_id,
                pref.rating,
                pref.comment,
                timestamp_to_sql(pref.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_preference(&self, restaurant_id: i64) -> Result<Option<Preference>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT restaurant_id, rating, comment, updated_at FROM preferences WHERE restaurant_id = ?",
            [restaurant_id],
            |row| {
                let updated_at_str: String = row.get("updated_at")?;
                Ok(Preference {
                    restaurant_id: row.get("restaurant_id")?,
                    rating: row.get("rating")?,
                    comment: row.get("comment")?,
                    updated_at: timestamp_from_sql(3, &updated_at_str)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }
}
