//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: catalog and history
    r#"
    CREATE TABLE IF NOT EXISTS restaurants (
        id               INTEGER PRIMARY KEY,
        name             TEXT NOT NULL,
        description      TEXT NOT NULL DEFAULT '',
        category         TEXT NOT NULL,
        image            TEXT NOT NULL DEFAULT '',
        address          TEXT NOT NULL DEFAULT '',
        rating           REAL NOT NULL DEFAULT 0,
        latitude         REAL NOT NULL,
        longitude        REAL NOT NULL,
        url              TEXT,
        phone            TEXT,
        road_address     TEXT,
        opening_hours    TEXT NOT NULL,
        price_range      TEXT NOT NULL,

        -- Nested lists kept as JSON arrays
        menu             JSON NOT NULL DEFAULT '[]',
        reviews          JSON NOT NULL DEFAULT '[]'
    );

    CREATE INDEX IF NOT EXISTS idx_restaurants_category ON restaurants(category);

    -- History rows snapshot the restaurant at selection time, so there is
    -- deliberately no foreign key to restaurants.
    CREATE TABLE IF NOT EXISTS history (
        id                   INTEGER PRIMARY KEY AUTOINCREMENT,
        restaurant_id        INTEGER NOT NULL,
        restaurant_name      TEXT NOT NULL,
        restaurant_category  TEXT NOT NULL,
        restaurant_image     TEXT NOT NULL DEFAULT '',
        selected_at          DATETIME NOT NULL,
        date                 TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_history_selected_at ON history(selected_at);
    "#,
    // Version 2: user ratings
    r#"
    CREATE TABLE IF NOT EXISTS preferences (
        restaurant_id    INTEGER PRIMARY KEY,
        rating           REAL NOT NULL,
        comment          TEXT,
        updated_at       DATETIME NOT NULL
    );
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
