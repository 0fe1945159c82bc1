//! Database layer for lunchlog
//!
//! This module provides the local store using SQLite with:
//! - Schema migrations
//! - Repository pattern for catalog, history and preference queries

pub mod repo;
pub mod schema;

pub use repo::{Database, Preference};
