//! # lunchlog-core
//!
//! Core library for lunchlog - a lunch spot finder that keeps track of where you ate.
//!
//! This library provides:
//! - Domain types for restaurants and lunch history
//! - History analytics: the trailing 7-day window, category shares and pie-chart arcs
//! - Data sources (bundled sample data, a local SQLite store, a REST backend)
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use lunchlog_core::analytics::HistoryReport;
//! use lunchlog_core::{create_source, Config};
//!
//! let config = Config::load().expect("failed to load config");
//! let source = create_source(&config).expect("failed to open source");
//!
//! let history = source.history().expect("failed to load history");
//! let report = HistoryReport::build(&history, Utc::now());
//! for stat in &report.stats {
//!     println!("{} {}%", stat.category, stat.percentage);
//! }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use source::{create_source, LunchSource};
pub use types::*;

// Public modules
pub mod analytics;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod geo;
pub mod logging;
pub mod source;
pub mod types;
