//! History analytics
//!
//! A pure pipeline over an already-fetched history list:
//! - [`window`] keeps the records of the trailing 7 days
//! - [`categories`] counts them per category with whole-percent shares
//! - [`arcs`] turns the shares into pie-chart angles and SVG
//! - [`report`] runs all three for the history view
//!
//! Nothing here does I/O or holds state, so every function is safe to call
//! concurrently and repeatedly.

pub mod arcs;
pub mod categories;
pub mod report;
pub mod window;

pub use arcs::{arcs_for, pie_chart_svg, Arc};
pub use categories::{compute_stats, rounded_percentage, CategoryStat};
pub use report::{DayGroup, HistoryReport};
pub use window::{filter_recent, window_start, WINDOW_DAYS};
