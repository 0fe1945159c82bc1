//! Text rendering of the history page.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use lunchlog_core::analytics::{pie_chart_svg, HistoryReport, WINDOW_DAYS};
use lunchlog_core::format::{format_day_key, format_time};
use lunchlog_core::types::category;

pub fn print_report(report: &HistoryReport) {
    println!(
        "Lunches {} - {} (last {} days)",
        report.window_start.with_timezone(&Local).format("%b %-d"),
        report.now.with_timezone(&Local).format("%b %-d %H:%M"),
        WINDOW_DAYS
    );
    println!();

    if report.is_empty() {
        println!("No lunches in the last {} days.", WINDOW_DAYS);
        return;
    }

    for group in report.by_day() {
        println!("{}", format_day_key(&group.day, report.now));
        for record in group.records {
            println!(
                "  {}  {} ({})  #{}",
                format_time(record.selected_at),
                record.restaurant_name,
                record.restaurant_category,
                record.id
            );
        }
    }

    println!();
    println!("Categories");
    for (stat, arc) in report.stats.iter().zip(&report.arcs) {
        let icon = category(&stat.category).map(|c| c.icon).unwrap_or("·");
        println!(
            "  {} {:<6} {:>2}x {:>3}%   {:>5.1}° - {:>5.1}°",
            icon, stat.category, stat.count, stat.percentage, arc.start_angle_deg, arc.end_angle_deg
        );
    }
}

pub fn write_svg(report: &HistoryReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, pie_chart_svg(&report.arcs))
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), slices = report.arcs.len(), "Wrote pie chart");
    Ok(())
}
