//! Pie-chart geometry for category stats.
//!
//! Angles are in degrees, clockwise from the positive x axis as in SVG user
//! space. The renderer rotates the chart by -90° so the first slice starts at
//! twelve o'clock.

use std::fmt::Write;

use serde::Serialize;

use super::categories::CategoryStat;
use crate::types::category_color;

/// One category's slice of the pie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arc {
    pub category: String,
    pub start_angle_deg: f64,
    pub end_angle_deg: f64,
}

impl Arc {
    /// Angular width of the slice
    pub fn sweep(&self) -> f64 {
        self.end_angle_deg - self.start_angle_deg
    }

    /// Whether SVG must draw this slice along the long way round
    pub fn is_large(&self) -> bool {
        self.sweep() > 180.0
    }

    /// SVG path data for the slice of a circle centred at (`cx`, `cy`).
    ///
    /// A slice covering the whole circle is drawn as two half arcs, since an
    /// arc whose end point equals its start point renders nothing.
    pub fn svg_path(&self, cx: f64, cy: f64, r: f64) -> String {
        if self.sweep() >= 360.0 {
            return format!(
                "M {} {} A {r} {r} 0 1 1 {} {} A {r} {r} 0 1 1 {} {} Z",
                coord(cx + r),
                coord(cy),
                coord(cx - r),
                coord(cy),
                coord(cx + r),
                coord(cy),
                r = coord(r),
            );
        }

        let (x1, y1) = point_on_circle(cx, cy, r, self.start_angle_deg);
        let (x2, y2) = point_on_circle(cx, cy, r, self.end_angle_deg);
        format!(
            "M {} {} L {} {} A {r} {r} 0 {} 1 {} {} Z",
            coord(cx),
            coord(cy),
            coord(x1),
            coord(y1),
            u8::from(self.is_large()),
            coord(x2),
            coord(y2),
            r = coord(r),
        )
    }
}

/// Walk `stats` in order and turn cumulative percentages into angles.
///
/// Consecutive arcs share their boundary angle and the first starts at 0°.
/// A 0% category yields a zero-width arc rather than being dropped. Because
/// percentages are rounded per category, the last arc may end slightly before
/// or after 360°.
pub fn arcs_for(stats: &[CategoryStat]) -> Vec<Arc> {
    let mut cumulative: u32 = 0;
    stats
        .iter()
        .map(|stat| {
            let start_angle_deg = percent_to_degrees(cumulative);
            cumulative += stat.percentage;
            Arc {
                category: stat.category.clone(),
                start_angle_deg,
                end_angle_deg: percent_to_degrees(cumulative),
            }
        })
        .collect()
}

fn percent_to_degrees(percent: u32) -> f64 {
    f64::from(percent) * 360.0 / 100.0
}

fn point_on_circle(cx: f64, cy: f64, r: f64, angle_deg: f64) -> (f64, f64) {
    let rad = angle_deg.to_radians();
    (cx + r * rad.cos(), cy + r * rad.sin())
}

/// Format a coordinate with at most three decimals and no trailing zeros.
fn coord(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    // Avoid "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{}", rounded)
}

/// Render the arcs as a standalone SVG pie chart.
pub fn pie_chart_svg(arcs: &[Arc]) -> String {
    let mut svg = String::new();
    svg.push_str(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100" width="256" height="256">"#,
    );
    svg.push('\n');
    svg.push_str(r#"  <g transform="rotate(-90 50 50)">"#);
    svg.push('\n');
    for arc in arcs {
        let _ = writeln!(
            svg,
            r#"    <path d="{}" fill="{}" stroke="white" stroke-width="2"><title>{}</title></path>"#,
            arc.svg_path(50.0, 50.0, 40.0),
            category_color(&arc.category),
            escape_xml(&arc.category),
        );
    }
    svg.push_str("  </g>\n</svg>\n");
    svg
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
