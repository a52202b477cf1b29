//! Dashboard rendering using Plotters
//!
//! Draws the fixed chart grid of a `ViewModel` into one PNG and formats the
//! metrics and raw table for the terminal.

use chrono::{NaiveDate, TimeDelta};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fmt::Write as _;
use std::ops::Range;
use std::path::Path;

use crate::view::{
    CategoryCountsView, CorrelationView, HistogramView, ScatterView, TableView, TrendView,
    ViewModel,
};

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Output image size in pixels
pub const DASHBOARD_SIZE: (u32, u32) = (2400, 1600);

/// Segment palette (seaborn "Set2")
const SET2: [RGBColor; 8] = [
    RGBColor(102, 194, 165),
    RGBColor(252, 141, 98),
    RGBColor(141, 160, 203),
    RGBColor(231, 138, 195),
    RGBColor(166, 216, 84),
    RGBColor(255, 217, 47),
    RGBColor(229, 196, 148),
    RGBColor(179, 179, 179),
];

/// Tier palette (seaborn "Set1")
const SET1: [RGBColor; 9] = [
    RGBColor(228, 26, 28),
    RGBColor(55, 126, 184),
    RGBColor(77, 175, 74),
    RGBColor(152, 78, 163),
    RGBColor(255, 127, 0),
    RGBColor(255, 255, 51),
    RGBColor(166, 86, 40),
    RGBColor(247, 129, 191),
    RGBColor(153, 153, 153),
];

const HIST_COLOR: RGBColor = RGBColor(31, 119, 180);
const NO_DATA_COLOR: RGBColor = RGBColor(128, 128, 128);
const UNDEFINED_CELL: RGBColor = RGBColor(235, 235, 235);

/// Draw the whole dashboard grid to `output_path`
///
/// Layout: two rows of four charts, then the trend chart at full width.
pub fn draw_dashboard(vm: &ViewModel, output_path: &Path) -> crate::Result<()> {
    let root = BitMapBackend::new(output_path, DASHBOARD_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let body = root.titled(&dashboard_caption(vm), ("sans-serif", 32))?;
    let (_, height) = body.dim_in_pixel();
    let (grid, bottom) = body.split_vertically(height * 2 / 3);
    let cells = grid.split_evenly((2, 4));

    draw_histogram(&cells[0], &vm.recency_hist)?;
    draw_histogram(&cells[1], &vm.frequency_hist)?;
    draw_category_counts(&cells[2], &vm.segment_counts, &SET2)?;
    draw_scatter(&cells[3], &vm.scatter)?;
    draw_histogram(&cells[4], &vm.aov_hist)?;
    draw_histogram(&cells[5], &vm.clv_hist)?;
    draw_correlation(&cells[6], &vm.correlation)?;
    draw_category_counts(&cells[7], &vm.tier_counts, &SET1)?;
    draw_trend(&bottom, &vm.trend, &vm.scatter.segments)?;

    root.present()?;
    log::info!("dashboard saved to {}", output_path.display());

    Ok(())
}

/// Figure caption carrying the headline metrics
pub fn dashboard_caption(vm: &ViewModel) -> String {
    format!("Customer Lifetime Value Dashboard  |  {}", vm.metrics)
}

fn draw_no_data(area: &Area, title: &str) -> crate::Result<()> {
    let body = area.titled(title, ("sans-serif", 20))?;
    let (width, height) = body.dim_in_pixel();
    let style = ("sans-serif", 22)
        .into_font()
        .color(&NO_DATA_COLOR)
        .pos(Pos::new(HPos::Center, VPos::Center));
    body.draw_text("No data", &style, (width as i32 / 2, height as i32 / 2))?;
    Ok(())
}

fn draw_histogram(area: &Area, view: &HistogramView) -> crate::Result<()> {
    let Some(hist) = &view.histogram else {
        return draw_no_data(area, &view.title);
    };

    let (lo, hi) = hist.range();
    let y_max = view
        .kde
        .iter()
        .map(|&(_, y)| y)
        .fold(hist.max_count() as f64, f64::max)
        .max(1.0)
        * 1.1;

    let mut chart = ChartBuilder::on(area)
        .caption(&view.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(lo..hi, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(view.field.as_str())
        .y_desc("Count")
        .axis_desc_style(("sans-serif", 14))
        .draw()?;

    chart.draw_series(hist.counts.iter().enumerate().map(|(i, &count)| {
        Rectangle::new(
            [(hist.edges[i], 0.0), (hist.edges[i + 1], count as f64)],
            HIST_COLOR.mix(0.5).filled(),
        )
    }))?;

    if !view.kde.is_empty() {
        chart.draw_series(LineSeries::new(
            view.kde.iter().copied(),
            HIST_COLOR.stroke_width(2),
        ))?;
    }

    Ok(())
}

fn draw_category_counts(
    area: &Area,
    view: &CategoryCountsView,
    palette: &[RGBColor],
) -> crate::Result<()> {
    if view.categories.is_empty() {
        return draw_no_data(area, &view.title);
    }

    let n = view.categories.len();
    let y_max = view.max_count().max(1) as f64 * 1.1;
    let labels: Vec<&str> = view.categories.iter().map(|c| c.label.as_str()).collect();
    let category_label = |x: &f64| category_at(&labels, x.round()).to_string();

    let mut chart = ChartBuilder::on(area)
        .caption(&view.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(category_axis(n), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&category_label)
        .y_desc("Customers")
        .axis_desc_style(("sans-serif", 14))
        .draw()?;

    chart.draw_series(view.categories.iter().enumerate().map(|(i, category)| {
        let x = i as f64;
        Rectangle::new(
            [(x - 0.4, 0.0), (x + 0.4, category.count as f64)],
            palette[i % palette.len()].filled(),
        )
    }))?;

    Ok(())
}

fn draw_scatter(area: &Area, view: &ScatterView) -> crate::Result<()> {
    if view.is_empty() {
        return draw_no_data(area, &view.title);
    }

    let (x_lo, x_hi) = padded_range(view.points.iter().map(|p| p.frequency));
    let (y_lo, y_hi) = padded_range(view.points.iter().map(|p| p.aov));

    let mut chart = ChartBuilder::on(area)
        .caption(&view.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_desc("Frequency")
        .y_desc("AOV")
        .axis_desc_style(("sans-serif", 14))
        .draw()?;

    for (idx, segment) in view.segments.iter().enumerate() {
        let color = segment_color(&view.segments, segment);
        let points: Vec<_> = view.points.iter().filter(|p| p.color_index == idx).collect();
        if points.is_empty() {
            continue;
        }

        chart
            .draw_series(points.iter().map(|p| {
                Circle::new(
                    (p.frequency, p.aov),
                    marker_radius(p.size),
                    color.mix(0.7).filled(),
                )
            }))?
            .label(segment.as_str())
            .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

fn draw_correlation(area: &Area, view: &CorrelationView) -> crate::Result<()> {
    if view.is_empty() {
        return draw_no_data(area, &view.title);
    }

    let k = view.labels.len();
    let labels: Vec<&str> = view.labels.iter().map(String::as_str).collect();
    let last = k as f64 - 1.0;
    let column_label = |x: &f64| category_at(&labels, x.round()).to_string();
    // row 0 is drawn at the top
    let row_label = |y: &f64| category_at(&labels, last - y.round()).to_string();

    let mut chart = ChartBuilder::on(area)
        .caption(&view.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(90)
        .build_cartesian_2d(category_axis(k), category_axis(k))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(k)
        .y_labels(k)
        .x_label_formatter(&column_label)
        .y_label_formatter(&row_label)
        .draw()?;

    let cells: Vec<(f64, f64, Option<f64>)> = view
        .values
        .iter()
        .enumerate()
        .flat_map(|(i, row)| {
            row.iter()
                .enumerate()
                .map(move |(j, value)| (j as f64, last - i as f64, *value))
        })
        .collect();

    chart.draw_series(cells.iter().map(|&(x, y, value)| {
        let color = value.map_or(UNDEFINED_CELL, coolwarm);
        Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], color.filled())
    }))?;

    let annotation = ("sans-serif", 16)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    chart.draw_series(cells.iter().map(|&(x, y, value)| {
        let text = value.map_or_else(|| "nan".to_string(), |r| format!("{:.2}", r));
        Text::new(text, (x, y), annotation.clone())
    }))?;

    Ok(())
}

fn draw_trend(area: &Area, view: &TrendView, segments: &[String]) -> crate::Result<()> {
    if view.trend.is_empty() {
        return draw_no_data(area, &view.title);
    }

    let days = |date: NaiveDate| (date - NaiveDate::default()).num_days() as f64;
    let all_points = view.trend.series.iter().flat_map(|s| s.points.iter());
    let (x_lo, x_hi) = padded_range(all_points.clone().map(|p| days(p.month_end)));
    let (y_lo, y_hi) = padded_range(all_points.map(|p| p.mean_clv));

    let month_label = |x: &f64| {
        TimeDelta::try_days(x.round() as i64)
            .and_then(|delta| NaiveDate::default().checked_add_signed(delta))
            .map(|date| date.format("%Y-%m").to_string())
            .unwrap_or_default()
    };
    let rotation = if view.label_rotation >= 90.0 {
        FontTransform::Rotate90
    } else {
        FontTransform::None
    };

    let mut chart = ChartBuilder::on(area)
        .caption(&view.title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(70)
        .y_label_area_size(70)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_label_formatter(&month_label)
        .x_label_style(("sans-serif", 13).into_font().transform(rotation))
        .x_desc("Month")
        .y_desc("Mean Predicted CLV")
        .axis_desc_style(("sans-serif", 14))
        .draw()?;

    for series in &view.trend.series {
        let color = segment_color(segments, &series.segment);
        let points: Vec<(f64, f64)> = series
            .points
            .iter()
            .map(|p| (days(p.month_end), p.mean_clv))
            .collect();

        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
            .label(series.segment.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
        chart.draw_series(points.iter().map(|&p| Circle::new(p, 4, color.filled())))?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

/// Palette color of a segment, keyed on its slot in the full sorted segment list
fn segment_color(segments: &[String], segment: &str) -> RGBColor {
    let slot = segments.iter().position(|s| s == segment).unwrap_or(0);
    SET2[slot % SET2.len()]
}

/// Axis range putting `n` categories on integer positions.
/// Asking the mesh for `n` labels over it yields exactly those positions.
fn category_axis(n: usize) -> Range<f64> {
    -0.5..(n as f64 - 0.5)
}

fn category_at<'a>(labels: &[&'a str], position: f64) -> &'a str {
    if position >= 0.0 && (position as usize) < labels.len() {
        labels[position as usize]
    } else {
        ""
    }
}

/// Circle radius in pixels for a marker area
fn marker_radius(size: f64) -> i32 {
    (size.sqrt() / 2.0).round().max(2.0) as i32
}

/// Axis range covering `values` with 5% padding on each side
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if lo == hi {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        return (lo - pad, hi + pad);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Diverging blue-white-red color for a correlation in [-1, 1]
fn coolwarm(value: f64) -> RGBColor {
    const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let t = value.clamp(-1.0, 1.0);
    let (from, to, w) = if t < 0.0 {
        (NEUTRAL, COLD, -t)
    } else {
        (NEUTRAL, WARM, t)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * w).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

/// Headline metrics block for the terminal
pub fn format_metrics(vm: &ViewModel) -> String {
    let selected: Vec<&str> = vm.selected_segments.labels().collect();
    let mut out = String::new();
    let _ = writeln!(out, "=== CLV Dashboard ===");
    let segments = if selected.is_empty() {
        "(none)".to_string()
    } else {
        selected.join(", ")
    };
    let _ = writeln!(out, "Segments: {}", segments);
    let _ = writeln!(out, "{}", vm.metrics);
    let tiers: Vec<String> = vm
        .tier_counts
        .categories
        .iter()
        .map(|c| format!("{}={}", c.label, c.count))
        .collect();
    let _ = writeln!(out, "Tiers: {}", tiers.join(" "));
    if vm.trend.trend.excluded_rows > 0 {
        let _ = writeln!(
            out,
            "Trend: {} rows without a calendar Recency were left out",
            vm.trend.trend.excluded_rows
        );
    }
    out
}

/// Raw table with aligned columns, one line per row
pub fn format_table(table: &TableView) -> String {
    let mut cells: Vec<Vec<String>> = Vec::with_capacity(table.rows.len() + 1);
    let mut header = vec![String::new()];
    header.extend(table.columns.iter().cloned());
    cells.push(header);

    for row in &table.rows {
        cells.push(vec![
            row.index.to_string(),
            row.recency.to_string(),
            row.frequency.to_string(),
            row.aov.to_string(),
            row.predicted_clv.to_string(),
            row.segment.clone(),
            row.clv_tier.to_string(),
        ]);
    }

    let widths: Vec<usize> = (0..cells[0].len())
        .map(|col| cells.iter().map(|r| r.get(col).map_or(0, |c| c.len())).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{:>width$}", cell, width = width))
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    }
    if table.rows.is_empty() {
        let _ = writeln!(out, "(0 rows)");
    }
    out
}
