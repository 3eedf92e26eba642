use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::RoutineError;
use crate::models::WeeklyEntry;
use crate::scoring;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 400.0;
const PADDING: f64 = 50.0;
const TITLE: &str = "Routine score trend";
const TOTAL_COLOR: &str = "#1f77b4";
const PALETTE: [&str; 5] = ["#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlotMode {
    #[default]
    Combined,
    PerCategory,
    TotalOnly,
}

impl PlotMode {
    /// Maps the CLI's mutually exclusive line flags onto a mode.
    pub fn from_flags(per_category: bool, total_only: bool) -> PlotMode {
        match (per_category, total_only) {
            (true, _) => PlotMode::PerCategory,
            (false, true) => PlotMode::TotalOnly,
            (false, false) => PlotMode::Combined,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub color: &'static str,
    pub points: BTreeMap<NaiveDate, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartOutput {
    pub path: PathBuf,
    /// True when a raster path was requested and SVG was written instead.
    pub fell_back: bool,
}

pub fn build_series(
    entries: &[WeeklyEntry],
    mode: PlotMode,
) -> Result<Vec<Series>, RoutineError> {
    let totals = scoring::summarize_by_week(entries);
    if totals.is_empty() {
        return Err(RoutineError::NoData);
    }

    let mut series = Vec::new();
    if mode != PlotMode::PerCategory {
        series.push(Series {
            label: "Total".to_string(),
            color: TOTAL_COLOR,
            points: totals.iter().map(|t| (t.week_start, t.total)).collect(),
        });
    }

    if mode != PlotMode::TotalOnly {
        for ((category, points), color) in scoring::summarize_by_category(entries)
            .into_iter()
            .zip(PALETTE)
        {
            series.push(Series {
                label: category.label().to_string(),
                color,
                points,
            });
        }
    }

    Ok(series)
}

pub fn render_svg(series: &[Series]) -> String {
    let dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let x_step = (WIDTH - 2.0 * PADDING) / (dates.len().saturating_sub(1).max(1)) as f64;
    let x_pos = |index: usize| PADDING + index as f64 * x_step;
    let y_pos = |score: f64| HEIGHT - PADDING - (score / 100.0) * (HEIGHT - 2.0 * PADDING);

    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}">"#
    );
    let _ = writeln!(out, r#"  <rect width="100%" height="100%" fill="white" />"#);
    let _ = writeln!(
        out,
        r#"  <text x="{:.1}" y="20" text-anchor="middle" font-size="14">{TITLE}</text>"#,
        WIDTH / 2.0
    );
    let _ = writeln!(
        out,
        r##"  <line x1="{PADDING}" y1="{PADDING}" x2="{PADDING}" y2="{}" stroke="#ccc" />"##,
        HEIGHT - PADDING
    );
    let _ = writeln!(
        out,
        r##"  <line x1="{PADDING}" y1="{0}" x2="{1}" y2="{0}" stroke="#ccc" />"##,
        HEIGHT - PADDING,
        WIDTH - PADDING
    );

    for score in (0..=100).step_by(20) {
        let _ = writeln!(
            out,
            r#"  <text x="{}" y="{:.1}" font-size="10" text-anchor="end">{score}</text>"#,
            PADDING - 10.0,
            y_pos(score as f64)
        );
    }

    for (index, day) in dates.iter().enumerate() {
        let _ = writeln!(
            out,
            r#"  <text x="{:.1}" y="{}" font-size="10" text-anchor="middle">{}</text>"#,
            x_pos(index),
            HEIGHT - PADDING + 20.0,
            day.format("%m-%d")
        );
    }

    let mut legend = Vec::new();
    for line in series {
        let path: Vec<String> = dates
            .iter()
            .enumerate()
            .filter_map(|(index, day)| {
                line.points
                    .get(day)
                    .map(|score| (x_pos(index), y_pos(*score)))
            })
            .enumerate()
            .map(|(n, (x, y))| format!("{} {x:.1} {y:.1}", if n == 0 { "M" } else { "L" }))
            .collect();
        if path.is_empty() {
            continue;
        }
        let _ = writeln!(
            out,
            r#"  <path d="{}" fill="none" stroke="{}" stroke-width="2" />"#,
            path.join(" "),
            line.color
        );
        legend.push((line.label.as_str(), line.color));
    }

    for (index, (label, color)) in legend.into_iter().enumerate() {
        let x = PADDING + index as f64 * 120.0;
        let y = PADDING / 2.0;
        let _ = write!(
            out,
            r#"  <rect x="{x}" y="{y}" width="10" height="10" fill="{color}" />"#
        );
        let _ = writeln!(
            out,
            r#"<text x="{}" y="{}" font-size="10">{label}</text>"#,
            x + 14.0,
            y + 9.0
        );
    }

    let _ = writeln!(out, "</svg>");
    out
}

/// Writes the trend chart. Only the SVG backend is built in, so any other
/// requested extension falls back to an `.svg` file beside it.
pub fn write_chart(
    entries: &[WeeklyEntry],
    output: &Path,
    mode: PlotMode,
) -> anyhow::Result<ChartOutput> {
    let series = build_series(entries, mode)?;

    let is_svg = output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
    let path = if is_svg {
        output.to_path_buf()
    } else {
        warn!(
            requested = %output.display(),
            "no raster chart backend available, writing SVG"
        );
        output.with_extension("svg")
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::write(&path, render_svg(&series))
        .with_context(|| format!("failed to write chart {}", path.display()))?;
    info!(path = %path.display(), series = series.len(), "chart written");

    Ok(ChartOutput {
        path,
        fell_back: !is_svg,
    })
}
