use std::fmt::Write;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::chart::{self, ChartOutput, PlotMode};
use crate::models::{week_label, WeeklyEntry, WeeklyTotal};
use crate::scoring;

const STYLE: &str = r#"    body { font-family: sans-serif; margin: 24px; }
    .tabs { display: flex; gap: 8px; margin-bottom: 16px; }
    .tab-button { padding: 8px 12px; border: 1px solid #ccc; cursor: pointer; }
    .tab-button.active { background: #f0f0f0; font-weight: bold; }
    .tab-content { display: none; }
    .tab-content.active { display: block; }
    table { border-collapse: collapse; width: 100%; }
    th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }"#;

const SCRIPT: &str = r#"    function showTab(id) {
      document.querySelectorAll('.tab-content').forEach(el => el.classList.remove('active'));
      document.querySelectorAll('.tab-button').forEach(el => el.classList.remove('active'));
      document.getElementById(id).classList.add('active');
      document.querySelector(`[data-tab="${id}"]`).classList.add('active');
    }
    window.addEventListener('DOMContentLoaded', () => showTab('summary'));"#;

#[derive(Debug)]
pub struct ReportOutput {
    pub report: PathBuf,
    pub chart: ChartOutput,
}

pub fn build_report(totals: &[WeeklyTotal], chart_src: &str, fell_back: bool) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "<!doctype html>");
    let _ = writeln!(output, r#"<html lang="en">"#);
    let _ = writeln!(output, "<head>");
    let _ = writeln!(output, r#"  <meta charset="utf-8" />"#);
    let _ = writeln!(output, "  <title>Weekly Routine Report</title>");
    let _ = writeln!(output, "  <style>\n{STYLE}\n  </style>");
    let _ = writeln!(output, "  <script>\n{SCRIPT}\n  </script>");
    let _ = writeln!(output, "</head>");
    let _ = writeln!(output, "<body>");
    let _ = writeln!(output, "  <h1>Weekly Routine Report</h1>");
    let _ = writeln!(output, r#"  <div class="tabs">"#);
    let _ = writeln!(
        output,
        r#"    <button class="tab-button" data-tab="summary" onclick="showTab('summary')">Totals &amp; grades</button>"#
    );
    let _ = writeln!(
        output,
        r#"    <button class="tab-button" data-tab="trend" onclick="showTab('trend')">Trend</button>"#
    );
    let _ = writeln!(output, "  </div>");

    let _ = writeln!(output, r#"  <div id="summary" class="tab-content">"#);
    let _ = writeln!(output, "    <h2>Weekly totals and grades</h2>");
    let _ = writeln!(output, "    <table>");
    let _ = writeln!(
        output,
        "      <thead><tr><th>Week</th><th>Total</th><th>Grade</th></tr></thead>"
    );
    let _ = writeln!(output, "      <tbody>");
    for total in totals {
        let _ = writeln!(
            output,
            "        <tr><td>{}</td><td>{:.1}</td><td>{}</td></tr>",
            week_label(total.week_start),
            total.total,
            total.grade
        );
    }
    let _ = writeln!(output, "      </tbody>");
    let _ = writeln!(output, "    </table>");
    let _ = writeln!(output, "  </div>");

    let _ = writeln!(output, r#"  <div id="trend" class="tab-content">"#);
    let _ = writeln!(output, "    <h2>Trend</h2>");
    if fell_back {
        let _ = writeln!(
            output,
            "    <p>No raster chart backend is available; the chart is an SVG.</p>"
        );
    }
    let _ = writeln!(
        output,
        r#"    <img src="{}" alt="Routine score trend chart" style="max-width: 100%;" />"#,
        html_escape(chart_src)
    );
    let _ = writeln!(output, "  </div>");
    let _ = writeln!(output, "</body>");
    let _ = writeln!(output, "</html>");

    output
}

/// Renders the full chart and the HTML page. `None` when there is no history.
pub fn write_report(
    entries: &[WeeklyEntry],
    output: &Path,
    plot: &Path,
) -> anyhow::Result<Option<ReportOutput>> {
    let totals = scoring::summarize_by_week(entries);
    if totals.is_empty() {
        return Ok(None);
    }

    let chart = chart::write_chart(entries, plot, PlotMode::Combined)?;

    let report_dir = output.parent().unwrap_or(Path::new(""));
    if !report_dir.as_os_str().is_empty() {
        std::fs::create_dir_all(report_dir)
            .with_context(|| format!("failed to create directory {}", report_dir.display()))?;
    }

    let chart_src = relative_path(&chart.path, report_dir);
    let html = build_report(&totals, &chart_src, chart.fell_back);
    std::fs::write(output, html)
        .with_context(|| format!("failed to write report {}", output.display()))?;
    info!(path = %output.display(), weeks = totals.len(), "report written");

    Ok(Some(ReportOutput {
        report: output.to_path_buf(),
        chart,
    }))
}

/// `target` expressed relative to `base`, with forward slashes. Both paths are
/// resolved against the current directory first so mixed relative/absolute
/// inputs still line up.
pub fn relative_path(target: &Path, base: &Path) -> String {
    let cwd = std::env::current_dir().unwrap_or_default();
    let target = normalize(&cwd.join(target));
    let base = normalize(&cwd.join(base));

    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();
    let shared = target_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = std::iter::repeat("..".to_string())
        .take(base_parts.len() - shared)
        .collect();
    parts.extend(
        target_parts[shared..]
            .iter()
            .map(|part| part.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn week_entries() -> Vec<WeeklyEntry> {
        let monday = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        [
            (Category::LifeRhythm, 6),
            (Category::Meditation, 5),
            (Category::StudyTime, 4),
            (Category::Exercise, 3),
            (Category::Keyword, 7),
        ]
        .into_iter()
        .map(|(category, days)| scoring::build_entry(monday, category, days).unwrap())
        .collect()
    }

    #[test]
    fn relative_paths_cross_directories() {
        assert_eq!(
            relative_path(Path::new("/tmp/a/plots/trend.svg"), Path::new("/tmp/a/reports")),
            "../plots/trend.svg"
        );
        assert_eq!(
            relative_path(Path::new("/tmp/a/trend.svg"), Path::new("/tmp/a")),
            "trend.svg"
        );
        assert_eq!(
            relative_path(Path::new("/tmp/a/./b/../trend.svg"), Path::new("/tmp/a/reports")),
            "../trend.svg"
        );
    }

    #[test]
    fn report_lists_weeks_and_links_chart() {
        let totals = scoring::summarize_by_week(&week_entries());
        let html = build_report(&totals, "../plots/score_trend.svg", true);

        assert!(html.contains(
            "<td>2024-01-15 (ISO 2024-W03)</td><td>63.4</td><td>D grade (top 30%)</td>"
        ));
        assert!(html.contains(r#"<img src="../plots/score_trend.svg""#));
        assert!(html.contains("No raster chart backend"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn writes_report_and_chart_to_disk() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let output = dir.path().join("reports").join("weekly_report.html");
        let plot = dir.path().join("plots").join("score_trend.png");

        let written = write_report(&week_entries(), &output, &plot)?.expect("history present");
        assert_eq!(written.report, output);
        assert!(written.chart.fell_back);
        assert!(written.chart.path.exists());

        let html = std::fs::read_to_string(&output)?;
        assert!(html.contains(r#"src="../plots/score_trend.svg""#));
        Ok(())
    }

    #[test]
    fn empty_history_writes_nothing() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let output = dir.path().join("report.html");
        assert!(write_report(&[], &output, &dir.path().join("plot.png"))?.is_none());
        assert!(!output.exists());
        Ok(())
    }
}
