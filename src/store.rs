use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::models::{Category, WeeklyEntry, WeeklyTotal, DATE_FMT};
use crate::scoring;

pub const HEADER: [&str; 4] = ["week_start", "category", "days", "score"];

#[derive(serde::Deserialize)]
struct CsvRow {
    week_start: NaiveDate,
    category: String,
    days: i64,
    score: f64,
}

#[derive(serde::Serialize)]
struct CsvRecord<'a> {
    week_start: String,
    category: &'a str,
    days: i64,
    score: f64,
}

/// Creates the data file with just a header. Returns `false` when it already existed.
pub fn ensure_csv(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        debug!(path = %path.display(), "data file already present");
        return Ok(false);
    }

    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(HEADER)?;
    writer.flush()?;
    info!(path = %path.display(), "initialized data file");
    Ok(true)
}

/// Reads every row in file order. A missing file reads as empty.
pub fn load_entries(path: &Path) -> anyhow::Result<Vec<WeeklyEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut entries = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        // header is line 1
        let line = index + 2;
        let row = result.with_context(|| format!("{}:{line}: malformed row", path.display()))?;
        let Some(category) = Category::from_label(row.category.trim()) else {
            warn!(line, category = %row.category, "skipping row with unknown category");
            continue;
        };

        entries.push(WeeklyEntry {
            week_start: row.week_start,
            category,
            days: row.days,
            score: row.score,
        });
    }

    Ok(entries)
}

/// Rewrites the whole file, header first.
pub fn save_entries(path: &Path, entries: &[WeeklyEntry]) -> anyhow::Result<()> {
    create_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    writer.write_record(HEADER)?;
    for entry in entries {
        writer.serialize(CsvRecord {
            week_start: entry.week_start.format(DATE_FMT).to_string(),
            category: entry.category.label(),
            days: entry.days,
            score: entry.score,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Scores and stores one category for a week, replacing any earlier row for
/// the same pair. The replacement goes to the end of the file.
pub fn add_entry(
    path: &Path,
    week_start: NaiveDate,
    category: Category,
    days: i64,
) -> anyhow::Result<(WeeklyEntry, WeeklyTotal)> {
    let entry = scoring::build_entry(week_start, category, days)?;

    let mut entries = load_entries(path)?;
    let before = entries.len();
    entries.retain(|existing| {
        !(existing.week_start == week_start && existing.category == category)
    });
    if entries.len() != before {
        info!(week = %week_start, category = category.slug(), "replacing existing entry");
    }
    entries.push(entry.clone());
    save_entries(path, &entries)?;

    Ok((entry, scoring::total_for_week(&entries, week_start)))
}

/// Replaces every row of `week_start` with the given category values.
pub fn upsert_week(
    path: &Path,
    week_start: NaiveDate,
    values: &[(Category, i64)],
) -> anyhow::Result<WeeklyTotal> {
    let new_entries = values
        .iter()
        .map(|(category, days)| scoring::build_entry(week_start, *category, *days))
        .collect::<Result<Vec<_>, _>>()?;

    let mut entries = load_entries(path)?;
    entries.retain(|existing| existing.week_start != week_start);
    entries.extend(new_entries);
    save_entries(path, &entries)?;

    Ok(scoring::total_for_week(&entries, week_start))
}

/// Returns how many rows were dropped.
pub fn delete_week(path: &Path, week_start: NaiveDate) -> anyhow::Result<usize> {
    let mut entries = load_entries(path)?;
    let before = entries.len();
    entries.retain(|existing| existing.week_start != week_start);
    let removed = before - entries.len();

    if removed > 0 {
        save_entries(path, &entries)?;
    }
    info!(week = %week_start, removed, "deleted week");
    Ok(removed)
}

pub fn summary(path: &Path) -> anyhow::Result<Vec<WeeklyTotal>> {
    Ok(scoring::summarize_by_week(&load_entries(path)?))
}

fn create_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(())
}
