use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{ArgGroup, Parser, Subcommand};
use tracing::info;

mod chart;
mod error;
mod logging;
mod models;
mod report;
mod scoring;
mod store;

use chart::PlotMode;
use models::{week_label, week_start_for_day, Category, DATE_FMT};

#[derive(Parser)]
#[command(name = "routine-tracker")]
#[command(
    about = "Record weekly routine day-counts, score them out of 100 and track the trend",
    long_about = None
)]
struct Cli {
    /// CSV data file
    #[arg(
        long,
        global = true,
        env = "ROUTINE_TRACKER_DATA",
        default_value = "data/routines.csv"
    )]
    data: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data file with its header if it does not exist
    Init,
    /// Record one category for a week
    Add {
        /// Monday of the week (YYYY-MM-DD); other days snap to their Monday
        #[arg(value_parser = models::parse_date)]
        week_start: NaiveDate,
        /// life-rhythm, meditation, study, exercise or keyword
        category: Category,
        /// Days performed (0-7), or study hours (0-84)
        #[arg(allow_negative_numbers = true)]
        days: i64,
    },
    /// Record all five categories for a week, replacing what was there.
    /// Every category flag is required.
    Week {
        #[arg(value_parser = models::parse_date)]
        week_start: NaiveDate,
        #[arg(long, allow_negative_numbers = true)]
        life_rhythm: i64,
        #[arg(long, allow_negative_numbers = true)]
        meditation: i64,
        #[arg(long, allow_negative_numbers = true)]
        study: i64,
        #[arg(long, allow_negative_numbers = true)]
        exercise: i64,
        #[arg(long, allow_negative_numbers = true)]
        keyword: i64,
    },
    /// Remove every entry of a week
    DeleteWeek {
        #[arg(value_parser = models::parse_date)]
        week_start: NaiveDate,
    },
    /// Show stored entries in file order
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show weekly totals and grades
    Summary {
        #[arg(long)]
        json: bool,
    },
    /// Draw the score trend chart
    #[command(group(
        ArgGroup::new("lines")
            .args(["per_category", "total_only"])
            .multiple(false)
    ))]
    Plot {
        #[arg(long)]
        per_category: bool,
        #[arg(long)]
        total_only: bool,
        #[arg(long, default_value = "plots/score_trend.png")]
        output: PathBuf,
    },
    /// Generate an HTML report with totals and the trend chart
    Report {
        #[arg(long, default_value = "reports/weekly_report.html")]
        output: PathBuf,
        #[arg(long, default_value = "plots/score_trend.png")]
        plot: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging();
    let data = cli.data.as_path();

    match cli.command {
        Commands::Init => {
            if store::ensure_csv(data)? {
                println!("Initialized {}.", data.display());
            } else {
                println!("{} already exists.", data.display());
            }
        }
        Commands::Add {
            week_start,
            category,
            days,
        } => {
            let week_start = snap_to_monday(week_start);
            let (entry, total) = store::add_entry(data, week_start, category, days)?;
            println!(
                "Added {} {} {} days -> {} points",
                entry.week_start.format(DATE_FMT),
                entry.category,
                entry.days,
                entry.score
            );
            println!(
                "Week total: {} {:.1} points {}",
                week_label(total.week_start),
                total.total,
                total.grade
            );
        }
        Commands::Week {
            week_start,
            life_rhythm,
            meditation,
            study,
            exercise,
            keyword,
        } => {
            let week_start = snap_to_monday(week_start);
            let values = [
                (Category::LifeRhythm, life_rhythm),
                (Category::Meditation, meditation),
                (Category::StudyTime, study),
                (Category::Exercise, exercise),
                (Category::Keyword, keyword),
            ];
            let total = store::upsert_week(data, week_start, &values)?;
            println!(
                "Saved week {} {:.1} points {}",
                week_label(total.week_start),
                total.total,
                total.grade
            );
        }
        Commands::DeleteWeek { week_start } => {
            let week_start = snap_to_monday(week_start);
            let removed = store::delete_week(data, week_start)?;
            println!("Removed {removed} entries for {}.", week_label(week_start));
        }
        Commands::List { json } => {
            let entries = store::load_entries(data)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No routine scores recorded.");
            } else {
                for entry in entries.iter() {
                    println!(
                        "{}\t{}\t{} days\t{} points",
                        entry.week_start.format(DATE_FMT),
                        entry.category,
                        entry.days,
                        entry.score
                    );
                }
            }
        }
        Commands::Summary { json } => {
            let totals = store::summary(data)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&totals)?);
            } else if totals.is_empty() {
                println!("No routine scores recorded.");
            } else {
                for total in totals.iter() {
                    println!(
                        "{}\t{:.1} points\t{}",
                        week_label(total.week_start),
                        total.total,
                        total.grade
                    );
                }
            }
        }
        Commands::Plot {
            per_category,
            total_only,
            output,
        } => {
            let mode = PlotMode::from_flags(per_category, total_only);
            let entries = store::load_entries(data)?;
            let chart = chart::write_chart(&entries, &output, mode)?;
            print_chart_notice(&chart.path, chart.fell_back);
        }
        Commands::Report { output, plot } => {
            let entries = store::load_entries(data)?;
            let Some(written) = report::write_report(&entries, &output, &plot)
                .with_context(|| format!("failed to build report from {}", data.display()))?
            else {
                println!("No routine scores recorded.");
                return Ok(());
            };
            print_chart_notice(&written.chart.path, written.chart.fell_back);
            println!("Report written to {}.", written.report.display());
        }
    }

    Ok(())
}

fn snap_to_monday(day: NaiveDate) -> NaiveDate {
    let monday = week_start_for_day(day);
    if monday != day {
        info!(
            requested = %day,
            week_start = %monday,
            "moved date to the Monday of its week"
        );
    }
    monday
}

fn print_chart_notice(path: &Path, fell_back: bool) {
    if fell_back {
        println!("No raster chart backend available; saved SVG to {}.", path.display());
    } else {
        println!("Chart written to {}.", path.display());
    }
}
