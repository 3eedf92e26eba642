use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Serialize, Serializer};

use crate::error::RoutineError;

pub const DATE_FMT: &str = "%Y-%m-%d";

/// The five tracked routines, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    LifeRhythm,
    Meditation,
    StudyTime,
    Exercise,
    Keyword,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::LifeRhythm,
        Category::Meditation,
        Category::StudyTime,
        Category::Exercise,
        Category::Keyword,
    ];

    /// Text stored in the `category` column of the data file.
    pub fn label(self) -> &'static str {
        match self {
            Category::LifeRhythm => "생활리듬",
            Category::Meditation => "명상/일기쓰기",
            Category::StudyTime => "공부시간",
            Category::Exercise => "운동",
            Category::Keyword => "핵심키워드",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Category::LifeRhythm => "life-rhythm",
            Category::Meditation => "meditation",
            Category::StudyTime => "study",
            Category::Exercise => "exercise",
            Category::Keyword => "keyword",
        }
    }

    /// Largest accepted day-count. Study time is logged in hours over the week.
    pub fn max_days(self) -> i64 {
        match self {
            Category::StudyTime => 84,
            _ => 7,
        }
    }

    pub fn weight(self) -> f64 {
        match self {
            Category::LifeRhythm | Category::StudyTime => 30.0,
            Category::Meditation | Category::Keyword => 15.0,
            Category::Exercise => 10.0,
        }
    }

    pub fn from_label(label: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl FromStr for Category {
    type Err = RoutineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Some(category) = Category::from_label(trimmed) {
            return Ok(category);
        }

        match trimmed.to_ascii_lowercase().replace('_', "-").as_str() {
            "life-rhythm" | "liferhythm" => Ok(Category::LifeRhythm),
            "meditation" | "journaling" => Ok(Category::Meditation),
            "study" | "study-time" => Ok(Category::StudyTime),
            "exercise" => Ok(Category::Exercise),
            "keyword" | "keywords" => Ok(Category::Keyword),
            _ => Err(RoutineError::UnknownCategory(value.to_string())),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    SS,
    S,
    A,
    B,
    C,
    D,
    Caution,
}

impl Grade {
    pub fn label(self) -> &'static str {
        match self {
            Grade::SS => "SS grade (top 0.1%)",
            Grade::S => "S grade (top 1%)",
            Grade::A => "A grade (top 5%)",
            Grade::B => "B grade (top 10%)",
            Grade::C => "C grade (top 20%)",
            Grade::D => "D grade (top 30%)",
            Grade::Caution => "Caution",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyEntry {
    pub week_start: NaiveDate,
    pub category: Category,
    pub days: i64,
    pub score: f64,
}

/// Derived from stored entries; never written to disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyTotal {
    pub week_start: NaiveDate,
    pub total: f64,
    pub grade: Grade,
}

pub fn parse_date(value: &str) -> Result<NaiveDate, RoutineError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FMT)
        .map_err(|_| RoutineError::InvalidDate(value.to_string()))
}

/// Monday of the ISO week containing `day`.
pub fn week_start_for_day(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

pub fn week_label(week_start: NaiveDate) -> String {
    let iso = week_start.iso_week();
    format!(
        "{} (ISO {}-W{:02})",
        week_start.format(DATE_FMT),
        iso.year(),
        iso.week()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_and_slugs() {
        assert_eq!("운동".parse::<Category>(), Ok(Category::Exercise));
        assert_eq!("Life-Rhythm".parse::<Category>(), Ok(Category::LifeRhythm));
        assert_eq!("study_time".parse::<Category>(), Ok(Category::StudyTime));
        assert_eq!("journaling".parse::<Category>(), Ok(Category::Meditation));
        assert_eq!(
            "sleep".parse::<Category>(),
            Err(RoutineError::UnknownCategory("sleep".to_string()))
        );
    }

    #[test]
    fn week_start_snaps_to_monday() {
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 21).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(week_start_for_day(sunday), monday);
        assert_eq!(week_start_for_day(monday), monday);
    }

    #[test]
    fn week_label_includes_iso_week() {
        let monday = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(week_label(monday), "2024-01-15 (ISO 2024-W03)");

        let year_boundary = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(week_label(year_boundary), "2024-12-30 (ISO 2025-W01)");
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_date("2024-1-15x").is_err());
        assert!(parse_date("15/01/2024").is_err());
        assert_eq!(
            parse_date("2024-01-15"),
            Ok(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
    }
}
