use thiserror::Error;

/// Failures caught before anything touches the data file.
#[derive(Debug, Error, PartialEq)]
pub enum RoutineError {
    #[error("unknown category: {0} (expected life-rhythm, meditation, study, exercise or keyword)")]
    UnknownCategory(String),
    #[error("days for {category} must be between 0 and {max}, got {days}")]
    DaysOutOfRange {
        category: &'static str,
        days: i64,
        max: i64,
    },
    #[error("invalid date {0:?}: expected YYYY-MM-DD (e.g. 2024-01-15)")]
    InvalidDate(String),
    #[error("no recorded weeks to plot")]
    NoData,
}
