use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::RoutineError;
use crate::models::{Category, Grade, WeeklyEntry, WeeklyTotal};

const LIFE_RHYTHM: [f64; 8] = [0.0, 3.0, 5.0, 10.0, 15.0, 25.0, 27.0, 30.0];
const MEDITATION: [f64; 8] = [0.0, 3.0, 6.0, 8.0, 10.0, 13.0, 14.0, 15.0];
const EXERCISE: [f64; 8] = [0.0, 2.0, 4.0, 7.0, 8.0, 9.0, 9.5, 10.0];
const KEYWORD: [f64; 8] = [0.0, 2.0, 4.0, 8.0, 10.0, 12.0, 14.0, 15.0];

const STUDY_HOURS_FULL: f64 = 84.0;

/// Highest threshold first; the first one the total reaches wins.
const GRADE_THRESHOLDS: [(f64, Grade); 6] = [
    (95.0, Grade::SS),
    (90.0, Grade::S),
    (85.0, Grade::A),
    (75.0, Grade::B),
    (65.0, Grade::C),
    (55.0, Grade::D),
];

pub fn validate_days(category: Category, days: i64) -> Result<(), RoutineError> {
    if !(0..=category.max_days()).contains(&days) {
        return Err(RoutineError::DaysOutOfRange {
            category: category.slug(),
            days,
            max: category.max_days(),
        });
    }
    Ok(())
}

pub fn calculate_score(category: Category, days: i64) -> Result<f64, RoutineError> {
    validate_days(category, days)?;

    let table = match category {
        Category::StudyTime => {
            let raw = days as f64 / STUDY_HOURS_FULL * category.weight();
            return Ok(round2(raw));
        }
        Category::LifeRhythm => &LIFE_RHYTHM,
        Category::Meditation => &MEDITATION,
        Category::Exercise => &EXERCISE,
        Category::Keyword => &KEYWORD,
    };

    Ok(table[days as usize])
}

pub fn grade_for_score(total: f64) -> Grade {
    GRADE_THRESHOLDS
        .iter()
        .find(|(threshold, _)| total >= *threshold)
        .map(|(_, grade)| *grade)
        .unwrap_or(Grade::Caution)
}

pub fn build_entry(
    week_start: NaiveDate,
    category: Category,
    days: i64,
) -> Result<WeeklyEntry, RoutineError> {
    let score = calculate_score(category, days)?;
    Ok(WeeklyEntry {
        week_start,
        category,
        days,
        score,
    })
}

/// Weekly totals ordered by week_start ascending.
pub fn summarize_by_week(entries: &[WeeklyEntry]) -> Vec<WeeklyTotal> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.week_start).or_insert(0.0) += entry.score;
    }

    totals
        .into_iter()
        .map(|(week_start, sum)| {
            let total = round2(sum);
            WeeklyTotal {
                week_start,
                total,
                grade: grade_for_score(total),
            }
        })
        .collect()
}

pub fn summarize_by_category(
    entries: &[WeeklyEntry],
) -> BTreeMap<Category, BTreeMap<NaiveDate, f64>> {
    let mut categories: BTreeMap<Category, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for entry in entries {
        *categories
            .entry(entry.category)
            .or_default()
            .entry(entry.week_start)
            .or_insert(0.0) += entry.score;
    }
    for weeks in categories.values_mut() {
        weeks.values_mut().for_each(|score| *score = round2(*score));
    }
    categories
}

pub fn total_for_week(entries: &[WeeklyEntry], week_start: NaiveDate) -> WeeklyTotal {
    let total = round2(
        entries
            .iter()
            .filter(|entry| entry.week_start == week_start)
            .map(|entry| entry.score)
            .sum(),
    );
    WeeklyTotal {
        week_start,
        total,
        grade: grade_for_score(total),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn tables_match_published_values() {
        let expected: [(Category, [f64; 8]); 4] = [
            (Category::LifeRhythm, [0.0, 3.0, 5.0, 10.0, 15.0, 25.0, 27.0, 30.0]),
            (Category::Meditation, [0.0, 3.0, 6.0, 8.0, 10.0, 13.0, 14.0, 15.0]),
            (Category::Exercise, [0.0, 2.0, 4.0, 7.0, 8.0, 9.0, 9.5, 10.0]),
            (Category::Keyword, [0.0, 2.0, 4.0, 8.0, 10.0, 12.0, 14.0, 15.0]),
        ];

        for (category, scores) in expected {
            for (days, score) in scores.iter().enumerate() {
                assert_eq!(calculate_score(category, days as i64), Ok(*score));
            }
        }
    }

    #[test]
    fn study_time_is_linear_and_rounded() {
        assert_eq!(calculate_score(Category::StudyTime, 0), Ok(0.0));
        assert_eq!(calculate_score(Category::StudyTime, 4), Ok(1.43));
        assert_eq!(calculate_score(Category::StudyTime, 42), Ok(15.0));
        assert_eq!(calculate_score(Category::StudyTime, 84), Ok(30.0));
    }

    #[test]
    fn out_of_range_days_are_rejected() {
        assert!(calculate_score(Category::Exercise, 8).is_err());
        assert!(calculate_score(Category::Exercise, -1).is_err());
        assert!(calculate_score(Category::StudyTime, 85).is_err());
        assert_eq!(
            validate_days(Category::Keyword, 9),
            Err(RoutineError::DaysOutOfRange {
                category: "keyword",
                days: 9,
                max: 7,
            })
        );
    }

    #[test]
    fn grades_follow_inclusive_thresholds() {
        assert_eq!(grade_for_score(100.0), Grade::SS);
        assert_eq!(grade_for_score(95.0), Grade::SS);
        assert_eq!(grade_for_score(94.99), Grade::S);
        assert_eq!(grade_for_score(90.0), Grade::S);
        assert_eq!(grade_for_score(85.0), Grade::A);
        assert_eq!(grade_for_score(75.0), Grade::B);
        assert_eq!(grade_for_score(65.0), Grade::C);
        assert_eq!(grade_for_score(63.4), Grade::D);
        assert_eq!(grade_for_score(55.0), Grade::D);
        assert_eq!(grade_for_score(54.9), Grade::Caution);
        assert_eq!(grade_for_score(0.0), Grade::Caution);
    }

    #[test]
    fn full_week_scenario_lands_in_d_grade() {
        let entries = vec![
            build_entry(monday(), Category::LifeRhythm, 6).unwrap(),
            build_entry(monday(), Category::Meditation, 5).unwrap(),
            build_entry(monday(), Category::StudyTime, 4).unwrap(),
            build_entry(monday(), Category::Exercise, 3).unwrap(),
            build_entry(monday(), Category::Keyword, 7).unwrap(),
        ];

        let totals = summarize_by_week(&entries);
        assert_eq!(totals.len(), 1);
        assert!((totals[0].total - 63.43).abs() < 1e-9);
        assert_eq!(totals[0].grade, Grade::D);
        assert_eq!(totals[0].grade.label(), "D grade (top 30%)");
    }

    #[test]
    fn weekly_totals_keep_two_decimals() {
        let entries = vec![
            build_entry(monday(), Category::StudyTime, 1).unwrap(),
            build_entry(monday(), Category::Exercise, 1).unwrap(),
            build_entry(monday(), Category::Keyword, 1).unwrap(),
        ];

        assert_eq!(summarize_by_week(&entries)[0].total, 4.36);
        assert_eq!(total_for_week(&entries, monday()).total, 4.36);
    }

    #[test]
    fn weeks_are_ordered_and_split_by_category() {
        let later = NaiveDate::from_ymd_opt(2024, 1, 22).unwrap();
        let entries = vec![
            build_entry(later, Category::Exercise, 7).unwrap(),
            build_entry(monday(), Category::Exercise, 1).unwrap(),
            build_entry(monday(), Category::Keyword, 2).unwrap(),
        ];

        let totals = summarize_by_week(&entries);
        assert_eq!(totals[0].week_start, monday());
        assert!((totals[0].total - 6.0).abs() < 1e-9);
        assert_eq!(totals[1].week_start, later);

        let by_category = summarize_by_category(&entries);
        assert_eq!(by_category[&Category::Exercise].len(), 2);
        assert_eq!(by_category[&Category::Keyword][&monday()], 4.0);
        assert!(!by_category.contains_key(&Category::StudyTime));

        assert!((total_for_week(&entries, later).total - 10.0).abs() < 1e-9);
    }
}
