//! Weekly training streaks
//!
//! A week (Monday to Sunday) is active when it has at least one session.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::calendar::week_start;
use super::types::StreakResult;

/// Current, longest and total active weeks for a list of session dates.
///
/// The current streak may start last week, so a user who has not trained yet
/// on Monday morning keeps last week's streak.
pub fn calculate_streak(session_dates: &[NaiveDate], today: NaiveDate) -> StreakResult {
    let weeks: BTreeSet<NaiveDate> = session_dates.iter().map(|d| week_start(*d)).collect();
    if weeks.is_empty() {
        return StreakResult::default();
    }

    let this_week = week_start(today);
    let last_week = this_week - Duration::weeks(1);

    let current_streak = [this_week, last_week]
        .into_iter()
        .find(|w| weeks.contains(w))
        .map(|start| {
            let mut count = 0;
            let mut cursor = start;
            while weeks.contains(&cursor) {
                count += 1;
                cursor -= Duration::weeks(1);
            }
            count
        })
        .unwrap_or(0);

    let mut longest_streak = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for week in &weeks {
        run = match previous {
            Some(p) if *week - p == Duration::weeks(1) => run + 1,
            _ => 1,
        };
        longest_streak = longest_streak.max(run);
        previous = Some(*week);
    }

    StreakResult {
        current_streak,
        longest_streak,
        total_weeks_active: weeks.len() as u32,
    }
}

/// Streak lengths worth celebrating
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakMilestone {
    FourWeeks,
    EightWeeks,
    TwelveWeeks,
    HalfYear,
    FullYear,
}

impl StreakMilestone {
    /// Lowest tier first
    pub fn all() -> &'static [StreakMilestone] {
        &[
            StreakMilestone::FourWeeks,
            StreakMilestone::EightWeeks,
            StreakMilestone::TwelveWeeks,
            StreakMilestone::HalfYear,
            StreakMilestone::FullYear,
        ]
    }

    pub fn weeks(&self) -> u32 {
        match self {
            StreakMilestone::FourWeeks => 4,
            StreakMilestone::EightWeeks => 8,
            StreakMilestone::TwelveWeeks => 12,
            StreakMilestone::HalfYear => 26,
            StreakMilestone::FullYear => 52,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            StreakMilestone::FourWeeks => "streak_4_weeks",
            StreakMilestone::EightWeeks => "streak_8_weeks",
            StreakMilestone::TwelveWeeks => "streak_12_weeks",
            StreakMilestone::HalfYear => "streak_26_weeks",
            StreakMilestone::FullYear => "streak_52_weeks",
        }
    }
}

/// Highest milestone reached, if any
pub fn milestone_for(streak: u32) -> Option<StreakMilestone> {
    StreakMilestone::all()
        .iter()
        .rev()
        .find(|m| streak >= m.weeks())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(calculate_streak(&[], date(2026, 3, 4)), StreakResult::default());
    }

    #[test]
    fn test_streak_across_year_boundary() {
        let dates = vec![
            date(2026, 12, 14),
            date(2026, 12, 21),
            date(2026, 12, 28),
            date(2027, 1, 4),
            date(2027, 1, 11),
        ];
        let result = calculate_streak(&dates, date(2027, 1, 13));
        assert_eq!(result.current_streak, 5);
        assert_eq!(result.longest_streak, 5);
        assert_eq!(result.total_weeks_active, 5);
    }

    #[test]
    fn test_monday_morning_keeps_last_week() {
        // Sessions in the three weeks before Monday 2026-03-09, none yet today
        let dates = vec![date(2026, 2, 18), date(2026, 2, 25), date(2026, 3, 6)];
        let result = calculate_streak(&dates, date(2026, 3, 9));
        assert_eq!(result.current_streak, 3);
    }

    #[test]
    fn test_gap_resets_current_streak() {
        // Last session two weeks ago
        let dates = vec![date(2026, 2, 16), date(2026, 2, 23)];
        let result = calculate_streak(&dates, date(2026, 3, 11));
        assert_eq!(result.current_streak, 0);
        assert_eq!(result.longest_streak, 2);
    }

    #[test]
    fn test_multiple_sessions_same_week_count_once() {
        let dates = vec![date(2026, 3, 2), date(2026, 3, 3), date(2026, 3, 8)];
        let result = calculate_streak(&dates, date(2026, 3, 8));
        assert_eq!(result.current_streak, 1);
        assert_eq!(result.total_weeks_active, 1);
    }

    #[test]
    fn test_longest_run_in_the_past() {
        let dates = vec![
            date(2026, 1, 5),
            date(2026, 1, 12),
            date(2026, 1, 19),
            date(2026, 1, 26),
            // gap
            date(2026, 2, 16),
            date(2026, 2, 23),
        ];
        let result = calculate_streak(&dates, date(2026, 2, 24));
        assert_eq!(result.current_streak, 2);
        assert_eq!(result.longest_streak, 4);
        assert_eq!(result.total_weeks_active, 6);
    }

    #[test]
    fn test_unordered_input() {
        let dates = vec![date(2026, 3, 4), date(2026, 2, 18), date(2026, 2, 25)];
        let result = calculate_streak(&dates, date(2026, 3, 5));
        assert_eq!(result.current_streak, 3);
    }

    #[test]
    fn test_milestones() {
        assert_eq!(milestone_for(0), None);
        assert_eq!(milestone_for(3), None);
        assert_eq!(milestone_for(4), Some(StreakMilestone::FourWeeks));
        assert_eq!(milestone_for(11), Some(StreakMilestone::EightWeeks));
        assert_eq!(milestone_for(30), Some(StreakMilestone::HalfYear));
        assert_eq!(milestone_for(104), Some(StreakMilestone::FullYear));
        assert_eq!(StreakMilestone::TwelveWeeks.key(), "streak_12_weeks");
    }
}
