//! Program-day rotation and duration estimates

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rest assumed when a planned exercise has none
const DEFAULT_REST_SECONDS: u32 = 90;
/// Time to perform one set
const SET_WORK_SECONDS: u32 = 40;
const ROUND_TO_MINUTES: f64 = 5.0;

/// A past session tagged with the program day it followed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySession {
    pub program_day_id: Option<String>,
    pub started_at: DateTime<Utc>,
}

/// Planned exercise within a program day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedExercise {
    pub exercise_id: String,
    pub sets_target: u32,
    pub reps_target: Option<u32>,
    pub rest_seconds: Option<u32>,
}

/// Index of the day to do next. Cycles back to the first day after the last.
pub fn next_day_index<S: AsRef<str>>(day_ids: &[S], last_completed: Option<&str>) -> usize {
    let Some(last) = last_completed else {
        return 0;
    };
    match day_ids.iter().position(|id| id.as_ref() == last) {
        Some(idx) => (idx + 1) % day_ids.len(),
        None => 0,
    }
}

/// Most recent start per known program day. Sessions for unknown days are dropped.
pub fn build_day_completions<S: AsRef<str>>(
    sessions: &[DaySession],
    day_ids: &[S],
) -> HashMap<String, DateTime<Utc>> {
    let mut completions: HashMap<String, DateTime<Utc>> = HashMap::new();

    for session in sessions {
        let Some(day) = session.program_day_id.as_deref() else {
            continue;
        };
        if !day_ids.iter().any(|id| id.as_ref() == day) {
            continue;
        }
        completions
            .entry(day.to_string())
            .and_modify(|latest| {
                if session.started_at > *latest {
                    *latest = session.started_at;
                }
            })
            .or_insert(session.started_at);
    }

    completions
}

/// Estimated minutes for a program day, rounded to 5 and at least 5.
/// Zero only when nothing is planned.
pub fn estimate_duration(exercises: &[PlannedExercise]) -> u32 {
    if exercises.iter().all(|e| e.sets_target == 0) {
        return 0;
    }

    let seconds: u64 = exercises
        .iter()
        .map(|e| {
            let rest = u64::from(e.rest_seconds.unwrap_or(DEFAULT_REST_SECONDS));
            u64::from(e.sets_target).saturating_mul(rest + u64::from(SET_WORK_SECONDS))
        })
        .fold(0u64, u64::saturating_add);
    let minutes = seconds as f64 / 60.0;
    let rounded = (minutes / ROUND_TO_MINUTES).round() * ROUND_TO_MINUTES;

    // Float-to-int casts saturate at u32::MAX
    (rounded as u32).max(ROUND_TO_MINUTES as u32)
}
