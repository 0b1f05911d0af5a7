//! Session-over-session momentum
//!
//! Compares the volume of the workout in progress with the last time the same
//! exercises were done, set position by set position.

use std::collections::HashMap;

use super::types::{ActiveExercise, Direction, MomentumResult, SessionHistory};

/// Percentage change in matched volume against the last session.
///
/// Only the first `min(completed now, sets last time)` positions of each
/// exercise are compared. Exercises without a previous session are left out
/// entirely instead of counting as zero.
pub fn calculate_momentum(
    current: &[ActiveExercise],
    last_sessions: &HashMap<String, Vec<SessionHistory>>,
) -> Option<MomentumResult> {
    let mut current_volume = 0.0;
    let mut prior_volume = 0.0;
    let mut matched = 0usize;

    for exercise in current {
        let Some(previous) = last_sessions
            .get(&exercise.exercise_id)
            .and_then(|sessions| sessions.first())
            .filter(|s| !s.sets.is_empty())
        else {
            continue;
        };

        let done: Vec<_> = exercise.working_sets().collect();
        if done.is_empty() {
            continue;
        }

        let n = done.len().min(previous.sets.len());
        current_volume += done.iter().take(n).map(|s| s.volume()).sum::<f64>();
        prior_volume += previous.sets.iter().take(n).map(|s| s.volume()).sum::<f64>();
        matched += 1;
    }

    if matched == 0 || prior_volume <= 0.0 {
        return None;
    }

    let percentage = ((current_volume - prior_volume) / prior_volume * 100.0).round() as i64;
    let direction = match percentage {
        p if p > 0 => Direction::Up,
        p if p < 0 => Direction::Down,
        _ => Direction::Even,
    };

    Some(MomentumResult {
        percentage,
        direction,
    })
}
