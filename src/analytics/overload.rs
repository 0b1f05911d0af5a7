//! Progressive overload advisor
//!
//! Looks at the two most recent sessions of an exercise and decides whether the
//! next working weight should go up, come down, or stay put. The decision is an
//! ordered list of named rules; when nothing matches the advisor abstains.

use chrono::Duration;

use super::numeric::round_to_plate;
use super::types::{HistorySet, OverloadSuggestion, SessionHistory, SuggestionType};
use crate::muscles::is_lower_body;

/// Sessions further apart than this are not comparable
const MAX_SESSION_GAP_DAYS: i64 = 30;

/// Share of sets that must carry RPE to trust it
const RPE_DENSITY_THRESHOLD: f64 = 0.8;

const EASY_RPE: f64 = 7.0;
const GRINDING_RPE: f64 = 9.0;

/// A set counts as missed when it fell at least this many reps short
const MISS_MARGIN: u32 = 2;
const MISSED_SHARE_FOR_DELOAD: f64 = 0.5;

const DELOAD_FACTOR: f64 = 0.9;
const LOWER_BODY_INCREMENT: f64 = 5.0;
const UPPER_BODY_INCREMENT: f64 = 2.5;

/// What two sessions tell us, reduced to the facts the rules look at
#[derive(Debug, Clone, Copy)]
struct Signals {
    target_reps: u32,
    /// Average RPE of the newest and the older session (None if no set had RPE)
    avg_rpe: [Option<f64>; 2],
    /// Every set in both sessions reached the target
    all_hit_target: bool,
    /// Share of sets in each session that missed the target by MISS_MARGIN or more
    missed_share: [f64; 2],
}

impl Signals {
    fn both_rpe(&self, pred: impl Fn(f64) -> bool) -> bool {
        self.avg_rpe.iter().all(|avg| avg.is_some_and(&pred))
    }
}

struct Rule {
    name: &'static str,
    applies: fn(&Signals) -> bool,
    outcome: SuggestionType,
}

/// Enough RPE data to lean on perceived effort
const RPE_RULES: &[Rule] = &[
    Rule {
        name: "easy sessions, all reps hit",
        applies: |s| s.both_rpe(|r| r <= EASY_RPE) && s.all_hit_target,
        outcome: SuggestionType::Increase,
    },
    Rule {
        name: "two grinding sessions",
        applies: |s| s.both_rpe(|r| r >= GRINDING_RPE),
        outcome: SuggestionType::Deload,
    },
];

/// Rep performance only
const REP_RULES: &[Rule] = &[
    Rule {
        name: "all reps hit in both sessions",
        applies: |s| s.all_hit_target,
        outcome: SuggestionType::Increase,
    },
    Rule {
        name: "repeatedly missing reps",
        applies: |s| s.missed_share.iter().all(|&m| m >= MISSED_SHARE_FOR_DELOAD),
        outcome: SuggestionType::Deload,
    },
];

/// Suggest the next working weight for an exercise.
///
/// `history` is newest first. `target_reps` falls back to the first set of the
/// older session when not given. Returns `None` whenever the data is too thin
/// or contradictory to support a call.
pub fn compute_overload_suggestion(
    history: &[SessionHistory],
    target_reps: Option<u32>,
    muscle_primary: &str,
) -> Option<OverloadSuggestion> {
    let [newest, older, ..] = history else {
        return None;
    };

    let gap = newest.started_at - older.started_at;
    if gap.abs() > Duration::days(MAX_SESSION_GAP_DAYS) {
        return None;
    }
    if newest.sets.is_empty() || older.sets.is_empty() {
        return None;
    }

    let target = target_reps.or(older.sets[0].reps)?;
    let baseline = newest.sets[0].weight_kg.filter(|w| *w > 0.0)?;

    let increment = if is_lower_body(muscle_primary) {
        LOWER_BODY_INCREMENT
    } else {
        UPPER_BODY_INCREMENT
    };

    let signals = Signals {
        target_reps: target,
        avg_rpe: [average_rpe(&newest.sets), average_rpe(&older.sets)],
        all_hit_target: newest
            .sets
            .iter()
            .chain(older.sets.iter())
            .all(|s| reps_of(s) >= target),
        missed_share: [
            missed_share(&newest.sets, target),
            missed_share(&older.sets, target),
        ],
    };

    let rules = if rpe_density(&newest.sets, &older.sets) >= RPE_DENSITY_THRESHOLD {
        RPE_RULES
    } else {
        REP_RULES
    };

    match rules.iter().find(|rule| (rule.applies)(&signals)) {
        Some(rule) => {
            let weight = match rule.outcome {
                SuggestionType::Increase => round_to_plate(baseline + increment),
                SuggestionType::Deload => round_to_plate(baseline * DELOAD_FACTOR),
            };
            Some(OverloadSuggestion {
                kind: rule.outcome,
                weight,
                reps: signals.target_reps,
                reason: rule.name.to_string(),
            })
        }
        None => None,
    }
}

fn reps_of(set: &HistorySet) -> u32 {
    set.reps.unwrap_or(0)
}

fn rpe_density(newest: &[HistorySet], older: &[HistorySet]) -> f64 {
    let total = newest.len() + older.len();
    if total == 0 {
        return 0.0;
    }
    let rated = newest
        .iter()
        .chain(older.iter())
        .filter(|s| s.rpe.is_some())
        .count();
    rated as f64 / total as f64
}

fn average_rpe(sets: &[HistorySet]) -> Option<f64> {
    let rated: Vec<f64> = sets.iter().filter_map(|s| s.rpe).collect();
    if rated.is_empty() {
        return None;
    }
    Some(rated.iter().sum::<f64>() / rated.len() as f64)
}

fn missed_share(sets: &[HistorySet], target: u32) -> f64 {
    if sets.is_empty() {
        return 0.0;
    }
    let missed = sets
        .iter()
        .filter(|s| target.saturating_sub(reps_of(s)) >= MISS_MARGIN)
        .count();
    missed as f64 / sets.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 18, 0, 0).unwrap()
    }

    fn set(weight: f64, reps: u32, rpe: Option<f64>) -> HistorySet {
        HistorySet {
            weight_kg: Some(weight),
            reps: Some(reps),
            rpe,
        }
    }

    fn session(started_at: DateTime<Utc>, sets: Vec<HistorySet>) -> SessionHistory {
        SessionHistory { started_at, sets }
    }

    #[test]
    fn test_easy_rpe_sessions_increase() {
        let history = vec![
            session(at(2026, 2, 14), vec![set(80.0, 8, Some(6.5)); 3]),
            session(at(2026, 2, 10), vec![set(80.0, 8, Some(6.0)); 3]),
        ];

        let suggestion = compute_overload_suggestion(&history, Some(8), "chest").unwrap();
        assert_eq!(suggestion.kind, SuggestionType::Increase);
        assert_eq!(suggestion.weight, 82.5);
        assert_eq!(suggestion.reps, 8);
    }

    #[test]
    fn test_lower_body_uses_bigger_increment() {
        let history = vec![
            session(at(2026, 2, 14), vec![set(100.0, 5, Some(7.0)); 3]),
            session(at(2026, 2, 10), vec![set(100.0, 5, Some(6.5)); 3]),
        ];

        let suggestion = compute_overload_suggestion(&history, Some(5), "quads").unwrap();
        assert_eq!(suggestion.weight, 105.0);
    }

    #[test]
    fn test_unknown_muscle_uses_small_increment() {
        let history = vec![
            session(at(2026, 2, 14), vec![set(40.0, 10, None); 3]),
            session(at(2026, 2, 10), vec![set(40.0, 10, None); 3]),
        ];

        let suggestion = compute_overload_suggestion(&history, Some(10), "neck").unwrap();
        assert_eq!(suggestion.weight, 42.5);
    }

    #[test]
    fn test_grinding_rpe_sessions_deload() {
        let history = vec![
            session(at(2026, 2, 14), vec![set(82.5, 6, Some(9.5)); 3]),
            session(at(2026, 2, 10), vec![set(82.5, 7, Some(9.0)); 3]),
        ];

        let suggestion = compute_overload_suggestion(&history, Some(8), "back").unwrap();
        assert_eq!(suggestion.kind, SuggestionType::Deload);
        assert_eq!(suggestion.weight, 75.0);
        assert_eq!(suggestion.reps, 8);
    }

    #[test]
    fn test_moderate_rpe_abstains() {
        let history = vec![
            session(at(2026, 2, 14), vec![set(80.0, 8, Some(8.0)); 3]),
            session(at(2026, 2, 10), vec![set(80.0, 8, Some(7.5)); 3]),
        ];
        assert!(compute_overload_suggestion(&history, Some(8), "chest").is_none());
    }

    #[test]
    fn test_easy_rpe_but_missed_reps_abstains() {
        let history = vec![
            session(at(2026, 2, 14), vec![set(80.0, 7, Some(6.0)); 3]),
            session(at(2026, 2, 10), vec![set(80.0, 8, Some(6.0)); 3]),
        ];
        assert!(compute_overload_suggestion(&history, Some(8), "chest").is_none());
    }

    #[test]
    fn test_rep_rules_increase_without_rpe() {
        let history = vec![
            session(at(2026, 2, 14), vec![set(60.0, 10, None), set(60.0, 11, None)]),
            session(at(2026, 2, 10), vec![set(60.0, 10, None), set(60.0, 10, None)]),
        ];

        let suggestion = compute_overload_suggestion(&history, None, "shoulders").unwrap();
        assert_eq!(suggestion.kind, SuggestionType::Increase);
        assert_eq!(suggestion.weight, 62.5);
        // Implicit target comes from the older session's first set
        assert_eq!(suggestion.reps, 10);
    }

    #[test]
    fn test_rep_rules_deload_when_missing_twice() {
        let history = vec![
            session(
                at(2026, 2, 14),
                vec![set(100.0, 6, None), set(100.0, 5, None), set(100.0, 8, None)],
            ),
            session(at(2026, 2, 10), vec![set(100.0, 6, None), set(100.0, 6, None)]),
        ];

        let suggestion = compute_overload_suggestion(&history, Some(8), "glutes").unwrap();
        assert_eq!(suggestion.kind, SuggestionType::Deload);
        assert_eq!(suggestion.weight, 90.0);
    }

    #[test]
    fn test_rep_rules_missing_once_abstains() {
        let history = vec![
            session(at(2026, 2, 14), vec![set(100.0, 6, None), set(100.0, 6, None)]),
            session(at(2026, 2, 10), vec![set(100.0, 8, None), set(100.0, 7, None)]),
        ];
        assert!(compute_overload_suggestion(&history, Some(8), "glutes").is_none());
    }

    #[test]
    fn test_sparse_rpe_falls_back_to_reps() {
        // 1 of 4 sets rated: rep rules apply, RPE 10 is ignored
        let history = vec![
            session(at(2026, 2, 14), vec![set(50.0, 12, Some(10.0)), set(50.0, 12, None)]),
            session(at(2026, 2, 10), vec![set(50.0, 12, None), set(50.0, 12, None)]),
        ];

        let suggestion = compute_overload_suggestion(&history, Some(12), "biceps").unwrap();
        assert_eq!(suggestion.kind, SuggestionType::Increase);
    }

    #[test]
    fn test_requires_two_sessions() {
        let history = vec![session(at(2026, 2, 14), vec![set(80.0, 8, Some(6.0))])];
        assert!(compute_overload_suggestion(&history, Some(8), "chest").is_none());
        assert!(compute_overload_suggestion(&[], Some(8), "chest").is_none());
    }

    #[test]
    fn test_gap_over_thirty_days_abstains() {
        let history = vec![
            session(at(2026, 3, 15), vec![set(80.0, 8, Some(6.0)); 3]),
            session(at(2026, 2, 10), vec![set(80.0, 8, Some(6.0)); 3]),
        ];
        assert!(compute_overload_suggestion(&history, Some(8), "chest").is_none());
    }

    #[test]
    fn test_gap_of_exactly_thirty_days_allowed() {
        let history = vec![
            session(at(2026, 3, 12), vec![set(80.0, 8, Some(6.0)); 3]),
            session(at(2026, 2, 10), vec![set(80.0, 8, Some(6.0)); 3]),
        ];
        assert!(compute_overload_suggestion(&history, Some(8), "chest").is_some());
    }

    #[test]
    fn test_empty_session_abstains() {
        let history = vec![
            session(at(2026, 2, 14), vec![]),
            session(at(2026, 2, 10), vec![set(80.0, 8, Some(6.0)); 3]),
        ];
        assert!(compute_overload_suggestion(&history, Some(8), "chest").is_none());
    }

    #[test]
    fn test_bodyweight_baseline_abstains() {
        let bodyweight = HistorySet {
            weight_kg: None,
            reps: Some(12),
            rpe: None,
        };
        let history = vec![
            session(at(2026, 2, 14), vec![bodyweight; 3]),
            session(at(2026, 2, 10), vec![bodyweight; 3]),
        ];
        assert!(compute_overload_suggestion(&history, Some(10), "back").is_none());
    }

    #[test]
    fn test_is_deterministic() {
        let history = vec![
            session(at(2026, 2, 14), vec![set(80.0, 8, Some(6.5)); 3]),
            session(at(2026, 2, 10), vec![set(80.0, 8, Some(6.0)); 3]),
        ];
        let first = compute_overload_suggestion(&history, Some(8), "chest");
        let second = compute_overload_suggestion(&history, Some(8), "chest");
        assert_eq!(first, second);
    }

    #[test]
    fn test_huge_rep_counts_do_not_overflow() {
        let history = vec![
            session(at(2026, 2, 14), vec![set(80.0, u32::MAX, None); 3]),
            session(at(2026, 2, 10), vec![set(80.0, u32::MAX, None); 3]),
        ];
        let suggestion = compute_overload_suggestion(&history, Some(8), "chest").unwrap();
        assert_eq!(suggestion.kind, SuggestionType::Increase);
        assert_eq!(suggestion.weight, 82.5);
    }
}
