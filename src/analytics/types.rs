//! Plain records consumed and produced by the analytics engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One performed (or planned) set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Set {
    pub exercise_id: String,
    /// 1-based, sequential within the exercise
    pub set_number: u32,
    /// None for bodyweight work
    pub weight_kg: Option<f64>,
    pub reps: Option<u32>,
    pub rpe: Option<f64>,
    pub is_warmup: bool,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Set {
    /// Completed, non-warmup set. Everything else is ignored by analytics.
    pub fn is_working(&self) -> bool {
        self.is_completed && !self.is_warmup
    }

    /// weight × reps, missing values count as zero
    pub fn volume(&self) -> f64 {
        self.weight_kg.unwrap_or(0.0) * self.reps.unwrap_or(0) as f64
    }
}

/// A working set as recorded in history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistorySet {
    pub weight_kg: Option<f64>,
    pub reps: Option<u32>,
    pub rpe: Option<f64>,
}

impl HistorySet {
    pub fn volume(&self) -> f64 {
        self.weight_kg.unwrap_or(0.0) * self.reps.unwrap_or(0) as f64
    }
}

/// One past completed workout, restricted to a single exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionHistory {
    pub started_at: DateTime<Utc>,
    pub sets: Vec<HistorySet>,
}

/// Exercise inside the workout currently being performed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveExercise {
    pub exercise_id: String,
    pub sets: Vec<Set>,
}

impl ActiveExercise {
    pub fn working_sets(&self) -> impl Iterator<Item = &Set> {
        self.sets.iter().filter(|s| s.is_working())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    Increase,
    Deload,
}

impl std::fmt::Display for SuggestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Increase => write!(f, "increase"),
            Self::Deload => write!(f, "deload"),
        }
    }
}

/// Next working weight recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverloadSuggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionType,
    pub weight: f64,
    pub reps: u32,
    pub reason: String,
}

/// Realtime PR status of one exercise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrState {
    pub is_pr: bool,
    pub previous_max: f64,
    pub new_max: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Even,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MomentumResult {
    pub percentage: i64,
    pub direction: Direction,
}

/// Streak lengths are counted in ISO weeks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakResult {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_weeks_active: u32,
}
