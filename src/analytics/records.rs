//! Personal-record detection
//!
//! Two flavours:
//! - batch: at the end of a workout, walk the completed sets and mark every
//!   weight that beat both the historical max and everything lifted earlier in
//!   the same workout. A second pass keeps only the heaviest key per exercise.
//! - realtime: while training, compare the best completed weight so far with a
//!   lazily loaded historical max.

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::types::{ActiveExercise, PrState, Set};
use crate::error::ParseError;

/// Identifies a PR-setting weight: `"exerciseId:weight"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrKey {
    pub exercise_id: String,
    pub weight_kg: f64,
}

impl std::fmt::Display for PrKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.exercise_id, self.weight_kg)
    }
}

impl FromStr for PrKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (exercise_id, weight) = s
            .rsplit_once(':')
            .ok_or_else(|| ParseError::InvalidPrKey(s.to_string()))?;
        let weight_kg: f64 = weight
            .parse()
            .map_err(|_| ParseError::InvalidPrKey(s.to_string()))?;
        if exercise_id.is_empty() {
            return Err(ParseError::InvalidPrKey(s.to_string()));
        }
        Ok(Self {
            exercise_id: exercise_id.to_string(),
            weight_kg,
        })
    }
}

/// Mark every set that set a new max at the moment it was lifted.
///
/// `history` maps exercise id to the prior max; a missing entry means the
/// exercise has never been lifted and starts from zero. Keys come back in the
/// order the sets were performed.
pub fn detect_prs(completed_sets: &[Set], history: &HashMap<String, f64>) -> Vec<PrKey> {
    let mut workout_max: HashMap<&str, f64> = HashMap::new();
    let mut keys = Vec::new();

    for set in completed_sets.iter().filter(|s| s.is_working()) {
        let Some(weight) = set.weight_kg.filter(|w| *w > 0.0) else {
            continue;
        };

        let running = workout_max
            .entry(set.exercise_id.as_str())
            .or_insert_with(|| history.get(&set.exercise_id).copied().unwrap_or(0.0));

        if weight > *running {
            *running = weight;
            keys.push(PrKey {
                exercise_id: set.exercise_id.clone(),
                weight_kg: weight,
            });
        }
    }

    keys
}

/// Keep only the heaviest PR key per exercise, in first-seen exercise order.
pub fn best_pr_keys(keys: &[PrKey]) -> Vec<PrKey> {
    let mut best: Vec<PrKey> = Vec::new();
    for key in keys {
        match best.iter_mut().find(|b| b.exercise_id == key.exercise_id) {
            Some(current) if key.weight_kg > current.weight_kg => *current = key.clone(),
            Some(_) => {}
            None => best.push(key.clone()),
        }
    }
    best
}

/// Load state of one exercise's historical max
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum MaxState {
    NotLoaded,
    Loading,
    /// Zero is a real value: the exercise has never been lifted before
    Loaded(f64),
}

impl MaxState {
    pub fn value(&self) -> Option<f64> {
        match self {
            MaxState::Loaded(v) => Some(*v),
            MaxState::NotLoaded | MaxState::Loading => None,
        }
    }
}

/// Realtime PR status for an exercise in progress.
///
/// `None` until the historical max is loaded, and while no weighted set has
/// been completed.
pub fn pr_state(exercise: &ActiveExercise, max: MaxState) -> Option<PrState> {
    let previous_max = max.value()?;
    let new_max = exercise
        .working_sets()
        .filter_map(|s| s.weight_kg)
        .filter(|w| *w > 0.0)
        .reduce(f64::max)?;

    let is_pr = new_max > previous_max;
    Some(PrState {
        is_pr,
        previous_max,
        new_max,
        delta: if is_pr { new_max - previous_max } else { 0.0 },
    })
}

/// Where historical maxima come from
pub trait MaxSource {
    /// Max non-warmup weight per exercise. Exercises never lifted may be absent.
    fn fetch_maxes(&self, exercise_ids: &[String]) -> Result<HashMap<String, f64>>;
}

/// Per-exercise cache of historical maxima, filled in one batch at workout
/// start and topped up for exercises added later.
#[derive(Debug, Clone, Default)]
pub struct HistoricalMaxCache {
    entries: HashMap<String, MaxState>,
}

impl HistoricalMaxCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, exercise_id: &str) -> MaxState {
        self.entries
            .get(exercise_id)
            .copied()
            .unwrap_or(MaxState::NotLoaded)
    }

    /// Mark every not-yet-loaded id as loading; returns the ids to fetch.
    pub fn begin_batch(&mut self, exercise_ids: &[String]) -> Vec<String> {
        exercise_ids
            .iter()
            .filter(|id| self.request(id))
            .cloned()
            .collect()
    }

    /// True when the caller should issue a fetch. In-flight and loaded ids
    /// return false.
    pub fn request(&mut self, exercise_id: &str) -> bool {
        match self.state(exercise_id) {
            MaxState::NotLoaded => {
                self.entries
                    .insert(exercise_id.to_string(), MaxState::Loading);
                true
            }
            MaxState::Loading | MaxState::Loaded(_) => false,
        }
    }

    pub fn resolve(&mut self, exercise_id: &str, max: f64) {
        self.entries
            .insert(exercise_id.to_string(), MaxState::Loaded(max));
    }

    /// Requested ids missing from `results` were never lifted: they load as 0.
    pub fn complete_batch(&mut self, requested: &[String], results: &HashMap<String, f64>) {
        for id in requested {
            let max = results.get(id).copied().unwrap_or(0.0);
            self.resolve(id, max);
        }
    }

    /// A failed fetch goes back to not loaded so the next request retries
    pub fn fail(&mut self, exercise_id: &str) {
        if self.state(exercise_id) == MaxState::Loading {
            self.entries.remove(exercise_id);
        }
    }

    /// Fetch whatever is still missing in a single call
    pub fn load_missing(&mut self, source: &impl MaxSource, exercise_ids: &[String]) -> Result<()> {
        let pending = self.begin_batch(exercise_ids);
        if pending.is_empty() {
            return Ok(());
        }
        match source.fetch_maxes(&pending) {
            Ok(results) => {
                self.complete_batch(&pending, &results);
                Ok(())
            }
            Err(e) => {
                for id in &pending {
                    self.fail(id);
                }
                Err(e)
            }
        }
    }

    pub fn pr_state(&self, exercise: &ActiveExercise) -> Option<PrState> {
        pr_state(exercise, self.state(&exercise.exercise_id))
    }
}
