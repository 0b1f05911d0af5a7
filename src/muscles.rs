//! Muscle groups used to pick progression increments

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Primary muscle group of an exercise
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Chest,
    Shoulders,
    Triceps,
    Back,
    Biceps,
    Forearms,
    Core,
    Glutes,
    Quads,
    Hamstrings,
    Calves,
}

impl MuscleGroup {
    pub fn name(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "chest",
            MuscleGroup::Shoulders => "shoulders",
            MuscleGroup::Triceps => "triceps",
            MuscleGroup::Back => "back",
            MuscleGroup::Biceps => "biceps",
            MuscleGroup::Forearms => "forearms",
            MuscleGroup::Core => "core",
            MuscleGroup::Glutes => "glutes",
            MuscleGroup::Quads => "quads",
            MuscleGroup::Hamstrings => "hamstrings",
            MuscleGroup::Calves => "calves",
        }
    }

    /// All muscle groups for iteration
    pub fn all() -> &'static [MuscleGroup] {
        &[
            MuscleGroup::Chest,
            MuscleGroup::Shoulders,
            MuscleGroup::Triceps,
            MuscleGroup::Back,
            MuscleGroup::Biceps,
            MuscleGroup::Forearms,
            MuscleGroup::Core,
            MuscleGroup::Glutes,
            MuscleGroup::Quads,
            MuscleGroup::Hamstrings,
            MuscleGroup::Calves,
        ]
    }

    /// Lower-body groups progress in bigger jumps
    pub fn is_lower_body(&self) -> bool {
        matches!(
            self,
            MuscleGroup::Quads | MuscleGroup::Hamstrings | MuscleGroup::Glutes | MuscleGroup::Calves
        )
    }
}

impl FromStr for MuscleGroup {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        MuscleGroup::all()
            .iter()
            .find(|m| m.name() == needle)
            .copied()
            .ok_or_else(|| ParseError::UnknownMuscle(s.to_string()))
    }
}

impl std::fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a free-form primary muscle name counts as lower body.
/// Unknown names are treated as upper body.
pub fn is_lower_body(muscle_primary: &str) -> bool {
    muscle_primary
        .parse::<MuscleGroup>()
        .is_ok_and(|m| m.is_lower_body())
}
