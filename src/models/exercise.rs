use serde::{Deserialize, Serialize};

/// Decides which metrics an exercise tracks and what a completable set needs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum ExerciseKind {
    #[default]
    Reps,
    Time,
    Distance,
}

impl ExerciseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Reps => "reps",
            ExerciseKind::Time => "time",
            ExerciseKind::Distance => "distance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "reps" => Some(ExerciseKind::Reps),
            "time" => Some(ExerciseKind::Time),
            "distance" => Some(ExerciseKind::Distance),
            _ => None,
        }
    }
}

/// Catalogue entry for an exercise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDefinition {
    pub id: String,
    pub name: String,
    pub kind: ExerciseKind,
}

impl ExerciseDefinition {
    pub const PLACEHOLDER_NAME: &'static str = "Unknown exercise";

    /// Stand-in for a definition that was deleted elsewhere.
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Self::PLACEHOLDER_NAME.to_string(),
            kind: ExerciseKind::Reps,
        }
    }
}

/// One set row. `weight` is in the user's entry unit; `time` is seconds and
/// `distance` is meters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetEntry {
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub time: Option<u32>,
    pub distance: Option<u32>,
    pub completed: bool,
}

impl SetEntry {
    /// Copies the data fields of `self` onto a fresh, incomplete set.
    pub fn carry_forward(&self) -> Self {
        Self {
            completed: false,
            ..self.clone()
        }
    }
}

/// Field-level edit applied to a set while the session runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetField {
    Reps(Option<u32>),
    Weight(Option<f64>),
    Time(Option<u32>),
    Distance(Option<u32>),
}

impl SetField {
    pub fn apply(self, set: &mut SetEntry) {
        match self {
            SetField::Reps(value) => set.reps = value,
            SetField::Weight(value) => set.weight = value,
            SetField::Time(value) => set.time = value,
            SetField::Distance(value) => set.distance = value,
        }
    }
}

/// An exercise as performed in the running session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseEntry {
    pub exercise_id: String,
    pub name: String,
    pub kind: ExerciseKind,
    pub sets: Vec<SetEntry>,
    pub target_reps: Option<String>,
    pub rest_seconds: u32,
    pub next_exercise_rest_seconds: u32,
    pub notes: Option<String>,
}

impl ExerciseEntry {
    pub fn new(definition: &ExerciseDefinition, rest_seconds: u32, next_rest_seconds: u32) -> Self {
        Self {
            exercise_id: definition.id.clone(),
            name: definition.name.clone(),
            kind: definition.kind,
            sets: vec![SetEntry::default()],
            target_reps: None,
            rest_seconds,
            next_exercise_rest_seconds: next_rest_seconds,
            notes: None,
        }
    }

    pub fn all_sets_completed(&self) -> bool {
        !self.sets.is_empty() && self.sets.iter().all(|set| set.completed)
    }

    pub fn has_incomplete_set(&self) -> bool {
        self.sets.iter().any(|set| !set.completed)
    }

    pub fn completed_sets(&self) -> impl Iterator<Item = &SetEntry> {
        self.sets.iter().filter(|set| set.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_exercise_is_never_fully_complete() {
        let mut entry = ExerciseEntry::new(&ExerciseDefinition::placeholder("x"), 60, 90);
        entry.sets.clear();
        assert!(!entry.all_sets_completed());
        assert!(!entry.has_incomplete_set());
    }

    #[test]
    fn kind_round_trips_through_its_name() {
        for kind in [ExerciseKind::Reps, ExerciseKind::Time, ExerciseKind::Distance] {
            assert_eq!(ExerciseKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ExerciseKind::parse("swim"), None);
    }
}
