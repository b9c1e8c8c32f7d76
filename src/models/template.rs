use serde::{Deserialize, Serialize};

use super::SetEntry;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutTemplate {
    pub id: String,
    pub name: String,
    pub exercises: Vec<TemplateExercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateExercise {
    pub exercise_id: String,
    pub target_reps: Option<String>,
    pub rest_seconds: u32,
    pub next_exercise_rest_seconds: u32,
    pub notes: Option<String>,
    /// Planned set values; completion is never stored on a template.
    pub sets: Vec<TemplateSet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSet {
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub time: Option<u32>,
    pub distance: Option<u32>,
}

impl From<&SetEntry> for TemplateSet {
    fn from(set: &SetEntry) -> Self {
        Self {
            reps: set.reps,
            weight: set.weight,
            time: set.time,
            distance: set.distance,
        }
    }
}

impl From<&TemplateSet> for SetEntry {
    fn from(set: &TemplateSet) -> Self {
        Self {
            reps: set.reps,
            weight: set.weight,
            time: set.time,
            distance: set.distance,
            completed: false,
        }
    }
}
