use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Finalized record of a completed workout. Only completed sets are kept and
/// weights are canonical kg.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub workout_id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub duration_seconds: u64,
    pub exercises: Vec<HistoryExercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryExercise {
    pub exercise_id: String,
    pub sets: Vec<HistorySet>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistorySet {
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub time: Option<u32>,
    pub distance: Option<u32>,
}
