use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum MetricType {
    Weight,
    Reps,
    Volume,
    Time,
    Distance,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Weight => "weight",
            MetricType::Reps => "reps",
            MetricType::Volume => "volume",
            MetricType::Time => "time",
            MetricType::Distance => "distance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "weight" => Some(MetricType::Weight),
            "reps" => Some(MetricType::Reps),
            "volume" => Some(MetricType::Volume),
            "time" => Some(MetricType::Time),
            "distance" => Some(MetricType::Distance),
            _ => None,
        }
    }
}

/// Set fields a metric is derived from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SetFieldName {
    Reps,
    Weight,
    Time,
    Distance,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrCandidate {
    pub metric: MetricType,
    pub value: f64,
    pub contributing_fields: Vec<SetFieldName>,
}

/// Best value ever stored for `(exercise_id, metric)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPr {
    pub exercise_id: String,
    pub metric: MetricType,
    pub value: f64,
    pub date: DateTime<Utc>,
    pub history_record_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionAchievedPr {
    pub exercise_id: String,
    pub metric: MetricType,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionNotifiedPr {
    pub exercise_id: String,
    pub metric: MetricType,
    pub value: f64,
    pub notified_this_session: bool,
}

/// One batched notice covering every metric a single toggle improved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrNotification {
    pub exercise_index: usize,
    pub exercise_id: String,
    pub exercise_name: String,
    pub records: Vec<PrCandidate>,
}
