use std::collections::HashMap;

use crate::models::{ExerciseKind, HistoricalPr, MetricType, PrCandidate, SetFieldName};

use super::MaxValues;

/// Metrics tracked for each exercise kind, in notification order.
pub fn metrics_for(kind: ExerciseKind) -> &'static [MetricType] {
    match kind {
        ExerciseKind::Reps => &[MetricType::Weight, MetricType::Reps, MetricType::Volume],
        ExerciseKind::Time => &[MetricType::Time],
        ExerciseKind::Distance => &[MetricType::Distance, MetricType::Time],
    }
}

fn contributing_fields(metric: MetricType) -> Vec<SetFieldName> {
    match metric {
        MetricType::Weight => vec![SetFieldName::Weight],
        MetricType::Reps => vec![SetFieldName::Reps],
        MetricType::Volume => vec![SetFieldName::Weight, SetFieldName::Reps],
        MetricType::Time => vec![SetFieldName::Time],
        MetricType::Distance => vec![SetFieldName::Distance],
    }
}

/// Positive candidates for every metric the kind tracks.
pub fn candidates(kind: ExerciseKind, max: &MaxValues) -> Vec<PrCandidate> {
    metrics_for(kind)
        .iter()
        .map(|&metric| PrCandidate {
            metric,
            value: max.value_for(metric),
            contributing_fields: contributing_fields(metric),
        })
        .filter(|candidate| candidate.value > 0.0)
        .collect()
}

/// Candidates that strictly beat the stored record, or have none to beat.
pub fn beaten_records(
    exercise_id: &str,
    kind: ExerciseKind,
    max: &MaxValues,
    historical: &HistoricalRecords,
) -> Vec<PrCandidate> {
    candidates(kind, max)
        .into_iter()
        .filter(|candidate| historical.is_beaten_by(exercise_id, candidate.metric, candidate.value))
        .collect()
}

/// In-memory copy of the long-term record store, loaded once per session so
/// set toggles never wait on storage.
#[derive(Debug, Clone, Default)]
pub struct HistoricalRecords {
    best: HashMap<(String, MetricType), f64>,
}

impl HistoricalRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = HistoricalPr>) -> Self {
        let mut historical = Self::new();
        for record in records {
            historical.raise(&record.exercise_id, record.metric, record.value);
        }
        historical
    }

    pub fn best(&self, exercise_id: &str, metric: MetricType) -> Option<f64> {
        self.best.get(&(exercise_id.to_string(), metric)).copied()
    }

    pub fn is_beaten_by(&self, exercise_id: &str, metric: MetricType, value: f64) -> bool {
        match self.best(exercise_id, metric) {
            Some(best) => value > best,
            None => true,
        }
    }

    /// Stores `value` if it beats what is held.
    pub fn raise(&mut self, exercise_id: &str, metric: MetricType, value: f64) {
        let entry = self
            .best
            .entry((exercise_id.to_string(), metric))
            .or_insert(value);
        if value > *entry {
            *entry = value;
        }
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = HistoricalPr>) {
        for record in records {
            self.raise(&record.exercise_id, record.metric, record.value);
        }
    }
}
