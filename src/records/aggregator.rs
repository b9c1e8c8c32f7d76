use serde::{Deserialize, Serialize};

use crate::{
    models::{ExerciseKind, MetricType, SetEntry},
    units::WeightUnit,
};

/// Best value per metric across the completed sets of one exercise. Weight
/// and volume are canonical kg; volume is the best single set, not a total.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MaxValues {
    pub weight: f64,
    pub reps: u32,
    pub volume: f64,
    pub time: u32,
    pub distance: u32,
    pub has_no_valid_values: bool,
}

impl MaxValues {
    pub fn value_for(&self, metric: MetricType) -> f64 {
        match metric {
            MetricType::Weight => self.weight,
            MetricType::Reps => f64::from(self.reps),
            MetricType::Volume => self.volume,
            MetricType::Time => f64::from(self.time),
            MetricType::Distance => f64::from(self.distance),
        }
    }

    fn absorb(&mut self, kind: ExerciseKind, sample: SetSample) {
        match kind {
            ExerciseKind::Reps => {
                self.weight = self.weight.max(sample.weight);
                self.reps = self.reps.max(sample.reps);
                self.volume = self.volume.max(sample.weight * f64::from(sample.reps));
            }
            ExerciseKind::Time => {
                self.time = self.time.max(sample.time);
            }
            ExerciseKind::Distance => {
                self.distance = self.distance.max(sample.distance);
                self.time = self.time.max(sample.time);
            }
        }
    }

    fn is_empty_for(&self, kind: ExerciseKind) -> bool {
        match kind {
            ExerciseKind::Reps => self.weight <= 0.0 && self.reps == 0,
            ExerciseKind::Time => self.time == 0,
            ExerciseKind::Distance => self.distance == 0 && self.time == 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SetSample {
    weight: f64,
    reps: u32,
    time: u32,
    distance: u32,
}

impl SetSample {
    fn from_set(set: &SetEntry, unit: WeightUnit, exact: bool) -> Self {
        let weight = set
            .weight
            .map(|value| {
                if exact {
                    unit.to_canonical_exact(value)
                } else {
                    unit.to_canonical(value)
                }
            })
            .filter(|value| value.is_finite() && *value > 0.0)
            .unwrap_or(0.0);

        Self {
            weight,
            reps: set.reps.unwrap_or(0),
            time: set.time.unwrap_or(0),
            distance: set.distance.unwrap_or(0),
        }
    }
}

/// Whether a completed set carries data that counts for its kind.
pub fn has_valid_data(kind: ExerciseKind, set: &SetEntry) -> bool {
    match kind {
        ExerciseKind::Reps => set.reps.unwrap_or(0) > 0,
        ExerciseKind::Time => set.time.unwrap_or(0) > 0,
        ExerciseKind::Distance => set.distance.unwrap_or(0) > 0,
    }
}

/// Computes [`MaxValues`] from the completed sets in `sets`.
///
/// When exactly one set is completed its values are taken as entered, with
/// no rounding and no per-kind validity filter, so the first set of a
/// session cannot lose a record to conversion rounding. Fields the set
/// leaves empty still read as zero.
pub fn compute_max_values(sets: &[SetEntry], kind: ExerciseKind, unit: WeightUnit) -> MaxValues {
    let completed: Vec<&SetEntry> = sets.iter().filter(|set| set.completed).collect();
    let mut max = MaxValues::default();

    if let [only] = completed.as_slice() {
        max.absorb(kind, SetSample::from_set(only, unit, true));
    } else {
        for set in completed.iter().filter(|set| has_valid_data(kind, set)) {
            max.absorb(kind, SetSample::from_set(set, unit, false));
        }
    }

    if max.is_empty_for(kind) {
        return MaxValues {
            has_no_valid_values: true,
            ..MaxValues::default()
        };
    }

    max.volume = round2(max.volume);
    max
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reps_set(reps: u32, weight: f64, completed: bool) -> SetEntry {
        SetEntry {
            reps: Some(reps),
            weight: Some(weight),
            completed,
            ..SetEntry::default()
        }
    }

    #[test]
    fn single_reps_set_yields_all_three_metrics() {
        let max = compute_max_values(&[reps_set(5, 50.0, true)], ExerciseKind::Reps, WeightUnit::Kg);
        assert_eq!(max.weight, 50.0);
        assert_eq!(max.reps, 5);
        assert_eq!(max.volume, 250.0);
        assert!(!max.has_no_valid_values);
    }

    #[test]
    fn volume_is_best_single_set_not_total() {
        let sets = [reps_set(10, 100.0, true), reps_set(8, 110.0, true)];
        let max = compute_max_values(&sets, ExerciseKind::Reps, WeightUnit::Kg);
        assert_eq!(max.weight, 110.0);
        assert_eq!(max.reps, 10);
        assert_eq!(max.volume, 1000.0);
    }

    #[test]
    fn incomplete_sets_do_not_contribute() {
        let sets = [reps_set(10, 100.0, true), reps_set(12, 140.0, false)];
        let max = compute_max_values(&sets, ExerciseKind::Reps, WeightUnit::Kg);
        assert_eq!(max.weight, 100.0);
        assert_eq!(max.reps, 10);
    }

    #[test]
    fn nothing_completed_is_flagged() {
        let max = compute_max_values(&[reps_set(10, 100.0, false)], ExerciseKind::Reps, WeightUnit::Kg);
        assert!(max.has_no_valid_values);
        assert_eq!(max.value_for(MetricType::Weight), 0.0);
    }

    #[test]
    fn sets_without_reps_are_skipped_once_two_are_completed() {
        let sets = [
            reps_set(6, 80.0, true),
            SetEntry {
                weight: Some(200.0),
                completed: true,
                ..SetEntry::default()
            },
        ];
        let max = compute_max_values(&sets, ExerciseKind::Reps, WeightUnit::Kg);
        assert_eq!(max.weight, 80.0);
    }

    #[test]
    fn single_bodyweight_set_keeps_reps_only() {
        let sets = [SetEntry {
            reps: Some(12),
            completed: true,
            ..SetEntry::default()
        }];
        let max = compute_max_values(&sets, ExerciseKind::Reps, WeightUnit::Kg);
        assert_eq!(max.reps, 12);
        assert_eq!(max.weight, 0.0);
        assert_eq!(max.volume, 0.0);
        assert!(!max.has_no_valid_values);
    }

    #[test]
    fn single_set_uses_unrounded_conversion() {
        let sets = [reps_set(1, 0.005, true)];
        let max = compute_max_values(&sets, ExerciseKind::Reps, WeightUnit::Lb);
        assert!(max.weight > 0.0);

        let two = [reps_set(1, 0.005, true), reps_set(1, 0.004, true)];
        let max = compute_max_values(&two, ExerciseKind::Reps, WeightUnit::Lb);
        assert_eq!(max.weight, 0.0);
        assert_eq!(max.reps, 1);
    }

    #[test]
    fn pounds_are_compared_in_kg() {
        let max = compute_max_values(&[reps_set(5, 225.0, true), reps_set(5, 135.0, true)], ExerciseKind::Reps, WeightUnit::Lb);
        assert_eq!(max.weight, 102.06);
        assert_eq!(max.volume, 510.3);
    }

    #[test]
    fn distance_tracks_distance_and_time() {
        let sets = [
            SetEntry {
                distance: Some(5000),
                time: Some(1500),
                completed: true,
                ..SetEntry::default()
            },
            SetEntry {
                distance: Some(3000),
                time: Some(1700),
                completed: true,
                ..SetEntry::default()
            },
        ];
        let max = compute_max_values(&sets, ExerciseKind::Distance, WeightUnit::Kg);
        assert_eq!(max.distance, 5000);
        assert_eq!(max.time, 1700);
        assert_eq!(max.weight, 0.0);
    }

    #[test]
    fn time_ignores_weight_and_reps() {
        let sets = [SetEntry {
            time: Some(60),
            reps: Some(3),
            weight: Some(20.0),
            completed: true,
            ..SetEntry::default()
        }];
        let max = compute_max_values(&sets, ExerciseKind::Time, WeightUnit::Kg);
        assert_eq!(max.time, 60);
        assert_eq!(max.reps, 0);
        assert_eq!(max.weight, 0.0);
    }
}
