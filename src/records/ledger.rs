use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{MetricType, SessionAchievedPr, SessionNotifiedPr};

use super::MaxValues;

type Key = (String, MetricType);

fn key(exercise_id: &str, metric: MetricType) -> Key {
    (exercise_id.to_string(), metric)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum ReconcileOutcome {
    Unchanged,
    Downgraded { from: f64, to: f64 },
    Removed,
}

/// Records achieved and already-announced during the running session.
///
/// The achieved value for a metric always equals the best value among the
/// currently completed sets; a metric no completed set supports has no entry
/// at all.
#[derive(Debug, Clone, Default)]
pub struct SessionPrLedger {
    achieved: BTreeMap<Key, SessionAchievedPr>,
    notified: BTreeMap<Key, SessionNotifiedPr>,
}

impl SessionPrLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_achieved(
        &mut self,
        exercise_id: &str,
        metric: MetricType,
        value: f64,
        at: DateTime<Utc>,
    ) {
        self.achieved.insert(
            key(exercise_id, metric),
            SessionAchievedPr {
                exercise_id: exercise_id.to_string(),
                metric,
                value,
                timestamp: at,
            },
        );
    }

    pub fn should_notify(&self, exercise_id: &str, metric: MetricType, value: f64) -> bool {
        match self.notified.get(&key(exercise_id, metric)) {
            None => true,
            Some(prior) if prior.value < value => true,
            Some(prior) => prior.value == value && !prior.notified_this_session,
        }
    }

    pub fn record_notified(&mut self, exercise_id: &str, metric: MetricType, value: f64) {
        self.notified.insert(
            key(exercise_id, metric),
            SessionNotifiedPr {
                exercise_id: exercise_id.to_string(),
                metric,
                value,
                notified_this_session: true,
            },
        );
    }

    /// Brings one metric back in line with the sets still completed.
    pub fn reconcile_on_uncheck(
        &mut self,
        exercise_id: &str,
        metric: MetricType,
        new_max: &MaxValues,
    ) -> ReconcileOutcome {
        let key = key(exercise_id, metric);
        let recomputed = new_max.value_for(metric);

        if recomputed <= 0.0 {
            let had_entry = self.achieved.remove(&key).is_some();
            let had_notice = self.notified.remove(&key).is_some();
            return if had_entry || had_notice {
                ReconcileOutcome::Removed
            } else {
                ReconcileOutcome::Unchanged
            };
        }

        let Some(achieved) = self.achieved.get_mut(&key) else {
            return ReconcileOutcome::Unchanged;
        };
        if recomputed >= achieved.value {
            return ReconcileOutcome::Unchanged;
        }

        let from = achieved.value;
        achieved.value = recomputed;
        if let Some(notice) = self.notified.get_mut(&key) {
            notice.value = recomputed;
            notice.notified_this_session = false;
        }

        ReconcileOutcome::Downgraded {
            from,
            to: recomputed,
        }
    }

    /// Drops a single metric, e.g. when a downgraded value no longer beats
    /// the stored record.
    pub fn remove_metric(&mut self, exercise_id: &str, metric: MetricType) {
        let key = key(exercise_id, metric);
        self.achieved.remove(&key);
        self.notified.remove(&key);
    }

    pub fn clear_exercise(&mut self, exercise_id: &str) {
        self.achieved.retain(|(id, _), _| id != exercise_id);
        self.notified.retain(|(id, _), _| id != exercise_id);
    }

    pub fn achieved(&self, exercise_id: &str, metric: MetricType) -> Option<&SessionAchievedPr> {
        self.achieved.get(&key(exercise_id, metric))
    }

    pub fn notified(&self, exercise_id: &str, metric: MetricType) -> Option<&SessionNotifiedPr> {
        self.notified.get(&key(exercise_id, metric))
    }

    pub fn achieved_for_exercise<'a>(
        &'a self,
        exercise_id: &'a str,
    ) -> impl Iterator<Item = &'a SessionAchievedPr> + 'a {
        self.achieved
            .values()
            .filter(move |record| record.exercise_id == exercise_id)
    }

    pub fn all_achieved(&self) -> Vec<SessionAchievedPr> {
        self.achieved.values().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.achieved.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap()
    }

    fn weight_max(weight: f64) -> MaxValues {
        MaxValues {
            weight,
            reps: 10,
            volume: weight * 10.0,
            ..MaxValues::default()
        }
    }

    #[test]
    fn first_notice_is_allowed_and_repeat_is_suppressed() {
        let mut ledger = SessionPrLedger::new();
        assert!(ledger.should_notify("bench", MetricType::Weight, 100.0));
        ledger.record_notified("bench", MetricType::Weight, 100.0);
        assert!(!ledger.should_notify("bench", MetricType::Weight, 100.0));
        assert!(!ledger.should_notify("bench", MetricType::Weight, 95.0));
        assert!(ledger.should_notify("bench", MetricType::Weight, 102.5));
    }

    #[test]
    fn downgrade_resets_notice_flag() {
        let mut ledger = SessionPrLedger::new();
        ledger.record_achieved("bench", MetricType::Weight, 110.0, now());
        ledger.record_notified("bench", MetricType::Weight, 110.0);

        let outcome = ledger.reconcile_on_uncheck("bench", MetricType::Weight, &weight_max(100.0));
        assert_eq!(outcome, ReconcileOutcome::Downgraded { from: 110.0, to: 100.0 });
        assert_eq!(ledger.achieved("bench", MetricType::Weight).map(|r| r.value), Some(100.0));

        let notice = ledger.notified("bench", MetricType::Weight).unwrap();
        assert_eq!(notice.value, 100.0);
        assert!(!notice.notified_this_session);
        assert!(ledger.should_notify("bench", MetricType::Weight, 100.0));
    }

    #[test]
    fn zero_max_removes_rather_than_zeroing() {
        let mut ledger = SessionPrLedger::new();
        ledger.record_achieved("bench", MetricType::Weight, 110.0, now());
        ledger.record_notified("bench", MetricType::Weight, 110.0);

        let outcome = ledger.reconcile_on_uncheck("bench", MetricType::Weight, &MaxValues::default());
        assert_eq!(outcome, ReconcileOutcome::Removed);
        assert!(ledger.achieved("bench", MetricType::Weight).is_none());
        assert!(ledger.notified("bench", MetricType::Weight).is_none());
    }

    #[test]
    fn higher_or_equal_max_leaves_entry_alone() {
        let mut ledger = SessionPrLedger::new();
        ledger.record_achieved("bench", MetricType::Weight, 100.0, now());
        let outcome = ledger.reconcile_on_uncheck("bench", MetricType::Weight, &weight_max(100.0));
        assert_eq!(outcome, ReconcileOutcome::Unchanged);
    }

    #[test]
    fn clear_exercise_only_touches_that_exercise() {
        let mut ledger = SessionPrLedger::new();
        ledger.record_achieved("bench", MetricType::Weight, 100.0, now());
        ledger.record_achieved("squat", MetricType::Weight, 140.0, now());
        ledger.record_notified("bench", MetricType::Weight, 100.0);

        ledger.clear_exercise("bench");
        assert!(ledger.achieved("bench", MetricType::Weight).is_none());
        assert!(ledger.notified("bench", MetricType::Weight).is_none());
        assert_eq!(ledger.all_achieved().len(), 1);
    }
}
