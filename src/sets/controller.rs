use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::{
    models::{ExerciseEntry, MetricType, PrCandidate, PrNotification},
    records::{
        beaten_records, compute_max_values, metrics_for, HistoricalRecords, MaxValues,
        ReconcileOutcome, SessionPrLedger,
    },
    timer::{TimerRequest, TimerState},
    units::WeightUnit,
};

use super::validation::{validate_for_completion, SetValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetError {
    #[error(transparent)]
    Validation(#[from] SetValidationError),
    #[error("exercise {0} is not part of this session")]
    UnknownExercise(usize),
    #[error("exercise {exercise_index} has no set {set_index}")]
    UnknownSet {
        exercise_index: usize,
        set_index: usize,
    },
    #[error("this workout is already finished")]
    SessionFinished,
}

/// What the timer should do as a result of a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "action")]
pub enum TimerAction {
    Keep,
    Start(TimerRequest),
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    pub completed: bool,
    pub max_values: MaxValues,
    pub new_records: Vec<PrCandidate>,
    pub notification: Option<PrNotification>,
    pub reconciled: Vec<(MetricType, ReconcileOutcome)>,
    pub timer: TimerAction,
}

/// Session state a toggle reads and mutates.
pub struct CompletionContext<'a> {
    pub exercises: &'a mut [ExerciseEntry],
    pub ledger: &'a mut SessionPrLedger,
    pub historical: &'a HistoricalRecords,
    pub active_timer: &'a TimerState,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct SetCompletionController {
    unit: WeightUnit,
    completion_ack_seconds: u32,
}

impl SetCompletionController {
    pub fn new(unit: WeightUnit, completion_ack_seconds: u32) -> Self {
        Self {
            unit,
            completion_ack_seconds,
        }
    }

    pub fn unit(&self) -> WeightUnit {
        self.unit
    }

    pub fn max_values(&self, entry: &ExerciseEntry) -> MaxValues {
        compute_max_values(&entry.sets, entry.kind, self.unit)
    }

    /// Flips one set between complete and incomplete.
    ///
    /// Completing validates first and leaves everything untouched on failure.
    pub fn toggle(
        &self,
        ctx: CompletionContext<'_>,
        exercise_index: usize,
        set_index: usize,
    ) -> Result<ToggleOutcome, SetError> {
        let entry = ctx
            .exercises
            .get(exercise_index)
            .ok_or(SetError::UnknownExercise(exercise_index))?;
        let set = entry.sets.get(set_index).ok_or(SetError::UnknownSet {
            exercise_index,
            set_index,
        })?;

        if set.completed {
            Ok(self.mark_incomplete(ctx, exercise_index, set_index))
        } else {
            validate_for_completion(entry.kind, set)?;
            Ok(self.mark_complete(ctx, exercise_index, set_index))
        }
    }

    fn mark_complete(
        &self,
        ctx: CompletionContext<'_>,
        exercise_index: usize,
        set_index: usize,
    ) -> ToggleOutcome {
        let entry = &mut ctx.exercises[exercise_index];
        entry.sets[set_index].completed = true;
        let exercise_done = entry.all_sets_completed();
        let rest_seconds = entry.rest_seconds;

        let pooled = pooled_entry(ctx.exercises, exercise_index);
        let (max_values, new_records, notification) =
            self.record_new_bests(&pooled, exercise_index, ctx.ledger, ctx.historical, ctx.now);

        let timer = if exercise_done {
            self.after_exercise_completed(ctx.exercises, exercise_index, ctx.active_timer)
        } else if rest_seconds > 0 {
            TimerAction::Start(TimerRequest::set_rest(exercise_index, set_index, rest_seconds))
        } else {
            TimerAction::Keep
        };

        ToggleOutcome {
            completed: true,
            max_values,
            new_records,
            notification,
            reconciled: Vec::new(),
            timer,
        }
    }

    /// Stores every metric of `entry` that beats the stored record and
    /// batches the ones not yet announced at this value.
    pub fn record_new_bests(
        &self,
        entry: &ExerciseEntry,
        exercise_index: usize,
        ledger: &mut SessionPrLedger,
        historical: &HistoricalRecords,
        now: DateTime<Utc>,
    ) -> (MaxValues, Vec<PrCandidate>, Option<PrNotification>) {
        let max_values = self.max_values(entry);
        let new_records = beaten_records(&entry.exercise_id, entry.kind, &max_values, historical);

        let mut to_announce = Vec::new();
        for record in &new_records {
            ledger.record_achieved(&entry.exercise_id, record.metric, record.value, now);
            if ledger.should_notify(&entry.exercise_id, record.metric, record.value) {
                ledger.record_notified(&entry.exercise_id, record.metric, record.value);
                to_announce.push(record.clone());
            }
        }

        let notification = (!to_announce.is_empty()).then(|| PrNotification {
            exercise_index,
            exercise_id: entry.exercise_id.clone(),
            exercise_name: entry.name.clone(),
            records: to_announce,
        });

        (max_values, new_records, notification)
    }

    /// Chooses the rest that follows a fully completed exercise. A rest timer
    /// for a set of that exercise never outlives its completion.
    pub fn after_exercise_completed(
        &self,
        exercises: &[ExerciseEntry],
        exercise_index: usize,
        active_timer: &TimerState,
    ) -> TimerAction {
        let request = match next_incomplete_exercise(exercises, exercise_index) {
            Some(next) => {
                let seconds = exercises[next].next_exercise_rest_seconds;
                (seconds > 0).then(|| TimerRequest::exercise_rest(exercise_index, Some(next), seconds))
            }
            None => (self.completion_ack_seconds > 0).then(|| {
                TimerRequest::exercise_rest(exercise_index, None, self.completion_ack_seconds)
            }),
        };

        match request {
            Some(request) => TimerAction::Start(request),
            None if active_timer.belongs_to_exercise(exercise_index) => TimerAction::Cancel,
            None => TimerAction::Keep,
        }
    }

    fn mark_incomplete(
        &self,
        ctx: CompletionContext<'_>,
        exercise_index: usize,
        set_index: usize,
    ) -> ToggleOutcome {
        ctx.exercises[exercise_index].sets[set_index].completed = false;

        let timer = if ctx.active_timer.triggered_by_set(exercise_index, set_index)
            || ctx.active_timer.triggered_by_exercise_completion(exercise_index)
        {
            TimerAction::Cancel
        } else {
            TimerAction::Keep
        };

        let pooled = pooled_entry(ctx.exercises, exercise_index);
        let max_values = self.max_values(&pooled);
        let reconciled = self.reconcile(&pooled, &max_values, ctx.ledger, ctx.historical);

        ToggleOutcome {
            completed: false,
            max_values,
            new_records: Vec::new(),
            notification: None,
            reconciled,
            timer,
        }
    }

    /// Re-derives every ledger entry of one exercise from its completed sets.
    pub fn reconcile_exercise(
        &self,
        entry: &ExerciseEntry,
        ledger: &mut SessionPrLedger,
        historical: &HistoricalRecords,
    ) -> Vec<(MetricType, ReconcileOutcome)> {
        let max_values = self.max_values(entry);
        self.reconcile(entry, &max_values, ledger, historical)
    }

    fn reconcile(
        &self,
        entry: &ExerciseEntry,
        max_values: &MaxValues,
        ledger: &mut SessionPrLedger,
        historical: &HistoricalRecords,
    ) -> Vec<(MetricType, ReconcileOutcome)> {
        metrics_for(entry.kind)
            .iter()
            .map(|&metric| {
                let mut outcome = ledger.reconcile_on_uncheck(&entry.exercise_id, metric, max_values);
                if let ReconcileOutcome::Downgraded { to, .. } = outcome {
                    // A lower value that no longer beats the stored record is not a record.
                    if !historical.is_beaten_by(&entry.exercise_id, metric, to) {
                        ledger.remove_metric(&entry.exercise_id, metric);
                        outcome = ReconcileOutcome::Removed;
                    }
                }
                (metric, outcome)
            })
            .collect()
    }
}

/// `exercises[exercise_index]` carrying the sets of every slot that holds the
/// same exercise. Records are kept per exercise, so maxima span all its slots.
pub fn pooled_entry(exercises: &[ExerciseEntry], exercise_index: usize) -> ExerciseEntry {
    let mut pooled = exercises[exercise_index].clone();
    for (index, other) in exercises.iter().enumerate() {
        if index != exercise_index && other.exercise_id == pooled.exercise_id {
            pooled.sets.extend(other.sets.iter().cloned());
        }
    }
    pooled
}

/// First exercise after `current` with an incomplete set, wrapping around to
/// the ones before it.
pub fn next_incomplete_exercise(exercises: &[ExerciseEntry], current: usize) -> Option<usize> {
    (current + 1..exercises.len())
        .chain(0..current.min(exercises.len()))
        .find(|&index| exercises[index].has_incomplete_set())
}
