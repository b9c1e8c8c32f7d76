pub mod dirty;

use std::{collections::BTreeSet, sync::Arc};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    clock::Clock,
    db::Database,
    events::{EngineEvent, EventSink},
    models::{
        ExerciseDefinition, ExerciseEntry, HistoricalPr, HistoryExercise, HistoryRecord,
        HistorySet, PrNotification, SessionAchievedPr, SetEntry, SetField, TemplateExercise,
        TemplateSet, WorkoutTemplate,
    },
    records::{HistoricalRecords, MaxValues, SessionPrLedger},
    sets::{
        pooled_entry, CompletionContext, SetCompletionController, SetError, TimerAction,
        ToggleOutcome,
    },
    settings::EngineSettings,
    timer::{
        AppPhase, PlatformNotifier, TickOutcome, TimerCoordinator, TimerKind, TimerRequest,
        TimerSnapshot, TimerState,
    },
    units::WeightUnit,
};

pub use dirty::{differs, DirtyStateTracker, SessionSnapshot};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Host-provided collaborators a session is wired to.
#[derive(Clone)]
pub struct SessionDeps {
    pub clock: Arc<dyn Clock>,
    pub notifier: Arc<dyn PlatformNotifier>,
    pub events: Arc<dyn EventSink>,
    pub manual_ticks: bool,
}

impl SessionDeps {
    pub fn new(
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn PlatformNotifier>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            clock,
            notifier,
            events,
            manual_ticks: false,
        }
    }

    /// The host calls [`WorkoutSession::tick`] itself instead of relying on
    /// the background ticker.
    pub fn with_manual_ticks(mut self) -> Self {
        self.manual_ticks = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseView {
    #[serde(flatten)]
    pub entry: ExerciseEntry,
    pub max_values: MaxValues,
    pub achieved: Vec<SessionAchievedPr>,
}

/// Everything the presentation layer renders for the running workout.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub workout_id: String,
    pub name: String,
    pub weight_unit: WeightUnit,
    pub exercises: Vec<ExerciseView>,
    pub timer: TimerSnapshot,
    pub session_achieved_prs: Vec<SessionAchievedPr>,
    pub dirty: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinishedWorkout {
    pub history: HistoryRecord,
    pub records: Vec<HistoricalPr>,
}

/// One workout in progress, from template load to finish.
pub struct WorkoutSession {
    workout_id: String,
    name: String,
    exercises: Vec<ExerciseEntry>,
    started_at: DateTime<Utc>,
    ledger: SessionPrLedger,
    historical: HistoricalRecords,
    completion: SetCompletionController,
    dirty: DirtyStateTracker,
    timer: TimerCoordinator,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    db: Database,
    settings: EngineSettings,
    pending_reconcile: BTreeSet<String>,
    finished: bool,
}

impl WorkoutSession {
    /// Starts a session from a stored template.
    pub async fn load(
        db: Database,
        template_id: &str,
        settings: EngineSettings,
        deps: SessionDeps,
    ) -> Result<Self> {
        let template = db
            .load_template(template_id)
            .await
            .with_context(|| format!("failed to load template {template_id}"))?
            .ok_or_else(|| anyhow!("template {template_id} does not exist"))?;

        let mut exercises = Vec::with_capacity(template.exercises.len());
        for planned in &template.exercises {
            let definition = resolve_definition(&db, &planned.exercise_id).await;
            let mut entry = ExerciseEntry::new(
                &definition,
                planned.rest_seconds,
                planned.next_exercise_rest_seconds,
            );
            entry.target_reps = planned.target_reps.clone();
            entry.notes = planned.notes.clone();
            if !planned.sets.is_empty() {
                entry.sets = planned.sets.iter().map(SetEntry::from).collect();
            }
            exercises.push(entry);
        }

        Self::assemble(db, template.id, template.name, exercises, settings, deps).await
    }

    /// Starts an ad hoc session with no exercises; saving it creates a new
    /// template.
    pub async fn start_empty(
        db: Database,
        name: &str,
        settings: EngineSettings,
        deps: SessionDeps,
    ) -> Result<Self> {
        let workout_id = Uuid::new_v4().to_string();
        Self::assemble(db, workout_id, name.to_string(), Vec::new(), settings, deps).await
    }

    async fn assemble(
        db: Database,
        workout_id: String,
        name: String,
        exercises: Vec<ExerciseEntry>,
        settings: EngineSettings,
        deps: SessionDeps,
    ) -> Result<Self> {
        let exercise_ids: BTreeSet<String> =
            exercises.iter().map(|entry| entry.exercise_id.clone()).collect();
        let records = db
            .load_personal_records(exercise_ids.into_iter().collect())
            .await
            .context("failed to load personal records")?;

        let mut timer = TimerCoordinator::new(
            deps.clock.clone(),
            deps.notifier,
            deps.events.clone(),
            settings.tick_interval(),
        );
        if deps.manual_ticks {
            timer = timer.with_manual_ticks();
        }
        timer = timer.with_debug_ticks(settings.debug);

        log_info!(
            "workout {workout_id} started with {} exercises and {} stored records",
            exercises.len(),
            records.len()
        );

        Ok(Self {
            dirty: DirtyStateTracker::new(
                SessionSnapshot::capture(&name, &exercises),
                settings.dirty_grace(),
            ),
            completion: SetCompletionController::new(
                settings.weight_unit,
                settings.completion_ack_seconds,
            ),
            historical: HistoricalRecords::from_records(records),
            started_at: deps.clock.now(),
            ledger: SessionPrLedger::new(),
            pending_reconcile: BTreeSet::new(),
            finished: false,
            events: deps.events,
            clock: deps.clock,
            workout_id,
            name,
            exercises,
            timer,
            db,
            settings,
        })
    }

    pub fn workout_id(&self) -> &str {
        &self.workout_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exercises(&self) -> &[ExerciseEntry] {
        &self.exercises
    }

    pub fn ledger(&self) -> &SessionPrLedger {
        &self.ledger
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn ensure_open(&self) -> Result<(), SetError> {
        if self.finished {
            return Err(SetError::SessionFinished);
        }
        Ok(())
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.flush_pending();
        self.name = name.into();
    }

    pub async fn toggle_set(
        &mut self,
        exercise_index: usize,
        set_index: usize,
    ) -> Result<ToggleOutcome, SetError> {
        self.ensure_open()?;
        self.flush_pending();
        let active_timer = self.timer.get_state().await;

        let result = self.completion.toggle(
            CompletionContext {
                exercises: &mut self.exercises,
                ledger: &mut self.ledger,
                historical: &self.historical,
                active_timer: &active_timer,
                now: self.clock.now(),
            },
            exercise_index,
            set_index,
        );

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(SetError::Validation(err)) => {
                self.events.emit(EngineEvent::ValidationFailed {
                    exercise_index,
                    set_index,
                    message: err.to_string(),
                });
                return Err(err.into());
            }
            Err(err) => return Err(err),
        };

        self.apply_timer_action(&outcome.timer).await;
        if let Some(notification) = &outcome.notification {
            self.announce(notification);
        }
        Ok(outcome)
    }

    /// Edits one field of a set. A completed set is re-evaluated right away
    /// so the ledger keeps matching its data.
    pub fn update_set(
        &mut self,
        exercise_index: usize,
        set_index: usize,
        field: SetField,
    ) -> Result<Option<PrNotification>, SetError> {
        self.ensure_open()?;
        self.flush_pending();
        let entry = self
            .exercises
            .get_mut(exercise_index)
            .ok_or(SetError::UnknownExercise(exercise_index))?;
        let completed = {
            let set = entry.sets.get_mut(set_index).ok_or(SetError::UnknownSet {
                exercise_index,
                set_index,
            })?;
            field.apply(set);
            set.completed
        };
        if !completed {
            return Ok(None);
        }

        let pooled = pooled_entry(&self.exercises, exercise_index);
        self.completion
            .reconcile_exercise(&pooled, &mut self.ledger, &self.historical);
        let (_, _, notification) = self.completion.record_new_bests(
            &pooled,
            exercise_index,
            &mut self.ledger,
            &self.historical,
            self.clock.now(),
        );
        if let Some(notification) = &notification {
            self.announce(notification);
        }
        Ok(notification)
    }

    /// Appends a set pre-filled from the last one. Returns its index.
    pub fn add_set(&mut self, exercise_index: usize) -> Result<usize, SetError> {
        self.ensure_open()?;
        self.flush_pending();
        let entry = self
            .exercises
            .get_mut(exercise_index)
            .ok_or(SetError::UnknownExercise(exercise_index))?;
        let next = entry
            .sets
            .last()
            .map(SetEntry::carry_forward)
            .unwrap_or_default();
        entry.sets.push(next);
        Ok(entry.sets.len() - 1)
    }

    /// Removes a set. Ledger reconciliation for a completed set is deferred
    /// until the next mutation, `view`, `finish` or [`Self::flush_pending`].
    ///
    /// Dropping the last open set completes the exercise, so its set rest
    /// gives way to whatever follows a completion.
    pub async fn remove_set(
        &mut self,
        exercise_index: usize,
        set_index: usize,
    ) -> Result<SetEntry, SetError> {
        self.ensure_open()?;
        self.flush_pending();
        let entry = self
            .exercises
            .get_mut(exercise_index)
            .ok_or(SetError::UnknownExercise(exercise_index))?;
        if set_index >= entry.sets.len() {
            return Err(SetError::UnknownSet {
                exercise_index,
                set_index,
            });
        }

        let removed = entry.sets.remove(set_index);
        let now_complete = !removed.completed && entry.all_sets_completed();
        if removed.completed {
            self.pending_reconcile.insert(entry.exercise_id.clone());
        }
        self.timer
            .adjust_trigger(|timer| timer.after_set_removed(exercise_index, set_index))
            .await;

        if now_complete {
            let active_timer = self.timer.get_state().await;
            if active_timer.kind == TimerKind::Set
                && active_timer.belongs_to_exercise(exercise_index)
            {
                let action = self.completion.after_exercise_completed(
                    &self.exercises,
                    exercise_index,
                    &active_timer,
                );
                log_info!("exercise {exercise_index} completed by removing set {set_index}");
                self.apply_timer_action(&action).await;
            }
        }
        Ok(removed)
    }

    pub fn has_pending_reconcile(&self) -> bool {
        !self.pending_reconcile.is_empty()
    }

    pub fn flush_pending(&mut self) {
        for exercise_id in std::mem::take(&mut self.pending_reconcile) {
            self.reconcile_exercise_id(&exercise_id);
        }
    }

    /// Re-derives the ledger for `exercise_id` from every entry still using
    /// it, or drops it when none is left.
    fn reconcile_exercise_id(&mut self, exercise_id: &str) {
        let Some(index) = self
            .exercises
            .iter()
            .position(|entry| entry.exercise_id == exercise_id)
        else {
            self.ledger.clear_exercise(exercise_id);
            return;
        };

        let combined = pooled_entry(&self.exercises, index);
        let outcomes = self
            .completion
            .reconcile_exercise(&combined, &mut self.ledger, &self.historical);
        log_info!("reconciled records for {exercise_id}: {outcomes:?}");
    }

    /// Appends an exercise from the catalogue. Returns its index.
    pub async fn add_exercise(&mut self, exercise_id: &str) -> Result<usize> {
        self.ensure_open()?;
        self.flush_pending();
        let definition = resolve_definition(&self.db, exercise_id).await;
        self.cache_records(&definition.id).await?;

        self.exercises.push(ExerciseEntry::new(
            &definition,
            self.settings.default_rest_seconds,
            self.settings.default_next_exercise_rest_seconds,
        ));
        Ok(self.exercises.len() - 1)
    }

    pub async fn remove_exercise(&mut self, exercise_index: usize) -> Result<ExerciseEntry, SetError> {
        self.ensure_open()?;
        self.flush_pending();
        if exercise_index >= self.exercises.len() {
            return Err(SetError::UnknownExercise(exercise_index));
        }

        let removed = self.exercises.remove(exercise_index);
        self.reconcile_exercise_id(&removed.exercise_id);
        self.timer
            .adjust_trigger(|timer| timer.after_exercise_removed(exercise_index))
            .await;
        Ok(removed)
    }

    /// Swaps the exercise at `exercise_index` for another one, keeping its
    /// slot, rest settings and set count. Progress on the old one is dropped.
    pub async fn replace_exercise(&mut self, exercise_index: usize, exercise_id: &str) -> Result<()> {
        self.ensure_open()?;
        self.flush_pending();
        if exercise_index >= self.exercises.len() {
            return Err(SetError::UnknownExercise(exercise_index).into());
        }

        let definition = resolve_definition(&self.db, exercise_id).await;
        self.cache_records(&definition.id).await?;

        let entry = &mut self.exercises[exercise_index];
        let previous_id = std::mem::replace(&mut entry.exercise_id, definition.id);
        entry.name = definition.name;
        entry.kind = definition.kind;
        entry.sets = vec![SetEntry::default(); entry.sets.len().max(1)];

        self.reconcile_exercise_id(&previous_id);
        self.timer
            .adjust_trigger(|timer| !timer.belongs_to_exercise(exercise_index))
            .await;
        Ok(())
    }

    pub async fn move_exercise(&mut self, from: usize, to: usize) -> Result<(), SetError> {
        self.ensure_open()?;
        self.flush_pending();
        let len = self.exercises.len();
        if from >= len {
            return Err(SetError::UnknownExercise(from));
        }
        if to >= len {
            return Err(SetError::UnknownExercise(to));
        }

        let entry = self.exercises.remove(from);
        self.exercises.insert(to, entry);
        self.timer
            .adjust_trigger(|timer| timer.after_exercise_moved(from, to))
            .await;
        Ok(())
    }

    /// Starts a rest countdown by hand, using the exercise's configured rest
    /// unless `seconds` overrides it.
    pub async fn start_rest_timer(
        &self,
        exercise_index: usize,
        seconds: Option<u32>,
    ) -> Result<TimerState> {
        self.ensure_open()?;
        let entry = self
            .exercises
            .get(exercise_index)
            .ok_or(SetError::UnknownExercise(exercise_index))?;
        self.timer
            .start_timer(TimerRequest {
                kind: TimerKind::Set,
                seconds: seconds.unwrap_or(entry.rest_seconds),
                exercise_index,
                set_index: None,
                next_exercise_index: None,
            })
            .await
    }

    pub async fn cancel_timer(&self) {
        self.timer.cancel_timer().await;
    }

    pub async fn tick(&self) -> TickOutcome {
        self.timer.tick().await
    }

    pub async fn on_app_state_change(&self, phase: AppPhase) {
        self.timer.on_app_state_change(phase).await;
    }

    pub async fn timer_snapshot(&self) -> TimerSnapshot {
        self.timer.get_snapshot().await
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
            .is_dirty(&self.name, &self.exercises, self.clock.now())
    }

    pub fn to_template(&self) -> WorkoutTemplate {
        WorkoutTemplate {
            id: self.workout_id.clone(),
            name: self.name.clone(),
            exercises: self
                .exercises
                .iter()
                .map(|entry| TemplateExercise {
                    exercise_id: entry.exercise_id.clone(),
                    target_reps: entry.target_reps.clone(),
                    rest_seconds: entry.rest_seconds,
                    next_exercise_rest_seconds: entry.next_exercise_rest_seconds,
                    notes: entry.notes.clone(),
                    sets: entry.sets.iter().map(TemplateSet::from).collect(),
                })
                .collect(),
        }
    }

    /// Writes the current layout back as the template and resets the dirty
    /// baseline.
    pub async fn save_template(&mut self) -> Result<WorkoutTemplate> {
        self.flush_pending();
        let template = self.to_template();
        self.db
            .save_template(&template)
            .await
            .with_context(|| format!("failed to save template {}", template.id))?;

        self.dirty.mark_saved(
            SessionSnapshot::capture(&self.name, &self.exercises),
            self.clock.now(),
        );
        log_info!("template {} saved", template.id);
        Ok(template)
    }

    pub async fn view(&mut self) -> SessionView {
        self.flush_pending();
        let exercises = self
            .exercises
            .iter()
            .map(|entry| ExerciseView {
                max_values: self.completion.max_values(entry),
                achieved: self
                    .ledger
                    .achieved_for_exercise(&entry.exercise_id)
                    .cloned()
                    .collect(),
                entry: entry.clone(),
            })
            .collect();

        SessionView {
            workout_id: self.workout_id.clone(),
            name: self.name.clone(),
            weight_unit: self.completion.unit(),
            exercises,
            timer: self.timer.get_snapshot().await,
            session_achieved_prs: self.ledger.all_achieved(),
            dirty: self.is_dirty(),
        }
    }

    /// Stores the history record and every session record in one write.
    ///
    /// On failure the session is left exactly as it was, so calling `finish`
    /// again retries with the same data.
    pub async fn finish(&mut self) -> Result<FinishedWorkout> {
        if self.finished {
            return Err(anyhow!("workout {} is already finished", self.workout_id));
        }
        self.flush_pending();

        let now = self.clock.now();
        let history = self.history_record(now);
        let records: Vec<HistoricalPr> = self
            .ledger
            .all_achieved()
            .into_iter()
            .map(|achieved| HistoricalPr {
                exercise_id: achieved.exercise_id,
                metric: achieved.metric,
                value: achieved.value,
                date: achieved.timestamp,
                history_record_id: Some(history.id.clone()),
            })
            .collect();

        if let Err(err) = self.db.finish_workout(&history, &records).await {
            log_error!("failed to store workout {}: {err:#}", self.workout_id);
            return Err(err.context("failed to save finished workout"));
        }

        self.timer.cancel_timer().await;
        self.historical.extend(records.iter().cloned());
        self.finished = true;
        log_info!(
            "workout {} finished: history {} with {} records",
            self.workout_id,
            history.id,
            records.len()
        );

        Ok(FinishedWorkout { history, records })
    }

    fn history_record(&self, now: DateTime<Utc>) -> HistoryRecord {
        let unit = self.completion.unit();
        let exercises = self
            .exercises
            .iter()
            .filter_map(|entry| {
                let sets: Vec<HistorySet> = entry
                    .completed_sets()
                    .map(|set| HistorySet {
                        reps: set.reps,
                        weight: set.weight.map(|weight| unit.to_canonical(weight)),
                        time: set.time,
                        distance: set.distance,
                    })
                    .collect();
                (!sets.is_empty()).then(|| HistoryExercise {
                    exercise_id: entry.exercise_id.clone(),
                    sets,
                })
            })
            .collect();

        HistoryRecord {
            id: Uuid::new_v4().to_string(),
            workout_id: self.workout_id.clone(),
            name: self.name.clone(),
            date: now,
            duration_seconds: u64::try_from((now - self.started_at).num_seconds()).unwrap_or(0),
            exercises,
        }
    }

    async fn cache_records(&mut self, exercise_id: &str) -> Result<()> {
        let records = self
            .db
            .load_personal_records(vec![exercise_id.to_string()])
            .await
            .with_context(|| format!("failed to load records for {exercise_id}"))?;
        self.historical.extend(records);
        Ok(())
    }

    async fn apply_timer_action(&self, action: &TimerAction) {
        match action {
            TimerAction::Start(request) => {
                if let Err(err) = self.timer.start_timer(request.clone()).await {
                    log_warn!("rest timer not started: {err:#}");
                }
            }
            TimerAction::Cancel => self.timer.cancel_timer().await,
            TimerAction::Keep => {}
        }
    }

    fn announce(&self, notification: &PrNotification) {
        log_info!(
            "{} new record(s) for {}",
            notification.records.len(),
            notification.exercise_name
        );
        self.events
            .emit(EngineEvent::PersonalRecords(notification.clone()));
    }
}

async fn resolve_definition(db: &Database, exercise_id: &str) -> ExerciseDefinition {
    match db.get_exercise(exercise_id).await {
        Ok(Some(definition)) => definition,
        Ok(None) => {
            log_warn!("exercise {exercise_id} no longer exists, showing a placeholder");
            ExerciseDefinition::placeholder(exercise_id)
        }
        Err(err) => {
            log_warn!("failed to look up exercise {exercise_id}, showing a placeholder: {err:#}");
            ExerciseDefinition::placeholder(exercise_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        events::NoopEventSink,
        models::{ExerciseKind, MetricType},
        timer::SilentNotifier,
    };
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap()
    }

    async fn session_with(sets: Vec<(u32, f64)>) -> (TempDir, WorkoutSession) {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path().join("repflow.db")).unwrap();
        db.upsert_exercise(&ExerciseDefinition {
            id: "bench".into(),
            name: "Bench Press".into(),
            kind: ExerciseKind::Reps,
        })
        .await
        .unwrap();
        db.create_template(&WorkoutTemplate {
            id: "push".into(),
            name: "Push".into(),
            exercises: vec![TemplateExercise {
                exercise_id: "bench".into(),
                target_reps: Some("8-10".into()),
                rest_seconds: 90,
                next_exercise_rest_seconds: 120,
                notes: None,
                sets: sets
                    .into_iter()
                    .map(|(reps, weight)| TemplateSet {
                        reps: Some(reps),
                        weight: Some(weight),
                        ..TemplateSet::default()
                    })
                    .collect(),
            }],
        })
        .await
        .unwrap();

        let deps = SessionDeps::new(
            Arc::new(ManualClock::new(t0())),
            Arc::new(SilentNotifier),
            Arc::new(NoopEventSink),
        )
        .with_manual_ticks();
        let session = WorkoutSession::load(db, "push", EngineSettings::default(), deps)
            .await
            .unwrap();
        (dir, session)
    }

    fn weight_record(session: &WorkoutSession) -> Option<f64> {
        session
            .ledger()
            .achieved("bench", MetricType::Weight)
            .map(|record| record.value)
    }

    #[tokio::test]
    async fn removing_a_completed_set_reconciles_on_next_view() {
        let (_dir, mut session) = session_with(vec![(10, 100.0), (8, 110.0), (6, 90.0)]).await;
        session.toggle_set(0, 0).await.unwrap();
        session.toggle_set(0, 1).await.unwrap();
        assert_eq!(weight_record(&session), Some(110.0));

        session.remove_set(0, 1).await.unwrap();
        assert!(session.has_pending_reconcile());
        assert_eq!(weight_record(&session), Some(110.0));

        let view = session.view().await;
        assert!(!session.has_pending_reconcile());
        assert_eq!(weight_record(&session), Some(100.0));
        assert_eq!(view.exercises[0].max_values.weight, 100.0);
    }

    #[tokio::test]
    async fn editing_a_completed_set_moves_its_record() {
        let (_dir, mut session) = session_with(vec![(10, 100.0), (10, 100.0)]).await;
        session.toggle_set(0, 0).await.unwrap();

        let raised = session
            .update_set(0, 0, SetField::Weight(Some(105.0)))
            .unwrap();
        assert!(raised.is_some());
        assert_eq!(weight_record(&session), Some(105.0));

        session
            .update_set(0, 0, SetField::Weight(Some(95.0)))
            .unwrap();
        assert_eq!(weight_record(&session), Some(95.0));
    }

    #[tokio::test]
    async fn editing_an_open_set_only_changes_data() {
        let (_dir, mut session) = session_with(vec![(10, 100.0)]).await;
        let notice = session.update_set(0, 0, SetField::Reps(Some(12))).unwrap();
        assert!(notice.is_none());
        assert!(session.ledger().is_empty());
        assert!(session.is_dirty());
    }

    #[tokio::test]
    async fn added_set_copies_the_previous_one() {
        let (_dir, mut session) = session_with(vec![(8, 80.0)]).await;
        session.toggle_set(0, 0).await.unwrap();
        let index = session.add_set(0).unwrap();
        let added = &session.exercises()[0].sets[index];
        assert_eq!(added.reps, Some(8));
        assert_eq!(added.weight, Some(80.0));
        assert!(!added.completed);
    }

    #[tokio::test]
    async fn removing_the_triggering_set_stops_its_timer() {
        let (_dir, mut session) = session_with(vec![(10, 100.0), (10, 100.0), (10, 100.0)]).await;
        session.toggle_set(0, 1).await.unwrap();
        assert!(session.timer_snapshot().await.state.is_active());

        session.remove_set(0, 0).await.unwrap();
        let snapshot = session.timer_snapshot().await;
        assert_eq!(snapshot.state.set_index, Some(0));

        session.remove_set(0, 0).await.unwrap();
        assert!(!session.timer_snapshot().await.state.is_active());
    }

    #[tokio::test]
    async fn bad_indices_are_rejected() {
        let (_dir, mut session) = session_with(vec![(10, 100.0)]).await;
        assert_eq!(
            session.toggle_set(4, 0).await.unwrap_err(),
            SetError::UnknownExercise(4)
        );
        assert_eq!(
            session.remove_set(0, 3).await.unwrap_err(),
            SetError::UnknownSet {
                exercise_index: 0,
                set_index: 3
            }
        );
        assert_eq!(
            session.move_exercise(0, 2).await.unwrap_err(),
            SetError::UnknownExercise(2)
        );
    }

    #[tokio::test]
    async fn finish_twice_is_refused() {
        let (_dir, mut session) = session_with(vec![(5, 50.0)]).await;
        session.toggle_set(0, 0).await.unwrap();
        session.finish().await.unwrap();
        assert!(session.is_finished());
        assert!(session.finish().await.is_err());
    }

    #[tokio::test]
    async fn finished_session_refuses_further_edits() {
        let (_dir, mut session) = session_with(vec![(5, 50.0), (5, 50.0)]).await;
        session.toggle_set(0, 0).await.unwrap();
        session.finish().await.unwrap();

        assert_eq!(
            session.toggle_set(0, 1).await.unwrap_err(),
            SetError::SessionFinished
        );
        assert_eq!(
            session.remove_set(0, 1).await.unwrap_err(),
            SetError::SessionFinished
        );
        assert_eq!(session.add_set(0).unwrap_err(), SetError::SessionFinished);
        assert!(session.start_rest_timer(0, Some(30)).await.is_err());
        assert!(session.add_exercise("bench").await.is_err());
        assert!(!session.timer_snapshot().await.state.is_active());
        assert_eq!(session.exercises()[0].sets.len(), 2);
    }

    #[tokio::test]
    async fn dropping_the_last_open_set_completes_the_exercise() {
        let (_dir, mut session) = session_with(vec![(10, 100.0), (10, 100.0)]).await;
        session.toggle_set(0, 0).await.unwrap();
        assert!(session.timer_snapshot().await.state.triggered_by_set(0, 0));

        session.remove_set(0, 1).await.unwrap();
        assert!(session.exercises()[0].all_sets_completed());

        let state = session.timer_snapshot().await.state;
        assert!(state.triggered_by_exercise_completion(0));
        assert_eq!(state.next_exercise_index, None);
        assert_eq!(state.total_seconds, 3);
    }

    #[tokio::test]
    async fn same_exercise_twice_shares_one_record() {
        let (_dir, mut session) = session_with(vec![(5, 120.0)]).await;
        session.toggle_set(0, 0).await.unwrap();
        assert_eq!(weight_record(&session), Some(120.0));

        let second = session.add_exercise("bench").await.unwrap();
        session.update_set(second, 0, SetField::Reps(Some(5))).unwrap();
        session
            .update_set(second, 0, SetField::Weight(Some(100.0)))
            .unwrap();
        let outcome = session.toggle_set(second, 0).await.unwrap();
        assert_eq!(outcome.max_values.weight, 120.0);
        assert_eq!(weight_record(&session), Some(120.0));

        session
            .update_set(second, 0, SetField::Weight(Some(130.0)))
            .unwrap();
        assert_eq!(weight_record(&session), Some(130.0));
        session
            .update_set(second, 0, SetField::Weight(Some(90.0)))
            .unwrap();
        assert_eq!(weight_record(&session), Some(120.0));

        session.toggle_set(0, 0).await.unwrap();
        assert_eq!(weight_record(&session), Some(90.0));
    }
}
