use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ExerciseEntry, TemplateSet};

/// Frozen copy of what was last loaded or saved. Replaced wholesale, never
/// edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub name: String,
    pub exercises: Vec<ExerciseEntry>,
}

impl SessionSnapshot {
    pub fn capture(name: &str, exercises: &[ExerciseEntry]) -> Self {
        Self {
            name: name.to_string(),
            exercises: exercises.to_vec(),
        }
    }
}

/// The part of an exercise a template save would persist.
#[derive(Debug, PartialEq)]
struct Persisted<'a> {
    exercise_id: &'a str,
    target_reps: Option<&'a str>,
    rest_seconds: u32,
    next_exercise_rest_seconds: u32,
    notes: Option<&'a str>,
    sets: Vec<TemplateSet>,
}

impl<'a> From<&'a ExerciseEntry> for Persisted<'a> {
    fn from(entry: &'a ExerciseEntry) -> Self {
        Self {
            exercise_id: &entry.exercise_id,
            target_reps: entry.target_reps.as_deref(),
            rest_seconds: entry.rest_seconds,
            next_exercise_rest_seconds: entry.next_exercise_rest_seconds,
            notes: entry.notes.as_deref(),
            sets: entry.sets.iter().map(TemplateSet::from).collect(),
        }
    }
}

/// Pure structural comparison of a snapshot against live state. Completion
/// flags are session progress, not template edits, and are ignored.
pub fn differs(snapshot: &SessionSnapshot, name: &str, exercises: &[ExerciseEntry]) -> bool {
    if snapshot.name != name || snapshot.exercises.len() != exercises.len() {
        return true;
    }

    snapshot
        .exercises
        .iter()
        .zip(exercises)
        .any(|(original, current)| Persisted::from(original) != Persisted::from(current))
}

/// Answers "has the session changed since it was loaded or last saved".
#[derive(Debug, Clone)]
pub struct DirtyStateTracker {
    snapshot: SessionSnapshot,
    grace: Duration,
    suppress_until: Option<DateTime<Utc>>,
}

impl DirtyStateTracker {
    pub fn new(snapshot: SessionSnapshot, grace: Duration) -> Self {
        Self {
            snapshot,
            grace,
            suppress_until: None,
        }
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    /// Installs the post-save snapshot and mutes dirty reports for the grace
    /// window while the store's reload settles.
    pub fn mark_saved(&mut self, snapshot: SessionSnapshot, now: DateTime<Utc>) {
        self.snapshot = snapshot;
        self.suppress_until = Some(now + self.grace);
    }

    pub fn is_dirty(&self, name: &str, exercises: &[ExerciseEntry], now: DateTime<Utc>) -> bool {
        if self.suppress_until.is_some_and(|until| now < until) {
            return false;
        }
        differs(&self.snapshot, name, exercises)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseDefinition, ExerciseKind, SetEntry};

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap()
    }

    fn leg_day() -> Vec<ExerciseEntry> {
        let squat = ExerciseDefinition {
            id: "squat".into(),
            name: "Squat".into(),
            kind: ExerciseKind::Reps,
        };
        let mut entry = ExerciseEntry::new(&squat, 120, 180);
        entry.sets = vec![
            SetEntry {
                reps: Some(5),
                weight: Some(100.0),
                ..SetEntry::default()
            },
            SetEntry {
                reps: Some(5),
                weight: Some(100.0),
                ..SetEntry::default()
            },
        ];
        entry.target_reps = Some("5".into());
        vec![entry]
    }

    fn tracker(exercises: &[ExerciseEntry]) -> DirtyStateTracker {
        DirtyStateTracker::new(
            SessionSnapshot::capture("Leg Day", exercises),
            Duration::milliseconds(1500),
        )
    }

    #[test]
    fn unchanged_session_is_clean() {
        let exercises = leg_day();
        assert!(!tracker(&exercises).is_dirty("Leg Day", &exercises, t0()));
    }

    #[test]
    fn changed_reps_is_dirty() {
        let mut exercises = leg_day();
        let tracker = tracker(&exercises);
        exercises[0].sets[1].reps = Some(6);
        assert!(tracker.is_dirty("Leg Day", &exercises, t0()));
    }

    #[test]
    fn completion_alone_is_not_a_change() {
        let mut exercises = leg_day();
        let tracker = tracker(&exercises);
        exercises[0].sets[0].completed = true;
        assert!(!tracker.is_dirty("Leg Day", &exercises, t0()));
    }

    #[test]
    fn rename_rest_notes_and_order_are_changes() {
        let exercises = leg_day();
        let tracker = tracker(&exercises);
        assert!(tracker.is_dirty("Leg Day 2", &exercises, t0()));

        let mut edited = exercises.clone();
        edited[0].next_exercise_rest_seconds = 60;
        assert!(tracker.is_dirty("Leg Day", &edited, t0()));

        let mut edited = exercises.clone();
        edited[0].notes = Some("belt".into());
        assert!(tracker.is_dirty("Leg Day", &edited, t0()));

        let mut edited = exercises.clone();
        edited[0].exercise_id = "front-squat".into();
        assert!(tracker.is_dirty("Leg Day", &edited, t0()));

        let mut edited = exercises.clone();
        edited[0].sets.pop();
        assert!(tracker.is_dirty("Leg Day", &edited, t0()));
    }

    #[test]
    fn snapshot_is_not_shared_with_live_state() {
        let mut exercises = leg_day();
        let tracker = tracker(&exercises);
        exercises[0].sets[0].weight = Some(105.0);
        assert_eq!(tracker.snapshot().exercises[0].sets[0].weight, Some(100.0));
    }

    #[test]
    fn save_grace_window_suppresses_then_expires() {
        let mut exercises = leg_day();
        let mut tracker = tracker(&exercises);
        exercises[0].rest_seconds = 60;
        tracker.mark_saved(SessionSnapshot::capture("Leg Day", &leg_day()), t0());

        assert!(!tracker.is_dirty("Leg Day", &exercises, t0() + Duration::milliseconds(500)));
        assert!(tracker.is_dirty("Leg Day", &exercises, t0() + Duration::milliseconds(1500)));
    }
}
