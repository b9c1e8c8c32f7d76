use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimerKind {
    /// Rest between two sets of the same exercise.
    #[default]
    Set,
    /// Rest before the next exercise, or the workout-complete acknowledgement.
    Exercise,
}

/// What a caller wants counted down, and which set or exercise asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerRequest {
    pub kind: TimerKind,
    pub seconds: u32,
    pub exercise_index: usize,
    pub set_index: Option<usize>,
    pub next_exercise_index: Option<usize>,
}

impl TimerRequest {
    pub fn set_rest(exercise_index: usize, set_index: usize, seconds: u32) -> Self {
        Self {
            kind: TimerKind::Set,
            seconds,
            exercise_index,
            set_index: Some(set_index),
            next_exercise_index: None,
        }
    }

    pub fn exercise_rest(exercise_index: usize, next_exercise_index: Option<usize>, seconds: u32) -> Self {
        Self {
            kind: TimerKind::Exercise,
            seconds,
            exercise_index,
            set_index: None,
            next_exercise_index,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub status: TimerStatus,
    pub kind: TimerKind,
    pub total_seconds: u32,
    /// Last value computed from `started_at`; refreshed on every tick.
    pub remaining_seconds: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub exercise_index: Option<usize>,
    pub set_index: Option<usize>,
    pub next_exercise_index: Option<usize>,
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Remaining whole seconds at `now`, derived from the start timestamp
    /// rather than from counted ticks. Never negative.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> u32 {
        match (self.status, self.started_at) {
            (TimerStatus::Running, Some(started_at)) => {
                let elapsed_ms = (now - started_at).num_milliseconds().max(0);
                let elapsed_secs = elapsed_ms / 1000;
                let remaining = i64::from(self.total_seconds) - elapsed_secs;
                cmp::max(remaining, 0) as u32
            }
            _ => 0,
        }
    }

    pub fn sync_remaining(&mut self, now: DateTime<Utc>) -> u32 {
        if self.is_active() {
            self.remaining_seconds = self.remaining_at(now);
        }
        self.remaining_seconds
    }

    pub fn begin(&mut self, request: &TimerRequest, now: DateTime<Utc>) {
        *self = Self {
            status: TimerStatus::Running,
            kind: request.kind,
            total_seconds: request.seconds,
            remaining_seconds: request.seconds,
            started_at: Some(now),
            exercise_index: Some(request.exercise_index),
            set_index: request.set_index,
            next_exercise_index: request.next_exercise_index,
        };
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }

    pub fn triggered_by_set(&self, exercise_index: usize, set_index: usize) -> bool {
        self.is_active()
            && self.kind == TimerKind::Set
            && self.exercise_index == Some(exercise_index)
            && self.set_index == Some(set_index)
    }

    /// True for an inter-exercise timer started because `exercise_index`
    /// became fully complete.
    pub fn triggered_by_exercise_completion(&self, exercise_index: usize) -> bool {
        self.is_active() && self.kind == TimerKind::Exercise && self.exercise_index == Some(exercise_index)
    }

    pub fn belongs_to_exercise(&self, exercise_index: usize) -> bool {
        self.is_active() && self.exercise_index == Some(exercise_index)
    }

    /// Follows a set removal. Returns false when the removed set was the
    /// trigger and the timer must go.
    pub fn after_set_removed(&mut self, exercise_index: usize, set_index: usize) -> bool {
        if !self.is_active() || self.exercise_index != Some(exercise_index) {
            return true;
        }
        match self.set_index {
            Some(current) if current == set_index => false,
            Some(current) if current > set_index => {
                self.set_index = Some(current - 1);
                true
            }
            _ => true,
        }
    }

    /// Follows an exercise removal. The timer goes with its trigger; an
    /// advance target that disappeared is dropped.
    pub fn after_exercise_removed(&mut self, exercise_index: usize) -> bool {
        if !self.is_active() {
            return true;
        }
        if self.exercise_index == Some(exercise_index) {
            return false;
        }
        self.exercise_index = self.exercise_index.map(|i| shift_down(i, exercise_index));
        self.next_exercise_index = match self.next_exercise_index {
            Some(next) if next == exercise_index => None,
            other => other.map(|i| shift_down(i, exercise_index)),
        };
        true
    }

    pub fn after_exercise_moved(&mut self, from: usize, to: usize) -> bool {
        if self.is_active() {
            self.exercise_index = self.exercise_index.map(|i| moved_index(i, from, to));
            self.next_exercise_index = self.next_exercise_index.map(|i| moved_index(i, from, to));
        }
        true
    }
}

fn shift_down(index: usize, removed: usize) -> usize {
    if index > removed {
        index - 1
    } else {
        index
    }
}

/// Where `index` ends up after the element at `from` is moved to `to`.
pub fn moved_index(index: usize, from: usize, to: usize) -> usize {
    if index == from {
        to
    } else if from < to && index > from && index <= to {
        index - 1
    } else if to < from && index >= to && index < from {
        index + 1
    } else {
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap()
    }

    #[test]
    fn remaining_is_floor_of_elapsed_seconds() {
        let mut state = TimerState::new();
        state.begin(&TimerRequest::set_rest(0, 0, 90), t0());
        assert_eq!(state.remaining_at(t0()), 90);
        assert_eq!(state.remaining_at(t0() + Duration::milliseconds(999)), 90);
        assert_eq!(state.remaining_at(t0() + Duration::milliseconds(1000)), 89);
        assert_eq!(state.remaining_at(t0() + Duration::seconds(45)), 45);
    }

    #[test]
    fn long_background_gap_clamps_to_zero() {
        let mut state = TimerState::new();
        state.begin(&TimerRequest::set_rest(0, 0, 90), t0());
        assert_eq!(state.sync_remaining(t0() + Duration::seconds(200)), 0);
    }

    #[test]
    fn clock_moving_backwards_does_not_add_time() {
        let mut state = TimerState::new();
        state.begin(&TimerRequest::set_rest(0, 0, 90), t0());
        assert_eq!(state.remaining_at(t0() - Duration::seconds(30)), 90);
    }

    #[test]
    fn idle_timer_reports_nothing() {
        let state = TimerState::new();
        assert_eq!(state.remaining_at(t0()), 0);
        assert!(!state.triggered_by_set(0, 0));
    }

    #[test]
    fn trigger_matching_is_exact() {
        let mut state = TimerState::new();
        state.begin(&TimerRequest::set_rest(1, 2, 60), t0());
        assert!(state.triggered_by_set(1, 2));
        assert!(!state.triggered_by_set(1, 1));
        assert!(!state.triggered_by_exercise_completion(1));

        state.begin(&TimerRequest::exercise_rest(1, Some(2), 120), t0());
        assert!(state.triggered_by_exercise_completion(1));
        assert!(!state.triggered_by_set(1, 2));
    }

    #[test]
    fn removing_an_earlier_set_shifts_the_trigger() {
        let mut state = TimerState::new();
        state.begin(&TimerRequest::set_rest(0, 3, 60), t0());
        assert!(state.after_set_removed(0, 1));
        assert!(state.triggered_by_set(0, 2));
        assert!(!state.after_set_removed(0, 2));
    }

    #[test]
    fn removing_the_advance_target_keeps_the_rest() {
        let mut state = TimerState::new();
        state.begin(&TimerRequest::exercise_rest(0, Some(2), 120), t0());
        assert!(state.after_exercise_removed(2));
        assert_eq!(state.next_exercise_index, None);
        assert!(!state.after_exercise_removed(0));
    }

    #[test]
    fn moved_index_follows_the_reorder() {
        assert_eq!(moved_index(0, 0, 2), 2);
        assert_eq!(moved_index(1, 0, 2), 0);
        assert_eq!(moved_index(2, 0, 2), 1);
        assert_eq!(moved_index(3, 0, 2), 3);
        assert_eq!(moved_index(0, 2, 0), 1);
        assert_eq!(moved_index(2, 2, 0), 0);
    }
}
