use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::{
    clock::Clock,
    events::{EngineEvent, EventSink},
};

use super::{PlatformNotifier, TimerKind, TimerRequest, TimerState};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

const ALERT_TITLE: &str = "Rest complete";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum AppPhase {
    #[default]
    Foreground,
    Background,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub remaining_seconds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Running { remaining_seconds: u32 },
    Finished,
}

struct CoordinatorState {
    timer: TimerState,
    phase: AppPhase,
    scheduled_alert: Option<String>,
}

/// What happened when a timer ran out, gathered under the lock and acted on
/// after it is released.
struct Expiry {
    kind: TimerKind,
    next_exercise_index: Option<usize>,
    phase: AppPhase,
    alert_already_scheduled: bool,
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Owns the one rest countdown a session may have running.
#[derive(Clone)]
pub struct TimerCoordinator {
    inner: Arc<Mutex<CoordinatorState>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn PlatformNotifier>,
    events: Arc<dyn EventSink>,
    tick_interval: Duration,
    auto_tick: bool,
    debug_ticks: bool,
}

impl TimerCoordinator {
    pub fn new(
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn PlatformNotifier>,
        events: Arc<dyn EventSink>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CoordinatorState {
                timer: TimerState::new(),
                phase: AppPhase::Foreground,
                scheduled_alert: None,
            })),
            ticker: Arc::new(Mutex::new(None)),
            clock,
            notifier,
            events,
            tick_interval,
            auto_tick: true,
            debug_ticks: false,
        }
    }

    /// Disables the background ticker; the owner drives [`Self::tick`].
    pub fn with_manual_ticks(mut self) -> Self {
        self.auto_tick = false;
        self
    }

    /// Logs every recomputed countdown at debug level.
    pub fn with_debug_ticks(mut self, enabled: bool) -> Self {
        self.debug_ticks = enabled;
        self
    }

    pub async fn get_state(&self) -> TimerState {
        let mut guard = self.inner.lock().await;
        guard.timer.sync_remaining(self.clock.now());
        guard.timer.clone()
    }

    pub async fn get_snapshot(&self) -> TimerSnapshot {
        let mut guard = self.inner.lock().await;
        let remaining_seconds = guard.timer.sync_remaining(self.clock.now());
        TimerSnapshot {
            state: guard.timer.clone(),
            remaining_seconds,
        }
    }

    pub async fn phase(&self) -> AppPhase {
        self.inner.lock().await.phase
    }

    /// Replaces whatever is running with a fresh countdown.
    pub async fn start_timer(&self, request: TimerRequest) -> Result<TimerState> {
        if request.seconds == 0 {
            return Err(anyhow!("rest duration must be greater than zero"));
        }

        self.cancel_ticker().await;

        let started = {
            let mut guard = self.inner.lock().await;
            self.cancel_scheduled_alert(&mut guard);
            guard.timer.begin(&request, self.clock.now());
            if guard.phase == AppPhase::Background {
                self.schedule_alert(&mut guard);
            }
            guard.timer.clone()
        };

        log_info!(
            "rest timer started: {:?} {}s for exercise {} set {:?}",
            request.kind,
            request.seconds,
            request.exercise_index,
            request.set_index
        );

        self.spawn_ticker().await;
        self.emit_state_changed().await;
        Ok(started)
    }

    pub async fn cancel_timer(&self) {
        let was_active = {
            let mut guard = self.inner.lock().await;
            self.cancel_scheduled_alert(&mut guard);
            let was_active = guard.timer.is_active();
            guard.timer.cancel();
            was_active
        };

        self.cancel_ticker().await;

        if was_active {
            log_info!("rest timer cancelled");
            self.emit_state_changed().await;
        }
    }

    /// Lets the session re-point the running timer after sets or exercises
    /// move. `adjust` returns false when the trigger is gone, which cancels
    /// the timer.
    pub async fn adjust_trigger<F>(&self, adjust: F)
    where
        F: FnOnce(&mut TimerState) -> bool,
    {
        let keep = {
            let mut guard = self.inner.lock().await;
            adjust(&mut guard.timer)
        };
        if !keep {
            self.cancel_timer().await;
        }
    }

    /// Recomputes the countdown from its start timestamp and fires the
    /// expiry side effects once it reaches zero.
    pub async fn tick(&self) -> TickOutcome {
        let expiry = {
            let mut guard = self.inner.lock().await;
            if !guard.timer.is_active() {
                return TickOutcome::Idle;
            }
            let remaining = guard.timer.sync_remaining(self.clock.now());
            if self.debug_ticks {
                log_debug!("rest timer tick: {remaining}s left");
            }
            if remaining > 0 {
                return TickOutcome::Running {
                    remaining_seconds: remaining,
                };
            }
            Self::expire(&mut guard)
        };

        self.announce_expiry(expiry).await;
        TickOutcome::Finished
    }

    /// Reconciles the countdown with the app moving to or from the background.
    pub async fn on_app_state_change(&self, phase: AppPhase) {
        let expiry = {
            let mut guard = self.inner.lock().await;
            if guard.phase == phase {
                return;
            }
            guard.phase = phase;

            if !guard.timer.is_active() {
                return;
            }

            match phase {
                AppPhase::Background => {
                    guard.timer.sync_remaining(self.clock.now());
                    self.schedule_alert(&mut guard);
                    None
                }
                AppPhase::Foreground => {
                    self.cancel_scheduled_alert(&mut guard);
                    let remaining = guard.timer.sync_remaining(self.clock.now());
                    if remaining == 0 {
                        Some(Self::expire(&mut guard))
                    } else {
                        None
                    }
                }
            }
        };

        match expiry {
            Some(expiry) => self.announce_expiry(expiry).await,
            None => self.emit_state_changed().await,
        }
    }

    fn expire(guard: &mut CoordinatorState) -> Expiry {
        let expiry = Expiry {
            kind: guard.timer.kind,
            next_exercise_index: guard.timer.next_exercise_index,
            phase: guard.phase,
            alert_already_scheduled: guard.scheduled_alert.take().is_some(),
        };
        guard.timer.cancel();
        expiry
    }

    async fn announce_expiry(&self, expiry: Expiry) {
        log_info!("rest timer finished: {:?}", expiry.kind);

        if expiry.kind == TimerKind::Exercise {
            if let Some(index) = expiry.next_exercise_index {
                self.events.emit(EngineEvent::AdvanceToExercise { index });
            }
        }

        self.notifier.haptic();

        // A scheduled alert already covers the backgrounded case.
        if expiry.phase == AppPhase::Background && !expiry.alert_already_scheduled {
            if let Err(err) = self.notifier.present(ALERT_TITLE, alert_body(expiry.kind, expiry.next_exercise_index)) {
                log_warn!("failed to present rest alert: {err}");
            }
        }

        self.events.emit(EngineEvent::TimerFinished {
            kind: expiry.kind,
            next_exercise_index: expiry.next_exercise_index,
        });
        self.emit_state_changed().await;
    }

    fn schedule_alert(&self, guard: &mut CoordinatorState) {
        self.cancel_scheduled_alert(guard);
        let remaining = guard.timer.remaining_seconds;
        if remaining == 0 {
            return;
        }
        let body = alert_body(guard.timer.kind, guard.timer.next_exercise_index);
        match self.notifier.schedule(ALERT_TITLE, body, remaining) {
            Ok(id) => guard.scheduled_alert = Some(id),
            Err(err) => log_warn!("failed to schedule rest alert: {err}"),
        }
    }

    fn cancel_scheduled_alert(&self, guard: &mut CoordinatorState) {
        if let Some(id) = guard.scheduled_alert.take() {
            if let Err(err) = self.notifier.cancel(&id) {
                log_warn!("failed to cancel rest alert {id}: {err}");
            }
        }
    }

    async fn spawn_ticker(&self) {
        if !self.auto_tick {
            return;
        }

        let mut ticker_guard = self.ticker.lock().await;
        if let Some(previous) = ticker_guard.take() {
            previous.cancel_token.cancel();
            previous.handle.abort();
        }

        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let coordinator = self.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match coordinator.tick().await {
                            TickOutcome::Running { .. } => coordinator.emit_state_changed().await,
                            TickOutcome::Idle | TickOutcome::Finished => break,
                        }
                    }
                    _ = token.cancelled() => break,
                }
            }
        });

        *ticker_guard = Some(Ticker {
            handle,
            cancel_token,
        });
    }

    async fn cancel_ticker(&self) {
        if let Some(ticker) = self.ticker.lock().await.take() {
            ticker.cancel_token.cancel();
            ticker.handle.abort();
        }
    }

    async fn emit_state_changed(&self) {
        let snapshot = self.get_snapshot().await;
        self.events.emit(EngineEvent::TimerStateChanged {
            state: snapshot.state,
            remaining_seconds: snapshot.remaining_seconds,
        });
    }
}

fn alert_body(kind: TimerKind, next_exercise_index: Option<usize>) -> &'static str {
    match (kind, next_exercise_index) {
        (TimerKind::Set, _) => "Time for your next set",
        (TimerKind::Exercise, Some(_)) => "Time for the next exercise",
        (TimerKind::Exercise, None) => "Workout complete",
    }
}
