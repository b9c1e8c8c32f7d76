//! Rest-timer and personal-record engine for a workout logger.
//!
//! The host shell owns the UI and platform notifications; this crate owns
//! the running session: set completion, record detection, rest countdowns,
//! template dirty tracking and persistence.

pub mod clock;
pub mod db;
pub mod events;
pub mod models;
pub mod records;
pub mod session;
pub mod sets;
pub mod settings;
pub mod timer;
pub mod units;
mod utils;

pub use clock::{Clock, ManualClock, SystemClock};
pub use db::Database;
pub use events::{ChannelEventSink, EngineEvent, EventSink, NoopEventSink};
pub use session::{FinishedWorkout, SessionDeps, SessionView, WorkoutSession};
pub use settings::{EngineSettings, SettingsStore};
pub use timer::{AppPhase, PlatformNotifier, SilentNotifier, TimerCoordinator};
pub use units::WeightUnit;

/// Installs the `env_logger` backend (reads `RUST_LOG`). Safe to call more
/// than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();

    log::info!("repflow logging initialized");
}
