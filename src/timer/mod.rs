pub mod controller;
pub mod notifier;
pub mod state;

pub use controller::{AppPhase, TickOutcome, TimerCoordinator, TimerSnapshot};
pub use notifier::{PlatformNotifier, SilentNotifier};
pub use state::{TimerKind, TimerRequest, TimerState, TimerStatus};
