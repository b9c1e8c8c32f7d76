pub mod controller;
pub mod validation;

pub use controller::{
    next_incomplete_exercise, pooled_entry, CompletionContext, SetCompletionController, SetError,
    TimerAction, ToggleOutcome,
};
pub use validation::{validate_for_completion, SetValidationError};
