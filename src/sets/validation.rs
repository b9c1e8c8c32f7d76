use thiserror::Error;

use crate::models::{ExerciseKind, SetEntry};

/// Why a set cannot be marked complete yet. The message is shown as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SetValidationError {
    #[error("Enter the number of reps before completing this set")]
    MissingReps,
    #[error("Enter a time before completing this set")]
    MissingTime,
    #[error("Enter both distance and time before completing this set")]
    MissingDistanceOrTime,
}

/// Checks a set is completable for its kind. Weight is optional for reps
/// exercises so bodyweight work can be logged.
pub fn validate_for_completion(kind: ExerciseKind, set: &SetEntry) -> Result<(), SetValidationError> {
    let positive = |value: Option<u32>| value.is_some_and(|v| v > 0);

    match kind {
        ExerciseKind::Reps if !positive(set.reps) => Err(SetValidationError::MissingReps),
        ExerciseKind::Time if !positive(set.time) => Err(SetValidationError::MissingTime),
        ExerciseKind::Distance if !(positive(set.distance) && positive(set.time)) => {
            Err(SetValidationError::MissingDistanceOrTime)
        }
        _ => Ok(()),
    }
}
