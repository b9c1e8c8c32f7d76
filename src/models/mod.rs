pub mod exercise;
pub mod history;
pub mod record;
pub mod template;

pub use exercise::{ExerciseDefinition, ExerciseEntry, ExerciseKind, SetEntry, SetField};
pub use history::{HistoryExercise, HistoryRecord, HistorySet};
pub use record::{
    HistoricalPr, MetricType, PrCandidate, PrNotification, SessionAchievedPr, SessionNotifiedPr,
    SetFieldName,
};
pub use template::{TemplateExercise, TemplateSet, WorkoutTemplate};
