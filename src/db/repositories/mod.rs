pub mod exercises;
pub mod history;
pub mod records;
pub mod templates;
