use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::models::{ExerciseKind, MetricType};

pub fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} value {value} is out of range"))
}

pub fn to_optional_u32(value: Option<i64>, field: &str) -> Result<Option<u32>> {
    value.map(|raw| to_u32(raw, field)).transpose()
}

pub fn to_position(value: usize) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("position {value} exceeds SQLite INTEGER range"))
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_kind(value: &str) -> Result<ExerciseKind> {
    ExerciseKind::parse(value).ok_or_else(|| anyhow!("unknown exercise kind {value}"))
}

pub fn parse_metric(value: &str) -> Result<MetricType> {
    MetricType::parse(value).ok_or_else(|| anyhow!("unknown record metric {value}"))
}
