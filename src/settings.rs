use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::units::WeightUnit;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineSettings {
    pub weight_unit: WeightUnit,
    pub completion_ack_seconds: u32,
    pub dirty_grace_ms: u64,
    pub tick_interval_ms: u64,
    pub default_rest_seconds: u32,
    pub default_next_exercise_rest_seconds: u32,
    #[serde(skip)]
    pub debug: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            weight_unit: WeightUnit::Kg,
            completion_ack_seconds: 3,
            dirty_grace_ms: 1500,
            tick_interval_ms: 1000,
            default_rest_seconds: 90,
            default_next_exercise_rest_seconds: 120,
            debug: false,
        }
    }
}

impl EngineSettings {
    /// Applies `REPFLOW_TICK_MS` and `REPFLOW_DEBUG` from the environment.
    pub fn from_env_overrides(mut self) -> Self {
        if let Ok(raw) = std::env::var("REPFLOW_TICK_MS") {
            match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => self.tick_interval_ms = ms,
                _ => log_warn!("ignoring invalid REPFLOW_TICK_MS value {raw:?}"),
            }
        }
        self.debug = std::env::var("REPFLOW_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn dirty_grace(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.dirty_grace_ms).unwrap_or(i64::MAX))
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<EngineSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!("settings at {} are unreadable, using defaults: {err}", path.display());
                EngineSettings::default()
            })
        } else {
            EngineSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> EngineSettings {
        self.read().clone()
    }

    pub fn update(&self, settings: EngineSettings) -> Result<()> {
        let mut guard = self.write();
        *guard = settings;
        self.persist(&guard)
    }

    pub fn set_weight_unit(&self, unit: WeightUnit) -> Result<()> {
        let mut guard = self.write();
        guard.weight_unit = unit;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: EngineSettings = serde_json::from_str(&contents)?;
        *self.write() = data;
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, EngineSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, EngineSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn persist(&self, data: &EngineSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.get(), EngineSettings::default());
    }

    #[test]
    fn updates_persist_across_stores() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        store.set_weight_unit(WeightUnit::Lb).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.get().weight_unit, WeightUnit::Lb);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "completionAckSeconds": 5 }"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().get();
        assert_eq!(settings.completion_ack_seconds, 5);
        assert_eq!(settings.tick_interval_ms, 1000);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(SettingsStore::new(path).unwrap().get(), EngineSettings::default());
    }
}
