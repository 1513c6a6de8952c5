use crate::core::errors::ConfigError;
use crate::core::types::DATASET_DAYS;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const OPT_DATASET_PATH: &str = "datasetPath";
pub const OPT_SIMULATION_START_DAY: &str = "simulationStartDay";
pub const OPT_SPEED_MULTIPLIER: &str = "speedMultiplier";

/// Settings for the replay reader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderConfig {
    /// Directory holding `events.parquet`
    pub dataset_path: PathBuf,
    /// Simulated day the catch-up read runs up to
    pub simulation_start_day: u32,
    /// Simulated seconds per elapsed wall-clock second
    pub speed_multiplier: f64,
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self {
            dataset_path: PathBuf::from("./canonical_dataset"),
            simulation_start_day: 70,
            speed_multiplier: 1.0,
        }
    }

    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }

    pub fn with_simulation_start_day(mut self, day: u32) -> Self {
        self.simulation_start_day = day;
        self
    }

    pub fn with_speed_multiplier(mut self, speed: f64) -> Self {
        self.speed_multiplier = speed;
        self
    }

    /// Build from string options keyed `datasetPath`, `simulationStartDay`
    /// and `speedMultiplier`; missing keys keep their defaults.
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Some(path) = options.get(OPT_DATASET_PATH) {
            config.dataset_path = PathBuf::from(path);
        }
        if let Some(raw) = options.get(OPT_SIMULATION_START_DAY) {
            config.simulation_start_day = raw
                .trim()
                .parse()
                .map_err(|_| invalid(OPT_SIMULATION_START_DAY, raw, "expected a whole number of days"))?;
        }
        if let Some(raw) = options.get(OPT_SPEED_MULTIPLIER) {
            config.speed_multiplier = raw
                .trim()
                .parse()
                .map_err(|_| invalid(OPT_SPEED_MULTIPLIER, raw, "expected a number"))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation_start_day >= DATASET_DAYS {
            return Err(invalid(
                OPT_SIMULATION_START_DAY,
                &self.simulation_start_day.to_string(),
                &format!("must be between 0 and {}", DATASET_DAYS - 1),
            ));
        }
        if !self.speed_multiplier.is_finite() || self.speed_multiplier <= 0.0 {
            return Err(invalid(
                OPT_SPEED_MULTIPLIER,
                &self.speed_multiplier.to_string(),
                "must be a positive finite number",
            ));
        }
        Ok(())
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidOption {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
