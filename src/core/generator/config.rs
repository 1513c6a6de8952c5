//! Configuration for a dataset generation run
//!
//! Controls horizon, seeding, service-time distributions, driver behaviour
//! and how per-location work is spread over threads.

use crate::core::demand::DemandConfig;
use crate::core::errors::ConfigError;
use crate::core::routing::DRIVER_MPH;
use crate::core::types::DATASET_DAYS;
use serde::{Deserialize, Serialize};

/// Enumeration of supported concurrency modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Locations are generated one after another on the calling thread
    #[default]
    Sequential,
    /// Locations are generated concurrently using Rayon
    Rayon,
}

/// Gaussian service duration in minutes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageTime {
    pub mean_min: f64,
    pub std_dev_min: f64,
}

impl StageTime {
    pub const fn new(mean_min: f64, std_dev_min: f64) -> Self {
        Self { mean_min, std_dev_min }
    }
}

/// Durations between consecutive kitchen stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceTimes {
    pub created_to_started: StageTime,
    pub started_to_finished: StageTime,
    pub finished_to_ready: StageTime,
    pub ready_to_pickup: StageTime,
}

impl Default for ServiceTimes {
    fn default() -> Self {
        Self {
            created_to_started: StageTime::new(2.0, 1.0),
            started_to_finished: StageTime::new(10.0, 3.0),
            finished_to_ready: StageTime::new(2.0, 1.0),
            ready_to_pickup: StageTime::new(6.0, 2.0),
        }
    }
}

/// When the driver shows up at the kitchen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverArrival {
    /// Chance the driver arrives after the food is ready
    pub after_ready_probability: f64,
    pub alpha: f64,
    pub beta: f64,
}

impl Default for DriverArrival {
    fn default() -> Self {
        Self {
            after_ready_probability: 0.5,
            alpha: 3.0,
            beta: 3.0,
        }
    }
}

/// Missing fields in a JSON override fall back to the canonical values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub days: u32,
    pub seed: u64,
    pub ping_interval_sec: u32,
    pub driver_mph: f64,
    /// Chance an order draws from exactly one brand
    pub single_brand_probability: f64,
    pub service_times: ServiceTimes,
    pub driver_arrival: DriverArrival,
    pub demand: DemandConfig,
    /// The concurrency mode to use for execution
    pub concurrency_mode: ConcurrencyMode,
    /// The size of the thread pool for parallel execution
    /// Only relevant when concurrency_mode is Rayon
    pub thread_pool_size: Option<usize>,
}

impl GeneratorConfig {
    /// Create a new configuration with the canonical dataset's values
    pub fn new() -> Self {
        Self {
            days: DATASET_DAYS,
            seed: 42,
            ping_interval_sec: 60,
            driver_mph: DRIVER_MPH,
            single_brand_probability: 0.7,
            service_times: ServiceTimes::default(),
            driver_arrival: DriverArrival::default(),
            demand: DemandConfig::default(),
            concurrency_mode: ConcurrencyMode::default(),
            thread_pool_size: None,
        }
    }

    /// Number of simulated days, capped at the dataset horizon
    pub fn with_days(mut self, days: u32) -> Self {
        self.days = days.min(DATASET_DAYS);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the concurrency mode for the generation run
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Set the thread pool size for parallel execution
    ///
    /// # Note
    /// This setting only affects execution when concurrency_mode is Rayon
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }

    pub fn with_service_times(mut self, service_times: ServiceTimes) -> Self {
        self.service_times = service_times;
        self
    }

    pub fn with_driver_arrival(mut self, driver_arrival: DriverArrival) -> Self {
        self.driver_arrival = driver_arrival;
        self
    }

    pub fn with_demand(mut self, demand: DemandConfig) -> Self {
        self.demand = demand;
        self
    }

    /// Reject values the sampling code cannot draw from
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability("single_brand_probability", self.single_brand_probability)?;
        check_probability(
            "driver_arrival.after_ready_probability",
            self.driver_arrival.after_ready_probability,
        )?;
        check_positive("driver_arrival.alpha", self.driver_arrival.alpha)?;
        check_positive("driver_arrival.beta", self.driver_arrival.beta)?;
        check_positive("driver_mph", self.driver_mph)?;
        if self.ping_interval_sec == 0 {
            return Err(invalid("ping_interval_sec", "0", "must be at least 1 second"));
        }

        check_positive("demand.noise_low", self.demand.noise_low)?;
        check_positive("demand.noise_high", self.demand.noise_high)?;
        if self.demand.noise_low > self.demand.noise_high {
            return Err(invalid(
                "demand.noise_low",
                &self.demand.noise_low.to_string(),
                "must not exceed demand.noise_high",
            ));
        }

        let stages = [
            ("service_times.created_to_started", &self.service_times.created_to_started),
            ("service_times.started_to_finished", &self.service_times.started_to_finished),
            ("service_times.finished_to_ready", &self.service_times.finished_to_ready),
            ("service_times.ready_to_pickup", &self.service_times.ready_to_pickup),
        ];
        for (key, stage) in stages {
            if !stage.mean_min.is_finite() {
                return Err(invalid(&format!("{}.mean_min", key), &stage.mean_min.to_string(), "must be finite"));
            }
            if !stage.std_dev_min.is_finite() || stage.std_dev_min < 0.0 {
                return Err(invalid(
                    &format!("{}.std_dev_min", key),
                    &stage.std_dev_min.to_string(),
                    "must be a non-negative finite number",
                ));
            }
        }
        Ok(())
    }
}

fn check_probability(key: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(key, &value.to_string(), "must be between 0 and 1"));
    }
    Ok(())
}

fn check_positive(key: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(key, &value.to_string(), "must be a positive finite number"));
    }
    Ok(())
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidOption {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new()
    }
}
