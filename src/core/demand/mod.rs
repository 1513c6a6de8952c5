//! Demand model: daily order targets and their spread over the day.

use crate::core::dimensions::Location;
use crate::core::types::MINUTES_PER_DAY;
use rand::Rng;
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Monday-first weekday multipliers; day 0 of the dataset is a Monday
pub const WEEKDAY_MULTIPLIERS: [f64; 7] = [1.00, 1.05, 1.08, 1.10, 1.25, 1.35, 1.15];

/// A raised sin² hump over `[start_minute, end_minute)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hump {
    pub start_minute: usize,
    pub end_minute: usize,
    /// Weight at the centre of the hump (baseline is 1.0)
    pub peak_multiplier: f64,
}

impl Hump {
    pub fn new(start_minute: usize, end_minute: usize, peak_multiplier: f64) -> Self {
        Self {
            start_minute,
            end_minute,
            peak_multiplier,
        }
    }

    fn apply(&self, weights: &mut [f64]) {
        let end = self.end_minute.min(weights.len());
        if end <= self.start_minute {
            return;
        }
        let span = (self.end_minute - self.start_minute) as f64;
        for minute in self.start_minute..end {
            let x = (minute - self.start_minute) as f64 / span;
            weights[minute] += (self.peak_multiplier - 1.0) * (PI * x).sin().powi(2);
        }
    }
}

/// Shape of the daily intensity curves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandConfig {
    pub lunch: Hump,
    pub dinner: Hump,
    pub late_night: Hump,
    /// Flat weight added to each minute of the first hour after midnight
    pub after_midnight_boost: f64,
    pub noise_low: f64,
    pub noise_high: f64,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            lunch: Hump::new(11 * 60, 13 * 60 + 30, 3.0),
            dinner: Hump::new(17 * 60, 20 * 60, 3.5),
            late_night: Hump::new(21 * 60, 24 * 60, 2.0),
            after_midnight_boost: 1.0,
            noise_low: 0.9,
            noise_high: 1.1,
        }
    }
}

/// Per-minute relative order intensity over one day
#[derive(Debug, Clone, PartialEq)]
pub struct MinuteCurve {
    weights: Vec<f64>,
    total: f64,
}

impl MinuteCurve {
    /// Flat baseline with lunch and dinner humps
    pub fn standard(config: &DemandConfig) -> Self {
        let mut weights = vec![1.0; MINUTES_PER_DAY];
        config.lunch.apply(&mut weights);
        config.dinner.apply(&mut weights);
        Self::from_weights(weights)
    }

    /// Standard curve plus a late-night hump and an after-midnight boost
    pub fn late_night(config: &DemandConfig) -> Self {
        let mut weights = Self::standard(config).weights;
        config.late_night.apply(&mut weights);
        for w in weights.iter_mut().take(60) {
            *w += config.after_midnight_boost;
        }
        Self::from_weights(weights)
    }

    fn from_weights(weights: Vec<f64>) -> Self {
        let total = weights.iter().sum();
        Self { weights, total }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Poisson mean per minute: `target * w_m / Σw`
    pub fn lambdas(&self, target: u32) -> Vec<f64> {
        if self.total <= 0.0 {
            return vec![0.0; self.weights.len()];
        }
        let scale = target as f64 / self.total;
        self.weights.iter().map(|w| w * scale).collect()
    }
}

/// Multiplier for the weekday of `day`
pub fn weekday_multiplier(day: u32) -> f64 {
    WEEKDAY_MULTIPLIERS[(day % 7) as usize]
}

/// Number of orders arriving in one minute, `Poisson(lambda)`
pub fn sample_minute_orders<R: Rng + ?Sized>(lambda: f64, rng: &mut R) -> u32 {
    if !(lambda > 0.0) || !lambda.is_finite() {
        return 0;
    }
    match Poisson::new(lambda) {
        Ok(poisson) => {
            let count: f64 = poisson.sample(rng);
            count as u32
        }
        Err(_) => 0,
    }
}

/// Converts location growth and calendar effects into order counts
#[derive(Debug, Clone)]
pub struct DemandModel {
    config: DemandConfig,
    standard: MinuteCurve,
    late_night: MinuteCurve,
}

impl DemandModel {
    pub fn new(config: DemandConfig) -> Self {
        let standard = MinuteCurve::standard(&config);
        let late_night = MinuteCurve::late_night(&config);
        Self {
            config,
            standard,
            late_night,
        }
    }

    pub fn config(&self) -> &DemandConfig {
        &self.config
    }

    /// Intensity curve used for `location`
    pub fn curve_for(&self, location: &Location) -> &MinuteCurve {
        if location.late_night_curve {
            &self.late_night
        } else {
            &self.standard
        }
    }

    /// Target order count for `day`, truncated; may be zero
    pub fn orders_for_day<R: Rng + ?Sized>(&self, day: u32, location: &Location, rng: &mut R) -> u32 {
        let mut orders = location.base_orders_day * (1.0 + location.growth_rate_daily).powi(day as i32);
        if location.weekly_pattern {
            orders *= weekday_multiplier(day);
        }
        orders *= rng.gen_range(self.config.noise_low..=self.config.noise_high);
        if orders.is_finite() && orders > 0.0 {
            orders as u32
        } else {
            0
        }
    }

    /// Order count for each minute of `day` at `location`
    pub fn minute_orders<R: Rng + ?Sized>(&self, day: u32, location: &Location, rng: &mut R) -> Vec<u32> {
        let target = self.orders_for_day(day, location, rng);
        self.curve_for(location)
            .lambdas(target)
            .into_iter()
            .map(|lambda| sample_minute_orders(lambda, rng))
            .collect()
    }
}

impl Default for DemandModel {
    fn default() -> Self {
        Self::new(DemandConfig::default())
    }
}
