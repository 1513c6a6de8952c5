use super::config::{DriverArrival, ServiceTimes, StageTime};
use crate::core::types::SimMillis;
use rand::Rng;
use rand_distr::{Beta, Distribution, Normal};

/// Shortest duration any kitchen stage may take
pub const MIN_STAGE_MINUTES: f64 = 0.1;

/// Gap kept between driver arrival and pickup
pub const ARRIVAL_GAP_MS: SimMillis = 1000;

fn minutes_to_ms(minutes: f64) -> SimMillis {
    (minutes * 60_000.0).round() as SimMillis
}

impl StageTime {
    /// Gaussian duration in minutes, never below `MIN_STAGE_MINUTES`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let minutes = match Normal::new(self.mean_min, self.std_dev_min) {
            Ok(normal) => normal.sample(rng),
            Err(_) => self.mean_min,
        };
        minutes.max(MIN_STAGE_MINUTES)
    }
}

/// Timestamps of every lifecycle stage of one order, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleTimes {
    pub created: SimMillis,
    pub started: SimMillis,
    pub finished: SimMillis,
    pub ready: SimMillis,
    pub driver_arrived: SimMillis,
    pub picked_up: SimMillis,
    pub delivered: SimMillis,
}

impl LifecycleTimes {
    /// Chain the kitchen stages from `created`, then drive for `drive_minutes`.
    ///
    /// The driver either turns up between ready and pickup or between
    /// creation and ready, at a Beta-distributed point of that interval.
    pub fn sample<R: Rng + ?Sized>(
        created: SimMillis,
        drive_minutes: f64,
        service: &ServiceTimes,
        arrival: &DriverArrival,
        rng: &mut R,
    ) -> Self {
        let started = created + minutes_to_ms(service.created_to_started.sample(rng));
        let finished = started + minutes_to_ms(service.started_to_finished.sample(rng));
        let ready = finished + minutes_to_ms(service.finished_to_ready.sample(rng));
        let picked_up = ready + minutes_to_ms(service.ready_to_pickup.sample(rng));
        let delivered = picked_up + minutes_to_ms(drive_minutes.max(0.0));

        let (base, span) = if rng.gen_bool(arrival.after_ready_probability.clamp(0.0, 1.0)) {
            (ready, picked_up - ready)
        } else {
            (created, ready - created)
        };
        let fraction = match Beta::new(arrival.alpha, arrival.beta) {
            Ok(beta) => beta.sample(rng),
            Err(_) => 0.5,
        };
        let driver_arrived = (base + (span as f64 * fraction) as SimMillis)
            .min(picked_up - ARRIVAL_GAP_MS)
            .max(created);

        Self {
            created,
            started,
            finished,
            ready,
            driver_arrived,
            picked_up,
            delivered,
        }
    }
}
