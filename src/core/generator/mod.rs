//! Event generator
//!
//! Draws per-minute demand for every location and day, samples each order's
//! customer, basket and lifecycle, and merges the results into one event set.
//! Every (location, day) pair draws from its own RNG streams, so sequential
//! and Rayon runs produce identical datasets for the same seed.

pub mod basket;
pub mod config;
pub mod lifecycle;
pub mod order;

pub use basket::{brand_weight, BasketLine, BasketSelector};
pub use config::{ConcurrencyMode, DriverArrival, GeneratorConfig, ServiceTimes, StageTime};
pub use lifecycle::LifecycleTimes;
pub use order::{Order, OrderGenerator};

use crate::core::dataset::DatasetWriter;
use crate::core::demand::DemandModel;
use crate::core::dimensions::{DimensionStore, Location};
use crate::core::errors::{GenerationError, OrderSkip};
use crate::core::event::OrderEvent;
use crate::core::rng::{RngContext, StreamDomain};
use crate::core::routing::RoutingService;
use crate::core::types::OrderId;
use log::{debug, info};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

const ORDER_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const ORDER_ID_LEN: usize = 6;

/// Random six-character upper-case alphanumeric id
pub fn random_order_id<R: Rng + ?Sized>(rng: &mut R) -> OrderId {
    (0..ORDER_ID_LEN)
        .map(|_| ORDER_ID_ALPHABET[rng.gen_range(0..ORDER_ID_ALPHABET.len())] as char)
        .collect()
}

/// Summary counters for a generation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub orders: usize,
    pub events: usize,
    pub skipped_no_route: usize,
    pub skipped_empty_basket: usize,
    pub skipped_past_horizon: usize,
    pub skipped_encoding: usize,
    pub id_collisions: usize,
}

impl GenerationStats {
    pub fn record_skip(&mut self, skip: &OrderSkip) {
        match skip {
            OrderSkip::NoRoute(_) => self.skipped_no_route += 1,
            OrderSkip::EmptyBasket => self.skipped_empty_basket += 1,
            OrderSkip::PastHorizon => self.skipped_past_horizon += 1,
            OrderSkip::Encoding(_) => self.skipped_encoding += 1,
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped_no_route + self.skipped_empty_basket + self.skipped_past_horizon + self.skipped_encoding
    }

    fn absorb(&mut self, other: &GenerationStats) {
        self.orders += other.orders;
        self.events += other.events;
        self.skipped_no_route += other.skipped_no_route;
        self.skipped_empty_basket += other.skipped_empty_basket;
        self.skipped_past_horizon += other.skipped_past_horizon;
        self.skipped_encoding += other.skipped_encoding;
        self.id_collisions += other.id_collisions;
    }
}

impl std::fmt::Display for GenerationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} orders, {} events, {} skipped (no route {}, empty basket {}, past horizon {}, encoding {}), {} id collisions",
            self.orders,
            self.events,
            self.skipped(),
            self.skipped_no_route,
            self.skipped_empty_basket,
            self.skipped_past_horizon,
            self.skipped_encoding,
            self.id_collisions
        )
    }
}

/// Output of a generation run: globally ordered events plus counters
#[derive(Debug, Clone, Default)]
pub struct GeneratedDataset {
    pub events: Vec<OrderEvent>,
    pub stats: GenerationStats,
}

#[derive(Debug, Default)]
struct DayBatch {
    orders: Vec<Vec<OrderEvent>>,
    stats: GenerationStats,
}

/// Drives a whole generation run over every location and day
pub struct DatasetGenerator<'a> {
    store: &'a DimensionStore,
    routing: &'a RoutingService,
    demand: DemandModel,
    config: GeneratorConfig,
}

impl<'a> DatasetGenerator<'a> {
    pub fn new(store: &'a DimensionStore, routing: &'a RoutingService, config: GeneratorConfig) -> Self {
        Self {
            store,
            routing,
            demand: DemandModel::new(config.demand.clone()),
            config,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate the dataset.
    ///
    /// Locations run in parallel under `ConcurrencyMode::Rayon`; results are
    /// merged day by day in location order before ids are deduplicated.
    pub fn run(&self) -> Result<GeneratedDataset, GenerationError> {
        self.config.validate()?;
        let locations = self.store.locations();
        for location in locations {
            self.routing.for_location(location.location_id)?;
        }

        info!(
            "Generating {} days of orders across {} locations ({:?})",
            self.config.days,
            locations.len(),
            self.config.concurrency_mode
        );

        let per_location: Vec<Vec<DayBatch>> = match self.config.concurrency_mode {
            ConcurrencyMode::Sequential => locations.iter().map(|l| self.generate_location(l)).collect(),
            ConcurrencyMode::Rayon => match self.config.thread_pool_size {
                Some(threads) => {
                    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
                    pool.install(|| locations.par_iter().map(|l| self.generate_location(l)).collect())
                }
                None => locations.par_iter().map(|l| self.generate_location(l)).collect(),
            },
        };

        let mut writer = DatasetWriter::new(&RngContext::new(self.config.seed));
        let mut stats = GenerationStats::default();
        let mut days: Vec<_> = per_location.into_iter().map(|batches| batches.into_iter()).collect();
        for _ in 0..self.config.days {
            for location_days in days.iter_mut() {
                let Some(batch) = location_days.next() else {
                    continue;
                };
                stats.absorb(&batch.stats);
                for order in batch.orders {
                    writer.push_order(order);
                }
            }
        }

        stats.id_collisions = writer.id_collisions();
        let events = writer.finish();
        info!("Generated {}", stats);

        Ok(GeneratedDataset { events, stats })
    }

    fn generate_location(&self, location: &Location) -> Vec<DayBatch> {
        let ctx = RngContext::new(self.config.seed);
        let generator = OrderGenerator::new(self.store, self.routing, &self.config);
        let location_key = location.location_id as u64;

        (0..self.config.days)
            .map(|day| {
                if day % 10 == 0 {
                    info!("  {} day {}/{}", location.location_code, day, self.config.days);
                }

                let mut demand_rng = ctx.stream(StreamDomain::Demand, location_key, day as u64);
                let mut order_rng = ctx.stream(StreamDomain::Orders, location_key, day as u64);
                let mut id_rng = ctx.stream(StreamDomain::OrderIds, location_key, day as u64);

                let mut batch = DayBatch::default();
                let minute_orders = self.demand.minute_orders(day, location, &mut demand_rng);
                for (minute, &count) in minute_orders.iter().enumerate() {
                    for _ in 0..count {
                        let order_id = random_order_id(&mut id_rng);
                        match generator.generate(order_id, location, day, minute as u32, &mut order_rng) {
                            Ok(events) => {
                                batch.stats.orders += 1;
                                batch.stats.events += events.len();
                                batch.orders.push(events);
                            }
                            Err(skip) => {
                                debug!("Skipping order at {} day {} minute {}: {}", location.location_code, day, minute, skip);
                                batch.stats.record_skip(&skip);
                            }
                        }
                    }
                }
                batch
            })
            .collect()
    }
}
