use super::basket::{BasketLine, BasketSelector};
use super::config::GeneratorConfig;
use super::lifecycle::LifecycleTimes;
use crate::core::dimensions::{DimensionStore, Location};
use crate::core::errors::OrderSkip;
use crate::core::event::{EventType, OrderEvent};
use crate::core::routing::{drive_time_minutes, RoutingService};
use crate::core::types::{dataset_horizon_seconds, day_start_seconds, Coord, LocationId, OrderId, SimMillis};
use rand::Rng;

/// A fully sampled order, before it is flattened into events
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub order_id: OrderId,
    pub location_id: LocationId,
    pub day: u32,
    pub minute: u32,
    pub customer: Coord,
    pub customer_addr: String,
    pub basket: Vec<BasketLine>,
    pub route: Vec<Coord>,
    pub drive_minutes: f64,
    pub times: LifecycleTimes,
}

fn seconds(ms: SimMillis) -> i64 {
    ms.div_euclid(1000)
}

impl Order {
    /// Number of in-transit pings for this order's drive
    pub fn ping_count(&self, ping_interval_sec: u32) -> u32 {
        let interval = ping_interval_sec.max(1) as f64;
        ((self.drive_minutes * 60.0 / interval) as u32).max(1)
    }

    /// Flatten into the persisted event records.
    ///
    /// Kitchen and driver stages are ordered by time (the driver can arrive
    /// before cooking starts), then pings follow pickup and delivery closes
    /// the order. Sequence numbers are assigned in that final order.
    pub fn to_events(&self, ping_interval_sec: u32) -> Result<Vec<OrderEvent>, OrderSkip> {
        let items_json = serde_json::to_string(&self.basket)?;
        let route_points: Vec<[f64; 2]> = self.route.iter().map(|c| [c.lat, c.lon]).collect();
        let route_json = serde_json::to_string(&route_points)?;

        let t = &self.times;
        let mut stages = vec![
            (EventType::OrderCreated, t.created),
            (EventType::KitchenStarted, t.started),
            (EventType::KitchenFinished, t.finished),
            (EventType::KitchenReady, t.ready),
            (EventType::DriverArrived, t.driver_arrived),
            (EventType::DriverPickedUp, t.picked_up),
        ];
        stages.sort_by_key(|(_, ts)| *ts);

        let mut events = Vec::with_capacity(stages.len() + 1 + self.ping_count(ping_interval_sec) as usize);
        for (event_type, ts) in stages {
            let mut event = OrderEvent::new(self.order_id.clone(), self.location_id, event_type, seconds(ts));
            match event_type {
                EventType::OrderCreated => {
                    event.customer_lat = Some(self.customer.lat as f32);
                    event.customer_lon = Some(self.customer.lon as f32);
                    event.customer_addr = Some(self.customer_addr.clone());
                    event.items_json = Some(items_json.clone());
                }
                EventType::DriverPickedUp => event.route_json = Some(route_json.clone()),
                _ => {}
            }
            events.push(event);
        }

        let num_pings = self.ping_count(ping_interval_sec);
        let last_point = self.route.len().saturating_sub(1);
        for i in 1..num_pings {
            let progress = i as f64 / num_pings as f64;
            let ts = t.picked_up + i as SimMillis * ping_interval_sec as SimMillis * 1000;
            let mut event = OrderEvent::new(self.order_id.clone(), self.location_id, EventType::DriverPing, seconds(ts));
            if let Some(point) = self.route.get((progress * last_point as f64) as usize) {
                event.ping_lat = Some(point.lat as f32);
                event.ping_lon = Some(point.lon as f32);
            }
            event.ping_progress = Some((progress * 100.0) as f32);
            events.push(event);
        }

        let mut delivered = OrderEvent::new(self.order_id.clone(), self.location_id, EventType::Delivered, seconds(t.delivered));
        delivered.customer_lat = Some(self.customer.lat as f32);
        delivered.customer_lon = Some(self.customer.lon as f32);
        events.push(delivered);

        for (sequence, event) in events.iter_mut().enumerate() {
            event.sequence = sequence as u16;
        }
        Ok(events)
    }
}

/// Samples complete orders for one generation run
pub struct OrderGenerator<'a> {
    store: &'a DimensionStore,
    routing: &'a RoutingService,
    config: &'a GeneratorConfig,
}

impl<'a> OrderGenerator<'a> {
    pub fn new(store: &'a DimensionStore, routing: &'a RoutingService, config: &'a GeneratorConfig) -> Self {
        Self { store, routing, config }
    }

    /// Sample an order created during `minute` of `day` at `location`
    pub fn sample_order<R: Rng + ?Sized>(
        &self,
        order_id: OrderId,
        location: &Location,
        day: u32,
        minute: u32,
        rng: &mut R,
    ) -> Result<Order, OrderSkip> {
        let routes = self.routing.for_location(location.location_id)?;
        let customer_node = routes.sample_customer(rng);
        let route = routes.route_to(customer_node)?;
        let drive_minutes = drive_time_minutes(route.distance_m, self.config.driver_mph);

        let basket = BasketSelector::new(self.store, self.config.single_brand_probability)
            .select(location.location_id, day, rng);
        if basket.is_empty() {
            return Err(OrderSkip::EmptyBasket);
        }

        let created_s = day_start_seconds(day) + minute as i64 * 60 + rng.gen_range(0..60);
        let times = LifecycleTimes::sample(
            created_s * 1000,
            drive_minutes,
            &self.config.service_times,
            &self.config.driver_arrival,
            rng,
        );
        if seconds(times.delivered) >= dataset_horizon_seconds() {
            return Err(OrderSkip::PastHorizon);
        }

        Ok(Order {
            order_id,
            location_id: location.location_id,
            day,
            minute,
            customer: routes.graph().coord(customer_node),
            customer_addr: format!("{} Main St", rng.gen_range(1..=9999)),
            basket,
            route: route.points,
            drive_minutes,
            times,
        })
    }

    /// Sample an order and flatten it into its event records
    pub fn generate<R: Rng + ?Sized>(
        &self,
        order_id: OrderId,
        location: &Location,
        day: u32,
        minute: u32,
        rng: &mut R,
    ) -> Result<Vec<OrderEvent>, OrderSkip> {
        self.sample_order(order_id, location, day, minute, rng)?
            .to_events(self.config.ping_interval_sec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::routing::{GraphSource, LocationRoutes, NetworkEdge, NetworkNode, RoadNetwork};
    use crate::core::rng::RngContext;
    use crate::core::types::DATASET_DAYS;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_routing(store: &DimensionStore) -> RoutingService {
        let source = GraphSource::new().with_radius_m(1200.0);
        RoutingService::build(store.locations(), &source, &RngContext::new(8)).unwrap()
    }

    #[test]
    fn test_generated_orders_are_well_formed() {
        let store = DimensionStore::builtin();
        let routing = small_routing(&store);
        let config = GeneratorConfig::default();
        let generator = OrderGenerator::new(&store, &routing, &config);
        let mut rng = StdRng::seed_from_u64(21);

        for (n, location) in store.locations().iter().enumerate() {
            for minute in [0, 300, 720, 1100, 1439] {
                let events = generator
                    .generate(format!("T{:05}", n * 10_000 + minute), location, 12, minute as u32, &mut rng)
                    .unwrap();

                assert_eq!(events.first().map(|e| e.event_type_id), Some(1));
                assert_eq!(events.last().map(|e| e.event_type_id), Some(8));
                for (i, event) in events.iter().enumerate() {
                    assert_eq!(event.sequence as usize, i);
                    assert_eq!(event.location_id, location.location_id);
                }
                for pair in events.windows(2) {
                    assert!(pair[0].ts_seconds <= pair[1].ts_seconds);
                }

                let ts_of = |t: EventType| events.iter().find(|e| e.event_type() == Some(t)).map(|e| e.ts_seconds).unwrap();
                assert!(ts_of(EventType::OrderCreated) <= ts_of(EventType::DriverArrived));
                assert!(ts_of(EventType::DriverArrived) < ts_of(EventType::DriverPickedUp));
                assert!(ts_of(EventType::KitchenReady) <= ts_of(EventType::Delivered));

                let created = &events[0];
                assert!(created.customer_addr.as_deref().unwrap().ends_with(" Main St"));
                assert!(created.items_json.is_some());
                assert!(created.route_json.is_none());
                let delivered = events.last().unwrap();
                assert_eq!(delivered.customer_lat, created.customer_lat);
                assert_eq!(delivered.customer_lon, created.customer_lon);
            }
        }
    }

    #[test]
    fn test_payload_columns_follow_event_type() {
        let store = DimensionStore::builtin();
        let routing = small_routing(&store);
        let config = GeneratorConfig::default();
        let generator = OrderGenerator::new(&store, &routing, &config);
        let mut rng = StdRng::seed_from_u64(4);

        let events = generator.generate("PAYLD1".to_string(), &store.locations()[0], 3, 600, &mut rng).unwrap();
        for event in &events {
            match event.event_type().unwrap() {
                EventType::DriverPickedUp => {
                    let route: Vec<[f64; 2]> = serde_json::from_str(event.route_json.as_deref().unwrap()).unwrap();
                    assert!(!route.is_empty());
                }
                EventType::DriverPing => {
                    let progress = event.ping_progress.unwrap();
                    assert!(progress > 0.0 && progress < 100.0);
                    assert!(event.ping_lat.is_some() && event.ping_lon.is_some());
                }
                EventType::OrderCreated | EventType::Delivered => {}
                _ => {
                    assert!(event.customer_lat.is_none());
                    assert!(event.items_json.is_none());
                    assert!(event.route_json.is_none());
                    assert!(event.ping_progress.is_none());
                }
            }
        }
    }

    fn line_order(drive_minutes: f64, points: usize) -> Order {
        Order {
            order_id: "LINE01".to_string(),
            location_id: 1,
            day: 0,
            minute: 0,
            customer: Coord::new(1.0, 1.0),
            customer_addr: "1 Main St".to_string(),
            basket: Vec::new(),
            route: (0..points).map(|i| Coord::new(i as f64, 0.0)).collect(),
            drive_minutes,
            times: LifecycleTimes {
                created: 0,
                started: 60_000,
                finished: 600_000,
                ready: 720_000,
                driver_arrived: 700_000,
                picked_up: 1_080_000,
                delivered: 1_080_000 + (drive_minutes * 60_000.0) as i64,
            },
        }
    }

    #[test]
    fn test_ping_cadence_and_positions() {
        let order = line_order(5.5, 11);
        assert_eq!(order.ping_count(60), 5);
        let events = order.to_events(60).unwrap();
        let pings: Vec<_> = events.iter().filter(|e| e.event_type() == Some(EventType::DriverPing)).collect();
        assert_eq!(pings.len(), 4);
        for (i, ping) in pings.iter().enumerate() {
            let i = i as i64 + 1;
            assert_eq!(ping.ts_seconds, 1080 + i * 60);
            assert!((ping.ping_progress.unwrap() - (i as f32 * 20.0)).abs() < 1e-4);
            // progress 0.2 * 10 segments -> point 2
            assert_eq!(ping.ping_lat, Some((i * 2) as f32));
        }
    }

    #[test]
    fn test_short_drive_has_no_pings() {
        let events = line_order(0.4, 1).to_events(60).unwrap();
        assert_eq!(events.len(), 7);
        assert!(events.iter().all(|e| e.event_type() != Some(EventType::DriverPing)));
    }

    #[test]
    fn test_early_driver_is_sequenced_by_time() {
        let mut order = line_order(2.0, 3);
        order.times.driver_arrived = 30_000;
        let events = order.to_events(60).unwrap();
        let types: Vec<u8> = events.iter().take(6).map(|e| e.event_type_id).collect();
        assert_eq!(types, vec![1, 5, 2, 3, 4, 6]);
        assert_eq!(events[1].sequence, 1);
    }

    #[test]
    fn test_last_day_orders_stay_inside_horizon() {
        let store = DimensionStore::builtin();
        let routing = small_routing(&store);
        let config = GeneratorConfig::default();
        let generator = OrderGenerator::new(&store, &routing, &config);
        let mut rng = StdRng::seed_from_u64(77);

        let mut skipped = 0;
        for _ in 0..200 {
            match generator.generate("LATE01".to_string(), &store.locations()[0], DATASET_DAYS - 1, 1439, &mut rng) {
                Ok(events) => assert!(events.iter().all(|e| e.ts_seconds < dataset_horizon_seconds())),
                Err(OrderSkip::PastHorizon) => skipped += 1,
                Err(other) => panic!("unexpected skip {}", other),
            }
        }
        assert!(skipped > 0);
    }

    #[test]
    fn test_unknown_location_is_a_skip() {
        let store = DimensionStore::builtin();
        let location = store.locations()[0].clone();
        let network = RoadNetwork {
            nodes: vec![NetworkNode {
                id: 1,
                lat: location.lat,
                lon: location.lon,
            }],
            edges: Vec::<NetworkEdge>::new(),
        };
        let routing = RoutingService::from_routes([LocationRoutes::build(&location, &network, 500.0).unwrap()]);
        let config = GeneratorConfig::default();
        let generator = OrderGenerator::new(&store, &routing, &config);
        let mut rng = StdRng::seed_from_u64(1);

        let other = store.locations()[1].clone();
        assert!(matches!(
            generator.generate("NOWHERE".to_string(), &other, 0, 0, &mut rng),
            Err(OrderSkip::NoRoute(_))
        ));
        // A single-node graph still yields an order delivered on the spot
        let events = generator.generate("HERE01".to_string(), &location, 0, 0, &mut rng).unwrap();
        assert_eq!(events.len(), 7);
    }
}
