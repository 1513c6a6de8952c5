
use crate::core::dimensions::DimensionStore;
use crate::core::generator::{DatasetGenerator, GeneratedDataset, GeneratorConfig};
use crate::core::rng::RngContext;
use crate::core::routing::{GraphSource, RoutingService};

/// Small-radius dataset over the built-in dimensions
pub(crate) fn small_dataset(days: u32, seed: u64) -> GeneratedDataset {
    let store = DimensionStore::builtin();
    let source = GraphSource::new().with_radius_m(1500.0);
    let routing = RoutingService::build(store.locations(), &source, &RngContext::new(seed)).unwrap();
    let config = GeneratorConfig::new().with_days(days).with_seed(seed);
    DatasetGenerator::new(&store, &routing, config).run().unwrap()
}
