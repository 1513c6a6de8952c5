use gksim::core::dataset::{DatasetWriter, EVENTS_FILE};
use gksim::core::errors::StreamError;
use gksim::core::pipeline::order_events::{GOLD_LOCATION_DAILY, RAW_EVENTS};
use gksim::core::pipeline::{events_to_table, order_events_pipeline};
use gksim::core::rng::RngContext;
use gksim::core::stream::expand;
use gksim::core::types::{dataset_horizon_seconds, DATASET_EPOCH_SECONDS, SECONDS_PER_DAY};
use gksim::{
    Checkpoint, ConcurrencyMode, DatasetGenerator, DimensionStore, EventDataset, GeneratedDataset, GeneratorConfig,
    GraphSource, ReaderConfig, RoutingService,
};
use std::collections::HashMap;
use std::path::PathBuf;

/// Scratch dataset directory removed on drop
struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new(prefix: &str) -> Self {
        Self(std::env::temp_dir().join(format!("{}_{}", prefix, uuid::Uuid::new_v4())))
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.0).ok();
    }
}

fn generate(store: &DimensionStore, days: u32, seed: u64) -> GeneratedDataset {
    let source = GraphSource::new().with_radius_m(1500.0);
    let routing = RoutingService::build(store.locations(), &source, &RngContext::new(seed)).unwrap();
    let config = GeneratorConfig::new()
        .with_days(days)
        .with_seed(seed)
        .with_concurrency(ConcurrencyMode::Rayon);
    DatasetGenerator::new(store, &routing, config).run().unwrap()
}

/// Generate, persist with dimensions, and return the directory
fn persisted_dataset(days: u32, seed: u64) -> (ScratchDir, GeneratedDataset) {
    let dir = ScratchDir::new("gksim_api");
    let store = DimensionStore::builtin();
    let dataset = generate(&store, days, seed);
    DatasetWriter::write_parquet(&dataset.events, &dir.0.join(EVENTS_FILE)).unwrap();
    store.save_dir(&dir.0).unwrap();
    (dir, dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_then_replay_from_disk() -> anyhow::Result<()> {
        let (dir, dataset) = persisted_dataset(1, 3);
        let options = HashMap::from([
            ("datasetPath".to_string(), dir.0.display().to_string()),
            ("simulationStartDay".to_string(), "0".to_string()),
            ("speedMultiplier".to_string(), "60".to_string()),
        ]);
        let reader = gksim::StreamReader::open(ReaderConfig::from_options(&options)?)?;
        assert_eq!(reader.dataset().len(), dataset.events.len());
        assert_eq!(reader.dataset().unique_orders(), dataset.stats.orders);

        let initial = reader.initial_offset();
        let batch = reader.read(Some(&initial))?;
        assert_eq!(batch.start_seconds, DATASET_EPOCH_SECONDS);
        assert!(batch.end_seconds < DATASET_EPOCH_SECONDS + SECONDS_PER_DAY);
        let expected = dataset
            .events
            .iter()
            .filter(|e| e.ts_seconds < batch.end_seconds)
            .count();
        assert_eq!(batch.events.len(), expected);

        // The caller persists the checkpoint verbatim and resumes from it
        let stored = batch.checkpoint.to_json()?;
        let resumed = Checkpoint::from_json(&stored)?;
        assert_eq!(resumed, batch.checkpoint);
        reader.commit(&resumed);
        let next = reader.read(Some(&resumed))?;
        assert_eq!(next.start_seconds, batch.end_seconds);
        assert!(next.end_seconds <= dataset_horizon_seconds());
        Ok(())
    }

    #[test]
    fn test_dimensions_saved_next_to_events() -> anyhow::Result<()> {
        let (dir, _dataset) = persisted_dataset(1, 4);
        let loaded = DimensionStore::load_dir(&dir.0)?;
        let builtin = DimensionStore::builtin();
        assert_eq!(loaded.locations(), builtin.locations());
        assert_eq!(loaded.categories(), builtin.categories());
        Ok(())
    }

    #[test]
    fn test_same_seed_same_file_contents() -> anyhow::Result<()> {
        let (first, _) = persisted_dataset(1, 9);
        let (second, _) = persisted_dataset(1, 9);
        let a = EventDataset::open(&first.0)?;
        let b = EventDataset::open(&second.0)?;
        assert_eq!(a.events(), b.events());
        Ok(())
    }

    #[test]
    fn test_pipeline_over_persisted_dataset() -> anyhow::Result<()> {
        let (dir, dataset) = persisted_dataset(1, 5);
        let events = EventDataset::open(&dir.0)?
            .events()
            .iter()
            .map(expand)
            .collect::<Result<Vec<_>, _>>()?;

        let run = order_events_pipeline().run(HashMap::from([(RAW_EVENTS.to_string(), events_to_table(&events))]))?;
        let gold = run.table(GOLD_LOCATION_DAILY).map(|t| t.len()).unwrap_or(0);
        let locations = DimensionStore::builtin().locations().len();
        assert!(gold >= 1 && gold <= locations);
        let orders: i64 = run
            .table(GOLD_LOCATION_DAILY)
            .into_iter()
            .flatten()
            .filter_map(|row| row["orders"].as_i64())
            .sum();
        assert_eq!(orders as usize, dataset.stats.orders);
        Ok(())
    }

    #[test]
    fn test_missing_dataset_fails_to_open() {
        let missing = ScratchDir::new("gksim_missing");
        let config = ReaderConfig::new().with_dataset_path(&missing.0);
        assert!(matches!(gksim::StreamReader::open(config), Err(StreamError::Dataset(_))));
    }
}
