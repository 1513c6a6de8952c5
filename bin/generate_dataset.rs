//! Generate the canonical ghost-kitchen event dataset

use anyhow::Context;
use clap::Parser;
use gksim::core::dataset::{DatasetWriter, EVENTS_FILE};
use gksim::core::rng::RngContext;
use gksim::{ConcurrencyMode, DatasetGenerator, DimensionStore, GeneratorConfig, GraphSource, RoutingService};
use log::info;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "generate_dataset")]
#[command(about = "Generate 90 days of synthetic ghost-kitchen order events")]
struct Cli {
    /// Directory the dataset is written to
    #[arg(short, long, default_value = "./canonical_dataset")]
    output: PathBuf,

    /// Directory with dimension JSON files (built-in dimensions when omitted)
    #[arg(long)]
    dimensions: Option<PathBuf>,

    /// Directory for cached road networks
    #[arg(long)]
    graph_cache: Option<PathBuf>,

    /// JSON file overriding generator settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of simulated days
    #[arg(long)]
    days: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,

    /// Neighbourhood radius around each kitchen, in meters
    #[arg(long)]
    radius_m: Option<f64>,

    /// Generate locations in parallel
    #[arg(long)]
    parallel: bool,

    /// Worker threads when running in parallel
    #[arg(long, requires = "parallel")]
    threads: Option<usize>,
}

impl Cli {
    fn generator_config(&self) -> anyhow::Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
            }
            None => GeneratorConfig::new(),
        };
        let days = self.days.unwrap_or(config.days);
        config = config.with_days(days);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if self.parallel {
            config = config.with_concurrency(ConcurrencyMode::Rayon);
        }
        if let Some(threads) = self.threads {
            config = config.with_thread_pool_size(threads);
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let config = cli.generator_config()?;

    let store = match &cli.dimensions {
        Some(dir) => DimensionStore::load_dir(dir).with_context(|| format!("loading dimensions from {}", dir.display()))?,
        None => DimensionStore::builtin(),
    };
    println!("Generating dataset");
    println!("  Locations: {}", store.locations().len());
    println!("  Days: {}", config.days);
    println!("  Seed: {}", config.seed);
    println!("  Concurrency: {:?}", config.concurrency_mode);
    println!();

    let mut source = GraphSource::new();
    if let Some(dir) = &cli.graph_cache {
        source = source.with_cache_dir(dir);
    }
    if let Some(radius_m) = cli.radius_m {
        source = source.with_radius_m(radius_m);
    }

    let started = Instant::now();
    let routing = RoutingService::build(store.locations(), &source, &RngContext::new(config.seed))?;
    let dataset = DatasetGenerator::new(&store, &routing, config).run()?;

    DatasetWriter::write_parquet(&dataset.events, &cli.output.join(EVENTS_FILE))?;
    store.save_dir(&cli.output)?;
    info!("Dimensions written to {}", cli.output.display());

    println!("Done in {:.1}s", started.elapsed().as_secs_f64());
    println!("  {}", dataset.stats);
    Ok(())
}
