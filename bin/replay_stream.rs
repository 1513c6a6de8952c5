//! Replay a generated dataset as a live stream of JSON events on stdout

use anyhow::Context;
use clap::Parser;
use gksim::core::types::dataset_horizon_seconds;
use gksim::{Checkpoint, ReaderConfig, StreamReader};
use log::info;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "replay_stream")]
#[command(about = "Replay ghost-kitchen events in simulated time")]
struct Cli {
    /// Directory holding events.parquet
    #[arg(short, long, default_value = "./canonical_dataset")]
    dataset: PathBuf,

    /// Simulated day the first read catches up to
    #[arg(long, default_value_t = 70)]
    start_day: u32,

    /// Simulated seconds per wall-clock second
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Wall-clock pause between reads, in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// File the checkpoint is stored in and resumed from
    #[arg(long, default_value = "./replay_checkpoint.json")]
    checkpoint: PathBuf,

    /// Stop after this many reads
    #[arg(long)]
    max_reads: Option<u64>,
}

fn load_checkpoint(path: &Path) -> anyhow::Result<Option<Checkpoint>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(Some(Checkpoint::from_json(&raw)?))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let config = ReaderConfig::new()
        .with_dataset_path(&cli.dataset)
        .with_simulation_start_day(cli.start_day)
        .with_speed_multiplier(cli.speed);
    let reader = StreamReader::open(config)?;

    let mut checkpoint = match load_checkpoint(&cli.checkpoint)? {
        Some(saved) => {
            info!("Resuming from simulated second {}", saved.simulation_seconds);
            saved
        }
        None => reader.initial_offset(),
    };

    let mut reads = 0u64;
    loop {
        let batch = reader.read(Some(&checkpoint))?;
        for event in &batch.events {
            println!("{}", serde_json::to_string(event)?);
        }

        std::fs::write(&cli.checkpoint, batch.checkpoint.to_json()?)
            .with_context(|| format!("writing {}", cli.checkpoint.display()))?;
        reader.commit(&batch.checkpoint);
        checkpoint = batch.checkpoint;

        reads += 1;
        if cli.max_reads.is_some_and(|max| reads >= max) {
            break;
        }
        if checkpoint.simulation_seconds >= dataset_horizon_seconds() {
            info!("Reached the end of the dataset");
            break;
        }
        thread::sleep(Duration::from_millis(cli.interval_ms));
    }
    Ok(())
}
