use super::checkpoint::Checkpoint;
use super::clock::{Clock, SystemClock};
use super::config::ReaderConfig;
use super::expand::{expand, ExpandedEvent};
use crate::core::dataset::EventDataset;
use crate::core::errors::StreamError;
use crate::core::types::{dataset_horizon_seconds, day_start_seconds, DATASET_EPOCH_SECONDS};
use chrono::{DateTime, Timelike, Utc};
use log::info;

/// One replay read: the expanded events of `[start_seconds, end_seconds)`
/// and the checkpoint to hand back on the next read
#[derive(Debug, Clone)]
pub struct ReadBatch {
    pub events: Vec<ExpandedEvent>,
    pub start_seconds: i64,
    pub end_seconds: i64,
    pub checkpoint: Checkpoint,
}

/// Pull-based replay of a generated dataset in simulated time.
///
/// Holds no progress of its own: every read is driven entirely by the
/// checkpoint passed in, and returns the next one.
pub struct StreamReader<C: Clock = SystemClock> {
    config: ReaderConfig,
    dataset: EventDataset,
    clock: C,
}

impl StreamReader<SystemClock> {
    /// Validate `config` and load its dataset from disk
    pub fn open(config: ReaderConfig) -> Result<Self, StreamError> {
        config.validate()?;
        let dataset = EventDataset::open(&config.dataset_path)?;
        Self::new(config, dataset, SystemClock)
    }
}

impl<C: Clock> StreamReader<C> {
    pub fn new(config: ReaderConfig, dataset: EventDataset, clock: C) -> Result<Self, StreamError> {
        config.validate()?;
        Ok(Self { config, dataset, clock })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn dataset(&self) -> &EventDataset {
        &self.dataset
    }

    /// Checkpoint for a stream that has never been read
    pub fn initial_offset(&self) -> Checkpoint {
        Checkpoint::new(DATASET_EPOCH_SECONDS, self.clock.now(), true)
    }

    /// Ceiling of the stream: the end of the dataset, not the next window
    pub fn latest_offset(&self) -> Checkpoint {
        Checkpoint::new(dataset_horizon_seconds(), self.clock.now(), false)
    }

    /// End of the window a read starting from `checkpoint` at `now` covers
    fn window_end(&self, checkpoint: &Checkpoint, now: DateTime<Utc>) -> i64 {
        let end = if checkpoint.is_initial {
            day_start_seconds(self.config.simulation_start_day) + now.num_seconds_from_midnight() as i64
        } else {
            // A clock that stepped backwards reads as no elapsed time
            let elapsed_ms = (now - checkpoint.offset_timestamp).num_milliseconds().max(0);
            let elapsed_sim = (elapsed_ms as f64 / 1000.0 * self.config.speed_multiplier).floor() as i64;
            checkpoint.simulation_seconds.saturating_add(elapsed_sim)
        };
        end.min(dataset_horizon_seconds()).max(checkpoint.simulation_seconds)
    }

    /// Read every event from the checkpoint's position up to now.
    ///
    /// An initial checkpoint yields the catch-up window up to the configured
    /// start day at the current time of day; later checkpoints advance by the
    /// elapsed wall time times the speed multiplier. `None` starts from
    /// simulated second zero with an empty window.
    pub fn read(&self, checkpoint: Option<&Checkpoint>) -> Result<ReadBatch, StreamError> {
        let now = self.clock.now();
        let start = match checkpoint {
            Some(checkpoint) => checkpoint.clone(),
            None => Checkpoint::new(0, now, false),
        };

        let start_seconds = start.simulation_seconds;
        let end_seconds = self.window_end(&start, now);

        let events = self
            .dataset
            .window(start_seconds, end_seconds)
            .iter()
            .map(expand)
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Read {} events in [{}, {}) ({})",
            events.len(),
            start_seconds,
            end_seconds,
            if start.is_initial { "catch-up" } else { "steady" }
        );

        Ok(ReadBatch {
            events,
            start_seconds,
            end_seconds,
            checkpoint: Checkpoint::new(end_seconds, now, false),
        })
    }

    /// Acknowledge a checkpoint; storing it is the caller's job
    pub fn commit(&self, checkpoint: &Checkpoint) {
        info!(
            "Committed checkpoint at simulated second {} ({})",
            checkpoint.simulation_seconds, checkpoint.offset_timestamp
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::{EventType, OrderEvent};
    use crate::core::stream::clock::ManualClock;
    use crate::core::types::SECONDS_PER_DAY;
    use chrono::Duration;
    use std::sync::Arc;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(seconds, 0).unwrap()
    }

    /// One event every ten simulated minutes over the first three days
    fn dataset() -> EventDataset {
        let events = (0..(3 * SECONDS_PER_DAY / 600))
            .map(|i| OrderEvent::new(format!("O{:05}", i), 1, EventType::KitchenStarted, DATASET_EPOCH_SECONDS + i * 600))
            .collect();
        EventDataset::from_events(events)
    }

    fn reader(start_day: u32, speed: f64, clock: Arc<ManualClock>) -> StreamReader<Arc<ManualClock>> {
        let config = ReaderConfig::new()
            .with_simulation_start_day(start_day)
            .with_speed_multiplier(speed);
        StreamReader::new(config, dataset(), clock).unwrap()
    }

    #[test]
    fn test_offsets() {
        // 2025-06-01 10:30:00 UTC
        let clock = Arc::new(ManualClock::new(at(1_748_773_800)));
        let reader = reader(2, 1.0, clock);
        let initial = reader.initial_offset();
        assert!(initial.is_initial);
        assert_eq!(initial.simulation_seconds, DATASET_EPOCH_SECONDS);
        assert_eq!(reader.latest_offset().simulation_seconds, dataset_horizon_seconds());
        assert!(reader.latest_offset().simulation_seconds >= initial.simulation_seconds);
    }

    #[test]
    fn test_catch_up_read_uses_time_of_day() {
        let clock = Arc::new(ManualClock::new(at(1_748_773_800)));
        let reader = reader(2, 1000.0, clock.clone());
        let batch = reader.read(Some(&reader.initial_offset())).unwrap();

        let expected_end = DATASET_EPOCH_SECONDS + 2 * SECONDS_PER_DAY + 10 * 3600 + 30 * 60;
        assert_eq!(batch.start_seconds, DATASET_EPOCH_SECONDS);
        assert_eq!(batch.end_seconds, expected_end);
        assert!(!batch.checkpoint.is_initial);
        assert_eq!(batch.checkpoint.simulation_seconds, expected_end);
        assert_eq!(batch.checkpoint.offset_timestamp, clock.now());
        // Events every 600 s from the epoch up to (not including) 58.5 h
        assert_eq!(batch.events.len(), ((expected_end - DATASET_EPOCH_SECONDS) / 600) as usize);
        assert!(batch.events.iter().all(|e| e.ts_seconds < expected_end));
    }

    #[test]
    fn test_steady_reads_follow_speed() {
        let clock = Arc::new(ManualClock::new(at(1_748_773_800)));
        let reader = reader(0, 60.0, clock.clone());
        let first = reader.read(Some(&reader.initial_offset())).unwrap();

        clock.advance(Duration::milliseconds(1000));
        let second = reader.read(Some(&first.checkpoint)).unwrap();
        assert_eq!(second.start_seconds, first.end_seconds);
        assert_eq!(second.end_seconds - second.start_seconds, 60);

        clock.advance(Duration::milliseconds(10_500));
        let third = reader.read(Some(&second.checkpoint)).unwrap();
        assert_eq!(third.start_seconds, second.end_seconds);
        assert_eq!(third.end_seconds - third.start_seconds, 630);
    }

    #[test]
    fn test_clock_skew_never_rewinds() {
        let clock = Arc::new(ManualClock::new(at(1_748_773_800)));
        let reader = reader(1, 5.0, clock.clone());
        let first = reader.read(Some(&reader.initial_offset())).unwrap();

        clock.advance(Duration::seconds(-30));
        let second = reader.read(Some(&first.checkpoint)).unwrap();
        assert_eq!(second.start_seconds, second.end_seconds);
        assert!(second.events.is_empty());
        assert!(second.checkpoint.simulation_seconds >= first.checkpoint.simulation_seconds);
    }

    #[test]
    fn test_end_is_clamped_to_horizon() {
        let clock = Arc::new(ManualClock::new(at(1_748_773_800)));
        let reader = reader(0, 1000.0, clock.clone());
        let near_end = Checkpoint::new(dataset_horizon_seconds() - 100, clock.now(), false);

        clock.advance(Duration::seconds(60));
        let batch = reader.read(Some(&near_end)).unwrap();
        assert_eq!(batch.end_seconds, dataset_horizon_seconds());

        clock.advance(Duration::seconds(60));
        let after = reader.read(Some(&batch.checkpoint)).unwrap();
        assert_eq!(after.start_seconds, after.end_seconds);
    }

    #[test]
    fn test_bootstrap_without_checkpoint_is_empty() {
        let clock = Arc::new(ManualClock::new(at(1_748_773_800)));
        let reader = reader(0, 60.0, clock);
        let batch = reader.read(None).unwrap();
        assert_eq!(batch.start_seconds, 0);
        assert_eq!(batch.end_seconds, 0);
        assert!(batch.events.is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ReaderConfig::new().with_speed_multiplier(0.0);
        let clock = Arc::new(ManualClock::new(at(0)));
        assert!(matches!(
            StreamReader::new(config, EventDataset::default(), clock),
            Err(StreamError::Config(_))
        ));
    }
}
