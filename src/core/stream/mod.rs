//! Checkpointed replay of a generated dataset as a time-windowed stream

pub mod checkpoint;
pub mod clock;
pub mod config;
pub mod expand;
pub mod reader;

pub use checkpoint::Checkpoint;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ReaderConfig;
pub use expand::{expand, EventBody, ExpandedEvent};
pub use reader::{ReadBatch, StreamReader};
