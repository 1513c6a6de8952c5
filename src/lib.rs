pub mod core;

// Re-export commonly used types
pub use crate::core::dataset::{DatasetWriter, EventDataset};
pub use crate::core::dimensions::DimensionStore;
pub use crate::core::event::{EventType, OrderEvent};
pub use crate::core::generator::{ConcurrencyMode, DatasetGenerator, GeneratedDataset, GenerationStats, GeneratorConfig};
pub use crate::core::routing::{GraphSource, RoutingService};
pub use crate::core::stream::{Checkpoint, ExpandedEvent, ReaderConfig, StreamReader};
