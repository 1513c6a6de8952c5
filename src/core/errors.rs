use super::types::LocationId;
use thiserror::Error;

/// Errors raised while loading or validating reference data.
#[derive(Debug, Error)]
pub enum DimensionError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dimension file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid dimension data: {0}")]
    Invalid(String),
}

/// Errors raised by the routing service.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Neither the directed nor the undirected graph connects the two nodes
    #[error("No path between nodes {from} and {to}")]
    NoPath { from: u64, to: u64 },

    #[error("Graph for location {0} has no nodes inside the neighbourhood radius")]
    EmptyGraph(LocationId),

    #[error("No routing graph loaded for location {0}")]
    UnknownLocation(LocationId),

    #[error("Graph cache I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed graph cache {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while writing or loading the persisted record set.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Column {column} missing or of unexpected type")]
    Schema { column: String },

    #[error("Payload encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Invalid configuration values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Option {key} has invalid value {value:?}: {reason}")]
    InvalidOption {
        key: String,
        value: String,
        reason: String,
    },
}

/// Errors raised by the replay reader.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("Malformed checkpoint: {0}")]
    Checkpoint(#[from] serde_json::Error),

    #[error("Order {order_id} has unknown event type {event_type_id}")]
    UnknownEventType { order_id: String, event_type_id: u8 },

    #[error("Malformed payload on order {order_id}: {source}")]
    Payload {
        order_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reasons an individual order is dropped during generation.
#[derive(Debug, Error)]
pub enum OrderSkip {
    #[error("No route to customer: {0}")]
    NoRoute(#[from] RoutingError),

    #[error("No active brand offered any items")]
    EmptyBasket,

    #[error("Delivery would fall past the dataset horizon")]
    PastHorizon,

    #[error("Payload encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Errors that abort a whole generation run.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Errors raised while planning or running a pipeline.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    #[error("Stage {stage} reads {input}, which is neither a source nor a stage output")]
    UnknownInput { stage: String, input: String },

    #[error("Stage name {0} is declared twice")]
    DuplicateStage(String),

    #[error("Cycle detected between stages {0:?}")]
    Cycle(Vec<String>),
}
