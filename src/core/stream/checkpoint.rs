use crate::core::errors::StreamError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Replay progress marker, stored verbatim by the caller between reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Absolute simulated second the next read starts from
    pub simulation_seconds: i64,
    /// Wall-clock time the checkpoint was produced
    pub offset_timestamp: DateTime<Utc>,
    /// True until the catch-up read has run
    #[serde(default)]
    pub is_initial: bool,
}

impl Checkpoint {
    pub fn new(simulation_seconds: i64, offset_timestamp: DateTime<Utc>, is_initial: bool) -> Self {
        Self {
            simulation_seconds,
            offset_timestamp,
            is_initial,
        }
    }

    pub fn to_json(&self) -> Result<String, StreamError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, StreamError> {
        Ok(serde_json::from_str(raw)?)
    }
}
