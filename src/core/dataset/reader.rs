use super::*;
use crate::core::errors::DatasetError;
use crate::core::event::OrderEvent;
use arrow::array::{Array, Float32Array, Int64Array, StringArray, UInt16Array, UInt8Array};
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

/// The whole persisted record set, held in memory ordered by
/// (ts_seconds, sequence, order_id) so any time window is a contiguous slice.
#[derive(Debug, Clone, Default)]
pub struct EventDataset {
    events: Vec<OrderEvent>,
}

impl EventDataset {
    pub fn from_events(mut events: Vec<OrderEvent>) -> Self {
        events.sort_by(|a, b| {
            a.sort_key()
                .cmp(&b.sort_key())
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        Self { events }
    }

    /// Load `events.parquet` from a dataset directory
    pub fn open(dataset_dir: &Path) -> Result<Self, DatasetError> {
        Self::load(&dataset_dir.join(EVENTS_FILE))
    }

    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        let mut events = Vec::new();
        for batch in reader {
            read_batch(&batch?, &mut events)?;
        }

        let dataset = Self::from_events(events);
        info!(
            "Loaded {} events for {} orders from {}",
            dataset.len(),
            dataset.unique_orders(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[OrderEvent] {
        &self.events
    }

    pub fn unique_orders(&self) -> usize {
        self.events.iter().map(|e| e.order_id.as_str()).collect::<HashSet<_>>().len()
    }

    /// Events with `start <= ts_seconds < end`
    pub fn window(&self, start: i64, end: i64) -> &[OrderEvent] {
        if end <= start {
            return &[];
        }
        let lo = self.events.partition_point(|e| e.ts_seconds < start);
        let hi = self.events.partition_point(|e| e.ts_seconds < end);
        &self.events[lo..hi]
    }
}

fn column<'b, T: 'static>(batch: &'b RecordBatch, name: &str) -> Result<&'b T, DatasetError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| DatasetError::Schema { column: name.to_string() })
}

fn read_batch(batch: &RecordBatch, out: &mut Vec<OrderEvent>) -> Result<(), DatasetError> {
    let order_ids = column::<StringArray>(batch, COL_ORDER_ID)?;
    let locations = column::<UInt8Array>(batch, COL_LOCATION_ID)?;
    let event_types = column::<UInt8Array>(batch, COL_EVENT_TYPE_ID)?;
    let timestamps = column::<Int64Array>(batch, COL_TS_SECONDS)?;
    let sequences = column::<UInt16Array>(batch, COL_SEQUENCE)?;
    let customer_lat = column::<Float32Array>(batch, COL_CUSTOMER_LAT)?;
    let customer_lon = column::<Float32Array>(batch, COL_CUSTOMER_LON)?;
    let customer_addr = column::<StringArray>(batch, COL_CUSTOMER_ADDR)?;
    let items = column::<StringArray>(batch, COL_ITEMS_JSON)?;
    let routes = column::<StringArray>(batch, COL_ROUTE_JSON)?;
    let ping_lat = column::<Float32Array>(batch, COL_PING_LAT)?;
    let ping_lon = column::<Float32Array>(batch, COL_PING_LON)?;
    let ping_progress = column::<Float32Array>(batch, COL_PING_PROGRESS)?;

    let float = |arr: &Float32Array, i: usize| (!arr.is_null(i)).then(|| arr.value(i));
    let text = |arr: &StringArray, i: usize| (!arr.is_null(i)).then(|| arr.value(i).to_string());

    out.reserve(batch.num_rows());
    for i in 0..batch.num_rows() {
        out.push(OrderEvent {
            order_id: order_ids.value(i).to_string(),
            location_id: locations.value(i),
            event_type_id: event_types.value(i),
            ts_seconds: timestamps.value(i),
            sequence: sequences.value(i),
            customer_lat: float(customer_lat, i),
            customer_lon: float(customer_lon, i),
            customer_addr: text(customer_addr, i),
            items_json: text(items, i),
            route_json: text(routes, i),
            ping_lat: float(ping_lat, i),
            ping_lon: float(ping_lon, i),
            ping_progress: float(ping_progress, i),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dataset::DatasetWriter;
    use crate::core::event::EventType;

    fn sample_events() -> Vec<OrderEvent> {
        let mut created = OrderEvent::new("ABC123".to_string(), 2, EventType::OrderCreated, 1_704_070_000);
        created.customer_lat = Some(37.44);
        created.customer_lon = Some(-122.14);
        created.customer_addr = Some("42 Main St".to_string());
        created.items_json = Some("[]".to_string());

        let mut ping = OrderEvent::new("ABC123".to_string(), 2, EventType::DriverPing, 1_704_071_000);
        ping.sequence = 7;
        ping.ping_lat = Some(37.45);
        ping.ping_lon = Some(-122.15);
        ping.ping_progress = Some(50.0);

        let mut other = OrderEvent::new("XYZ789".to_string(), 4, EventType::KitchenStarted, 1_704_070_500);
        other.sequence = 1;

        vec![ping, created, other]
    }

    #[test]
    fn test_parquet_load_restores_events() {
        let dir = std::env::temp_dir().join(format!("gksim_reader_{}", uuid::Uuid::new_v4()));
        let events = EventDataset::from_events(sample_events());
        DatasetWriter::write_parquet(events.events(), &dir.join(EVENTS_FILE)).unwrap();

        let loaded = EventDataset::open(&dir).unwrap();
        assert_eq!(loaded.events(), events.events());
        assert_eq!(loaded.unique_orders(), 2);
        assert!(loaded.events()[1].customer_addr.is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = std::env::temp_dir().join(format!("gksim_missing_{}", uuid::Uuid::new_v4()));
        assert!(matches!(EventDataset::open(&dir), Err(DatasetError::Io { .. })));
    }

    #[test]
    fn test_window_is_half_open() {
        let dataset = EventDataset::from_events(sample_events());
        assert_eq!(dataset.window(1_704_070_000, 1_704_070_500).len(), 1);
        assert_eq!(dataset.window(1_704_070_000, 1_704_070_501).len(), 2);
        assert_eq!(dataset.window(1_704_070_001, 1_704_080_000).len(), 2);
        assert!(dataset.window(1_704_080_000, 1_704_070_000).is_empty());
        assert!(dataset.window(0, 0).is_empty());
    }
}
