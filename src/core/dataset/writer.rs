use super::event_schema;
use crate::core::errors::DatasetError;
use crate::core::event::OrderEvent;
use crate::core::generator::random_order_id;
use crate::core::rng::{RngContext, StreamDomain};
use crate::core::types::OrderId;
use arrow::array::{ArrayRef, Float32Builder, Int64Builder, StringBuilder, UInt16Builder, UInt8Builder};
use arrow::record_batch::RecordBatch;
use log::{debug, info};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Accumulates every order's events into one dataset-wide record set.
///
/// Order ids are checked against everything pushed so far; a colliding id is
/// replaced on all of that order's events.
pub struct DatasetWriter {
    seen: HashSet<OrderId>,
    rng: StdRng,
    events: Vec<OrderEvent>,
    id_collisions: usize,
}

impl DatasetWriter {
    pub fn new(ctx: &RngContext) -> Self {
        Self {
            seen: HashSet::new(),
            rng: ctx.stream(StreamDomain::Writer, 0, 0),
            events: Vec::new(),
            id_collisions: 0,
        }
    }

    /// Add one order's events; returns the id the order was stored under
    pub fn push_order(&mut self, mut events: Vec<OrderEvent>) -> Option<OrderId> {
        let mut order_id = events.first()?.order_id.clone();

        if self.seen.contains(&order_id) {
            let provisional = order_id.clone();
            while self.seen.contains(&order_id) {
                order_id = random_order_id(&mut self.rng);
            }
            self.id_collisions += 1;
            debug!("Order id {} already used, reassigned to {}", provisional, order_id);
            for event in events.iter_mut() {
                event.order_id = order_id.clone();
            }
        }

        self.seen.insert(order_id.clone());
        self.events.extend(events);
        Some(order_id)
    }

    pub fn order_count(&self) -> usize {
        self.seen.len()
    }

    pub fn id_collisions(&self) -> usize {
        self.id_collisions
    }

    /// All events ordered by (ts_seconds, sequence, order_id)
    pub fn finish(mut self) -> Vec<OrderEvent> {
        self.events.sort_by(|a, b| {
            a.sort_key()
                .cmp(&b.sort_key())
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        self.events
    }

    /// Write `events` as a single Snappy-compressed Parquet file
    pub fn write_parquet(events: &[OrderEvent], path: &Path) -> Result<(), DatasetError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| DatasetError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let schema = Arc::new(event_schema());
        let batch = RecordBatch::try_new(schema.clone(), build_columns(events))?;

        let file = File::create(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        info!("Wrote {} events to {}", events.len(), path.display());
        Ok(())
    }
}

fn build_columns(events: &[OrderEvent]) -> Vec<ArrayRef> {
    let num_rows = events.len();

    let mut order_id_builder = StringBuilder::with_capacity(num_rows, num_rows * 6);
    let mut location_builder = UInt8Builder::with_capacity(num_rows);
    let mut event_type_builder = UInt8Builder::with_capacity(num_rows);
    let mut ts_builder = Int64Builder::with_capacity(num_rows);
    let mut sequence_builder = UInt16Builder::with_capacity(num_rows);

    let mut customer_lat_builder = Float32Builder::with_capacity(num_rows);
    let mut customer_lon_builder = Float32Builder::with_capacity(num_rows);
    let mut customer_addr_builder = StringBuilder::new();
    let mut items_builder = StringBuilder::new();
    let mut route_builder = StringBuilder::new();
    let mut ping_lat_builder = Float32Builder::with_capacity(num_rows);
    let mut ping_lon_builder = Float32Builder::with_capacity(num_rows);
    let mut ping_progress_builder = Float32Builder::with_capacity(num_rows);

    for event in events {
        order_id_builder.append_value(&event.order_id);
        location_builder.append_value(event.location_id);
        event_type_builder.append_value(event.event_type_id);
        ts_builder.append_value(event.ts_seconds);
        sequence_builder.append_value(event.sequence);

        customer_lat_builder.append_option(event.customer_lat);
        customer_lon_builder.append_option(event.customer_lon);
        customer_addr_builder.append_option(event.customer_addr.as_deref());
        items_builder.append_option(event.items_json.as_deref());
        route_builder.append_option(event.route_json.as_deref());
        ping_lat_builder.append_option(event.ping_lat);
        ping_lon_builder.append_option(event.ping_lon);
        ping_progress_builder.append_option(event.ping_progress);
    }

    vec![
        Arc::new(order_id_builder.finish()),
        Arc::new(location_builder.finish()),
        Arc::new(event_type_builder.finish()),
        Arc::new(ts_builder.finish()),
        Arc::new(sequence_builder.finish()),
        Arc::new(customer_lat_builder.finish()),
        Arc::new(customer_lon_builder.finish()),
        Arc::new(customer_addr_builder.finish()),
        Arc::new(items_builder.finish()),
        Arc::new(route_builder.finish()),
        Arc::new(ping_lat_builder.finish()),
        Arc::new(ping_lon_builder.finish()),
        Arc::new(ping_progress_builder.finish()),
    ]
}
