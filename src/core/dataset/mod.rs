//! Persisted record set: one Parquet file of compact event rows.

pub mod reader;
pub mod writer;

pub use reader::EventDataset;
pub use writer::DatasetWriter;

use arrow::datatypes::{DataType, Field, Schema};

/// File name of the event table inside a dataset directory
pub const EVENTS_FILE: &str = "events.parquet";

pub const COL_ORDER_ID: &str = "order_id";
pub const COL_LOCATION_ID: &str = "location_id";
pub const COL_EVENT_TYPE_ID: &str = "event_type_id";
pub const COL_TS_SECONDS: &str = "ts_seconds";
pub const COL_SEQUENCE: &str = "sequence";
pub const COL_CUSTOMER_LAT: &str = "customer_lat";
pub const COL_CUSTOMER_LON: &str = "customer_lon";
pub const COL_CUSTOMER_ADDR: &str = "customer_addr";
pub const COL_ITEMS_JSON: &str = "items_json";
pub const COL_ROUTE_JSON: &str = "route_json";
pub const COL_PING_LAT: &str = "ping_lat";
pub const COL_PING_LON: &str = "ping_lon";
pub const COL_PING_PROGRESS: &str = "ping_progress";

/// Arrow schema of the persisted event table
pub fn event_schema() -> Schema {
    Schema::new(vec![
        Field::new(COL_ORDER_ID, DataType::Utf8, false),
        Field::new(COL_LOCATION_ID, DataType::UInt8, false),
        Field::new(COL_EVENT_TYPE_ID, DataType::UInt8, false),
        Field::new(COL_TS_SECONDS, DataType::Int64, false),
        Field::new(COL_SEQUENCE, DataType::UInt16, false),
        // Payload columns, populated only for the event types that carry them
        Field::new(COL_CUSTOMER_LAT, DataType::Float32, true),
        Field::new(COL_CUSTOMER_LON, DataType::Float32, true),
        Field::new(COL_CUSTOMER_ADDR, DataType::Utf8, true),
        Field::new(COL_ITEMS_JSON, DataType::Utf8, true),
        Field::new(COL_ROUTE_JSON, DataType::Utf8, true),
        Field::new(COL_PING_LAT, DataType::Float32, true),
        Field::new(COL_PING_LON, DataType::Float32, true),
        Field::new(COL_PING_PROGRESS, DataType::Float32, true),
    ])
}
