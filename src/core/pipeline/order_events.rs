//! Medallion pipeline over replayed order events

use super::{Expectation, Layer, Pipeline, Row, Stage, Table};
use crate::core::event::EventType;
use crate::core::stream::ExpandedEvent;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

pub const RAW_EVENTS: &str = "raw_events";
pub const BRONZE_ORDER_EVENTS: &str = "bronze_order_events";
pub const SILVER_ORDER_LIFECYCLE: &str = "silver_order_lifecycle";
pub const GOLD_LOCATION_DAILY: &str = "gold_location_daily";

/// Rows for the `raw_events` source table
pub fn events_to_table(events: &[ExpandedEvent]) -> Table {
    events
        .iter()
        .filter_map(|event| match serde_json::to_value(event) {
            Ok(Value::Object(row)) => Some(row),
            _ => None,
        })
        .collect()
}

pub fn order_events_pipeline() -> Pipeline {
    Pipeline::new()
        .with_stage(
            Stage::new(BRONZE_ORDER_EVENTS, Layer::Bronze, bronze_events)
                .with_inputs(&[RAW_EVENTS])
                .with_schema(&["event_id", "event_type", "ts", "location_id", "order_id", "sequence", "body"])
                .with_expectation(Expectation::drop("valid_order_id", has_order_id))
                .with_expectation(Expectation::drop("known_event_type", has_known_event_type))
                .with_expectation(Expectation::flag("body_present", has_expected_body)),
        )
        .with_stage(
            Stage::new(SILVER_ORDER_LIFECYCLE, Layer::Silver, order_lifecycle)
                .with_inputs(&[BRONZE_ORDER_EVENTS])
                .with_schema(&["order_id", "location_id", "created_ts", "delivered_ts", "item_count"])
                .with_expectation(Expectation::flag("has_delivery", |row| {
                    row.get("delivered_ts").is_some_and(|v| !v.is_null())
                })),
        )
        .with_stage(
            Stage::new(GOLD_LOCATION_DAILY, Layer::Gold, location_daily)
                .with_inputs(&[SILVER_ORDER_LIFECYCLE])
                .with_schema(&["location_id", "day", "orders"]),
        )
}

fn str_field<'r>(row: &'r Row, key: &str) -> Option<&'r str> {
    row.get(key).and_then(Value::as_str)
}

fn has_order_id(row: &Row) -> bool {
    str_field(row, "order_id").is_some_and(|id| !id.trim().is_empty())
}

fn has_known_event_type(row: &Row) -> bool {
    str_field(row, "event_type").and_then(EventType::from_name).is_some()
}

fn has_expected_body(row: &Row) -> bool {
    let carries_payload = matches!(
        str_field(row, "event_type").and_then(EventType::from_name),
        Some(EventType::OrderCreated | EventType::DriverPickedUp | EventType::DriverPing | EventType::Delivered)
    );
    !carries_payload || row.get("body").and_then(Value::as_object).is_some_and(|b| !b.is_empty())
}

/// Decode the JSON-encoded body so later layers can read it as an object
fn bronze_events(inputs: &[&Table]) -> Table {
    inputs
        .iter()
        .flat_map(|table| table.iter())
        .map(|row| {
            let mut row = row.clone();
            let decoded = match row.get("body") {
                Some(Value::String(raw)) => serde_json::from_str::<Value>(raw).ok(),
                Some(Value::Null) | None => None,
                Some(other) => Some(other.clone()),
            };
            row.insert("body".to_string(), decoded.unwrap_or(Value::Object(Map::new())));
            row
        })
        .collect()
}

fn item_count(body: &Value) -> i64 {
    body.get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| item.get("qty").and_then(Value::as_i64).unwrap_or(1))
                .sum()
        })
        .unwrap_or(0)
}

/// One row per order with its creation, delivery and basket size
fn order_lifecycle(inputs: &[&Table]) -> Table {
    let mut orders: BTreeMap<String, Row> = BTreeMap::new();
    for row in inputs.iter().flat_map(|table| table.iter()) {
        let Some(order_id) = str_field(row, "order_id") else {
            continue;
        };
        let entry = orders.entry(order_id.to_string()).or_insert_with(|| {
            let mut order = Row::new();
            order.insert("order_id".to_string(), json!(order_id));
            order.insert("location_id".to_string(), row.get("location_id").cloned().unwrap_or(Value::Null));
            order
        });
        match str_field(row, "event_type").and_then(EventType::from_name) {
            Some(EventType::OrderCreated) => {
                entry.insert("created_ts".to_string(), row.get("ts").cloned().unwrap_or(Value::Null));
                let count = row.get("body").map(item_count).unwrap_or(0);
                entry.insert("item_count".to_string(), json!(count));
            }
            Some(EventType::Delivered) => {
                entry.insert("delivered_ts".to_string(), row.get("ts").cloned().unwrap_or(Value::Null));
            }
            _ => {}
        }
    }
    orders.into_values().collect()
}

/// Orders per location per simulated day of creation
fn location_daily(inputs: &[&Table]) -> Table {
    let mut counts: BTreeMap<(i64, String), i64> = BTreeMap::new();
    for row in inputs.iter().flat_map(|table| table.iter()) {
        let (Some(location_id), Some(created)) = (row.get("location_id").and_then(Value::as_i64), str_field(row, "created_ts"))
        else {
            continue;
        };
        let day = created.get(..10).unwrap_or(created).to_string();
        *counts.entry((location_id, day)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter_map(|((location_id, day), orders)| match json!({"location_id": location_id, "day": day, "orders": orders}) {
            Value::Object(row) => Some(row),
            _ => None,
        })
        .collect()
}
