use crate::core::errors::StreamError;
use crate::core::event::{EventType, OrderEvent};
use crate::core::types::{LocationId, OrderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Display format of `ExpandedEvent::ts`
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Type-specific payload of an expanded event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventBody {
    OrderCreated {
        customer_lat: f64,
        customer_lon: f64,
        customer_addr: String,
        items: Value,
    },
    PickedUp {
        route_points: Value,
    },
    Ping {
        progress_pct: f64,
        loc_lat: f64,
        loc_lon: f64,
    },
    Delivered {
        delivered_lat: f64,
        delivered_lon: f64,
    },
    Empty {},
}

/// Full event as handed to stream consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandedEvent {
    pub event_id: String,
    pub event_type: String,
    pub ts: String,
    pub location_id: LocationId,
    pub order_id: OrderId,
    pub sequence: u16,
    /// JSON-encoded `EventBody`
    pub body: String,
    #[serde(skip)]
    pub ts_seconds: i64,
}

impl ExpandedEvent {
    pub fn parsed_body(&self) -> Result<EventBody, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

pub fn format_ts(ts_seconds: i64) -> String {
    match DateTime::<Utc>::from_timestamp(ts_seconds, 0) {
        Some(ts) => ts.format(TS_FORMAT).to_string(),
        None => ts_seconds.to_string(),
    }
}

fn parse_payload(order_id: &str, raw: &str) -> Result<Value, StreamError> {
    serde_json::from_str(raw).map_err(|source| StreamError::Payload {
        order_id: order_id.to_string(),
        source,
    })
}

/// Body for a compact record; types without a payload, or records whose
/// payload columns are null, get an empty body
pub fn event_body(event: &OrderEvent) -> Result<EventBody, StreamError> {
    let event_type = event.event_type().ok_or_else(|| StreamError::UnknownEventType {
        order_id: event.order_id.clone(),
        event_type_id: event.event_type_id,
    })?;

    let body = match event_type {
        EventType::OrderCreated => match (event.customer_lat, event.customer_lon) {
            (Some(lat), Some(lon)) => EventBody::OrderCreated {
                customer_lat: f64::from(lat),
                customer_lon: f64::from(lon),
                customer_addr: event.customer_addr.clone().unwrap_or_default(),
                items: match &event.items_json {
                    Some(raw) => parse_payload(&event.order_id, raw)?,
                    None => Value::Array(Vec::new()),
                },
            },
            _ => EventBody::Empty {},
        },
        EventType::DriverPickedUp => match &event.route_json {
            Some(raw) => EventBody::PickedUp {
                route_points: parse_payload(&event.order_id, raw)?,
            },
            None => EventBody::Empty {},
        },
        EventType::DriverPing => match (event.ping_lat, event.ping_lon) {
            (Some(lat), Some(lon)) => EventBody::Ping {
                progress_pct: event.ping_progress.map(f64::from).unwrap_or_default(),
                loc_lat: f64::from(lat),
                loc_lon: f64::from(lon),
            },
            _ => EventBody::Empty {},
        },
        EventType::Delivered => match (event.customer_lat, event.customer_lon) {
            (Some(lat), Some(lon)) => EventBody::Delivered {
                delivered_lat: f64::from(lat),
                delivered_lon: f64::from(lon),
            },
            _ => EventBody::Empty {},
        },
        _ => EventBody::Empty {},
    };
    Ok(body)
}

/// Expand a compact record with a fresh event id and display timestamp
pub fn expand(event: &OrderEvent) -> Result<ExpandedEvent, StreamError> {
    let body = serde_json::to_string(&event_body(event)?).map_err(|source| StreamError::Payload {
        order_id: event.order_id.clone(),
        source,
    })?;
    let event_type = EventType::from_id(event.event_type_id).map(EventType::name).unwrap_or_default();

    Ok(ExpandedEvent {
        event_id: Uuid::new_v4().to_string(),
        event_type: event_type.to_string(),
        ts: format_ts(event.ts_seconds),
        location_id: event.location_id,
        order_id: event.order_id.clone(),
        sequence: event.sequence,
        body,
        ts_seconds: event.ts_seconds,
    })
}
