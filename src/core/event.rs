use super::types::{LocationId, OrderId};
use serde::{Deserialize, Serialize};

/// Fixed enumeration of order lifecycle event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventType {
    OrderCreated = 1,
    KitchenStarted = 2,
    KitchenFinished = 3,
    KitchenReady = 4,
    DriverArrived = 5,
    DriverPickedUp = 6,
    DriverPing = 7,
    Delivered = 8,
}

impl EventType {
    pub const ALL: [EventType; 8] = [
        EventType::OrderCreated,
        EventType::KitchenStarted,
        EventType::KitchenFinished,
        EventType::KitchenReady,
        EventType::DriverArrived,
        EventType::DriverPickedUp,
        EventType::DriverPing,
        EventType::Delivered,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get((id as usize).checked_sub(1)?).copied()
    }

    /// Name used in the expanded downstream payload
    pub fn name(self) -> &'static str {
        match self {
            EventType::OrderCreated => "order_created",
            EventType::KitchenStarted => "gk_started",
            EventType::KitchenFinished => "gk_finished",
            EventType::KitchenReady => "gk_ready",
            EventType::DriverArrived => "driver_arrived",
            EventType::DriverPickedUp => "driver_picked_up",
            EventType::DriverPing => "driver_ping",
            EventType::Delivered => "delivered",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Compact persisted event record.
///
/// Only the payload columns relevant to `event_type` are populated; the rest
/// stay `None` and are written as nulls.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderEvent {
    pub order_id: OrderId,
    pub location_id: LocationId,
    pub event_type_id: u8,
    pub ts_seconds: i64,
    pub sequence: u16,
    pub customer_lat: Option<f32>,
    pub customer_lon: Option<f32>,
    pub customer_addr: Option<String>,
    pub items_json: Option<String>,
    pub route_json: Option<String>,
    pub ping_lat: Option<f32>,
    pub ping_lon: Option<f32>,
    pub ping_progress: Option<f32>,
}

impl OrderEvent {
    pub fn new(order_id: OrderId, location_id: LocationId, event_type: EventType, ts_seconds: i64) -> Self {
        Self {
            order_id,
            location_id,
            event_type_id: event_type.id(),
            ts_seconds,
            ..Default::default()
        }
    }

    pub fn event_type(&self) -> Option<EventType> {
        EventType::from_id(self.event_type_id)
    }

    /// Ordering key used for every merge: time first, then per-order sequence
    pub fn sort_key(&self) -> (i64, u16) {
        (self.ts_seconds, self.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_ids_are_one_based_and_contiguous() {
        for (idx, t) in EventType::ALL.iter().enumerate() {
            assert_eq!(t.id() as usize, idx + 1);
            assert_eq!(EventType::from_id(t.id()), Some(*t));
            assert_eq!(EventType::from_name(t.name()), Some(*t));
        }
        assert_eq!(EventType::from_id(0), None);
        assert_eq!(EventType::from_id(9), None);
    }

    #[test]
    fn test_new_event_has_null_payload() {
        let event = OrderEvent::new("ABC123".to_string(), 2, EventType::KitchenReady, 100);
        assert_eq!(event.event_type(), Some(EventType::KitchenReady));
        assert!(event.customer_lat.is_none());
        assert!(event.route_json.is_none());
        assert!(event.ping_progress.is_none());
    }
}
