//! Notification events
//!
//! Defines all event types that can be broadcasted to WebSocket clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::occupancy::SnapshotEntry;

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    /// Parking spot created
    SpotAdded(SpotAddedEvent),
    /// Parking spot deleted
    SpotRemoved(SpotRemovedEvent),
    /// Reservation recorded
    ReservationCreated(ReservationCreatedEvent),
    /// Occupancy snapshot applied
    SpacesUpdated(SpacesUpdatedEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::SpotAdded(_) => "spot_added",
            Event::SpotRemoved(_) => "spot_removed",
            Event::ReservationCreated(_) => "reservation_created",
            Event::SpacesUpdated(_) => "spaces_updated",
        }
    }

    /// Get the spot ID if the event concerns a single spot
    pub fn spot_id(&self) -> Option<i32> {
        match self {
            Event::SpotAdded(e) => Some(e.spot_id),
            Event::SpotRemoved(e) => Some(e.spot_id),
            Event::ReservationCreated(e) => Some(e.spot_id),
            Event::SpacesUpdated(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotAddedEvent {
    pub spot_id: i32,
    pub location: [f64; 2],
    pub is_reserved: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotRemovedEvent {
    pub spot_id: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCreatedEvent {
    pub reservation_id: i32,
    pub spot_id: i32,
    pub time: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

/// Snapshot as observed by the detector, plus which entries failed to apply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpacesUpdatedEvent {
    pub spaces: Vec<SnapshotEntry>,
    pub failed: Vec<i64>,
    pub timestamp: DateTime<Utc>,
}

/// Wrapper for sending events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::occupancy::OccupancyStatus;

    #[test]
    fn message_is_tagged_and_flattened() {
        let msg = EventMessage::new(Event::SpacesUpdated(SpacesUpdatedEvent {
            spaces: vec![SnapshotEntry {
                id: 0,
                status: OccupancyStatus::Occupied,
            }],
            failed: vec![],
            timestamp: Utc::now(),
        }));

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "spaces_updated");
        assert_eq!(json["data"]["spaces"][0]["status"], "occupied");
        assert!(json["id"].is_string());
    }

    #[test]
    fn spot_id_only_for_single_spot_events() {
        let removed = Event::SpotRemoved(SpotRemovedEvent {
            spot_id: 3,
            timestamp: Utc::now(),
        });
        assert_eq!(removed.spot_id(), Some(3));
        assert_eq!(removed.event_type(), "spot_removed");
    }
}
