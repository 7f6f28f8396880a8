// ABOUTME: Room-based broadcast hub for real-time subscriptions
// ABOUTME: Pure pub/sub fan-out keyed by room name, no payload semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Real-time rooms
//!
//! A room is a named subscription channel: per farm, per weather cell, per
//! marketplace region, per user notification stream. The hub fans events
//! out to every subscriber of a room; what flows through a room is owned by
//! the publishers, not by this module.

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;

const ROOM_CAPACITY: usize = 64;

/// An event published into a room
#[derive(Debug, Clone, Serialize)]
pub struct RoomEvent {
    /// Room the event belongs to
    pub room: String,
    /// Opaque payload
    pub payload: JsonValue,
}

/// Broadcast hub holding one channel per active room
#[derive(Default)]
pub struct RoomHub {
    rooms: DashMap<String, broadcast::Sender<RoomEvent>>,
}

impl RoomHub {
    /// Empty hub
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to a room, creating its channel on first use
    #[must_use]
    pub fn subscribe(&self, room: &str) -> broadcast::Receiver<RoomEvent> {
        self.rooms
            .entry(room.to_owned())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Publishes an event to a room, returning the receiver count
    ///
    /// Publishing into a room nobody joined is a no-op.
    pub fn publish(&self, room: &str, payload: JsonValue) -> usize {
        self.rooms
            .get(room)
            .and_then(|sender| {
                sender
                    .send(RoomEvent {
                        room: room.to_owned(),
                        payload,
                    })
                    .ok()
            })
            .unwrap_or(0)
    }
}

/// Room key for a farm's event stream
#[must_use]
pub fn farm_room(farm_id: &str) -> String {
    format!("farm-{farm_id}")
}

/// Room key for a weather cell
#[must_use]
pub fn weather_room(lat: f64, lng: f64) -> String {
    format!("weather-{lat}-{lng}")
}

/// Room key for a marketplace region
#[must_use]
pub fn marketplace_room(region: &str) -> String {
    format!("marketplace-{region}")
}

/// Room key for a user's notification stream
#[must_use]
pub fn notifications_room(user_id: &str) -> String {
    format!("notifications-{user_id}")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn events_fan_out_to_all_room_subscribers() {
        let hub = RoomHub::new();
        let mut first = hub.subscribe(&farm_room("f1"));
        let mut second = hub.subscribe(&farm_room("f1"));
        let mut other = hub.subscribe(&farm_room("f2"));

        let delivered = hub.publish(&farm_room("f1"), json!({ "kind": "ping" }));
        assert_eq!(delivered, 2);

        assert_eq!(first.recv().await.unwrap().room, "farm-f1");
        assert_eq!(second.recv().await.unwrap().room, "farm-f1");
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn publishing_to_an_empty_room_is_a_noop() {
        let hub = RoomHub::new();
        assert_eq!(hub.publish("farm-ghost", json!({})), 0);
    }
}
