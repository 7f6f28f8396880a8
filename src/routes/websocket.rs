// ABOUTME: WebSocket route for room-based event subscriptions
// ABOUTME: Join/ack protocol over farm, weather, marketplace, and notification rooms
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! WebSocket routes
//!
//! Clients subscribe to named rooms and receive whatever the hub fans out
//! for those rooms. Messages carry the room key only; broadcast content is
//! owned by publishers.
//!
//! Messages (client to server):
//! - `join-farm` `{ "farmId": ... }`
//! - `subscribe-weather` `{ "location": { "lat": ..., "lng": ... } }`
//! - `subscribe-marketplace` `{ "region": ... }`
//! - `subscribe-notifications` `{ "userId": ... }`
//! - `ping`
//!
//! Messages (server to client):
//! - `subscribed` `{ "room": ... }`
//! - `event` `{ "room": ..., "payload": ... }`
//! - `pong`
//! - `error` `{ "message": ... }`

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::context::ServerResources;
use crate::realtime::{farm_room, marketplace_room, notifications_room, weather_room};

/// Message sent by a client
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum ClientMessage {
    /// Join a farm's event room
    #[serde(rename_all = "camelCase")]
    JoinFarm {
        farm_id: String,
    },
    /// Subscribe to a weather cell
    SubscribeWeather {
        location: WeatherCell,
    },
    /// Subscribe to a marketplace region
    SubscribeMarketplace {
        region: String,
    },
    /// Subscribe to a user's notification stream
    #[serde(rename_all = "camelCase")]
    SubscribeNotifications {
        user_id: String,
    },
    Ping,
}

/// Weather cell coordinates
#[derive(Debug, Deserialize)]
struct WeatherCell {
    lat: f64,
    lng: f64,
}

/// Message sent to a client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum ServerMessage {
    Subscribed { room: String },
    Event { room: String, payload: JsonValue },
    Pong,
    Error { message: String },
}

/// WebSocket routes
pub struct WebSocketRoutes;

impl WebSocketRoutes {
    /// Creates the WebSocket router
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/ws", get(Self::handle_upgrade))
            .with_state(resources)
    }

    async fn handle_upgrade(
        State(resources): State<Arc<ServerResources>>,
        ws: WebSocketUpgrade,
    ) -> Response {
        ws.on_upgrade(move |socket| Self::handle_socket(socket, resources))
    }

    async fn handle_socket(socket: WebSocket, resources: Arc<ServerResources>) {
        info!("websocket client connected");
        let (mut sink, mut stream) = socket.split();

        // One writer drains this channel; per-room forwarders feed it.
        let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);
        let writer: JoinHandle<()> = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let Ok(text) = serde_json::to_string(&message) else {
                    continue;
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        });

        let mut forwarders: Vec<JoinHandle<()>> = Vec::new();

        while let Some(Ok(message)) = stream.next().await {
            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };

            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Ping) => {
                    let _ = tx.send(ServerMessage::Pong).await;
                }
                Ok(client_message) => {
                    let room = match client_message {
                        ClientMessage::JoinFarm { farm_id } => farm_room(&farm_id),
                        ClientMessage::SubscribeWeather { location } => {
                            weather_room(location.lat, location.lng)
                        }
                        ClientMessage::SubscribeMarketplace { region } => {
                            marketplace_room(&region)
                        }
                        ClientMessage::SubscribeNotifications { user_id } => {
                            notifications_room(&user_id)
                        }
                        ClientMessage::Ping => continue,
                    };

                    debug!(room, "websocket subscription");
                    let mut receiver = resources.rooms.subscribe(&room);
                    let forward_tx = tx.clone();
                    forwarders.push(tokio::spawn(async move {
                        while let Ok(event) = receiver.recv().await {
                            let message = ServerMessage::Event {
                                room: event.room,
                                payload: event.payload,
                            };
                            if forward_tx.send(message).await.is_err() {
                                break;
                            }
                        }
                    }));

                    let _ = tx.send(ServerMessage::Subscribed { room }).await;
                }
                Err(err) => {
                    let _ = tx
                        .send(ServerMessage::Error {
                            message: format!("unrecognized message: {err}"),
                        })
                        .await;
                }
            }
        }

        for forwarder in forwarders {
            forwarder.abort();
        }
        drop(tx);
        writer.abort();
        info!("websocket client disconnected");
    }
}
