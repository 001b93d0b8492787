//! WebSocket handler for real-time event streaming
//!
//! This module provides a WebSocket endpoint at `/api/ws` that:
//! - Broadcasts monitor events to connected clients
//! - Supports topic-based event filtering
//! - Includes heartbeat (ping/pong) mechanism

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::events::MonitorEvent;
use crate::state::AppState;

/// Client-to-server message
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "payload")]
enum ClientMessage {
    /// Subscribe to event topics
    #[serde(rename = "subscribe")]
    Subscribe { topics: Vec<String> },

    /// Unsubscribe from event topics
    #[serde(rename = "unsubscribe")]
    Unsubscribe { topics: Vec<String> },

    /// Ping (keep-alive)
    #[serde(rename = "ping")]
    Ping,
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe to event bus
    let mut event_rx = state.events.subscribe();

    // Track subscribed topics (default: none until client subscribes)
    let mut subscribed_topics: Vec<String> = vec![];

    // Flag to send the status snapshot after first subscribe
    let mut snapshot_sent = false;

    info!("WebSocket client connected");

    // Heartbeat interval (30 seconds)
    let mut heartbeat_interval = tokio::time::interval(tokio::time::Duration::from_secs(30));

    loop {
        tokio::select! {
            // Receive message from client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = handle_client_message(&text, &mut subscribed_topics) {
                            warn!("Failed to handle client message: {}", e);
                        }

                        // Send current status after first subscribe
                        if !snapshot_sent && !subscribed_topics.is_empty() {
                            let snapshot = serde_json::json!({
                                "event": "monitor.snapshot",
                                "data": state.monitor.status(),
                            });
                            if sender.send(Message::Text(snapshot.to_string())).await.is_err() {
                                warn!("Failed to send status snapshot to client");
                                break;
                            }
                            snapshot_sent = true;
                        }
                    }
                    Some(Ok(Message::Ping(_))) => {
                        debug!("Received ping from client");
                    }
                    Some(Ok(Message::Pong(_))) => {
                        debug!("Received pong from client");
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket receive error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }

            // Receive event from event bus
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if should_send_event(&event, &subscribed_topics) {
                            if let Ok(json) = serde_json::to_string(&event) {
                                if sender.send(Message::Text(json)).await.is_err() {
                                    warn!("Failed to send event to client, disconnecting");
                                    break;
                                }
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("WebSocket client lagged by {} events", n);
                        let error_event = MonitorEvent::Error {
                            module: "ws".to_string(),
                            message: format!("Lagged by {} events", n),
                        };
                        if let Ok(json) = serde_json::to_string(&error_event) {
                            let _ = sender.send(Message::Text(json)).await;
                        }
                    }
                    Err(_) => {
                        warn!("Event bus closed");
                        break;
                    }
                }
            }

            // Heartbeat
            _ = heartbeat_interval.tick() => {
                if sender.send(Message::Ping(vec![])).await.is_err() {
                    info!("WebSocket client unreachable, disconnecting");
                    break;
                }
            }
        }
    }

    debug!("WebSocket handler terminated");
}

/// Apply a client message to the topic subscription set
fn handle_client_message(
    text: &str,
    subscribed_topics: &mut Vec<String>,
) -> Result<(), serde_json::Error> {
    match serde_json::from_str::<ClientMessage>(text)? {
        ClientMessage::Subscribe { topics } => {
            for topic in topics {
                if !subscribed_topics.contains(&topic) {
                    subscribed_topics.push(topic);
                }
            }
            debug!("Client subscribed, topics now: {:?}", subscribed_topics);
        }
        ClientMessage::Unsubscribe { topics } => {
            subscribed_topics.retain(|t| !topics.contains(t));
            debug!("Client unsubscribed, topics now: {:?}", subscribed_topics);
        }
        ClientMessage::Ping => {
            debug!("Client ping");
        }
    }
    Ok(())
}

/// Topic filter: a subscription matches the exact event name or a
/// dot-separated prefix of it ("gaze" matches "gaze.updated")
fn should_send_event(event: &MonitorEvent, subscribed_topics: &[String]) -> bool {
    let name = event.topic();
    subscribed_topics.iter().any(|topic| {
        name == topic || name.starts_with(&format!("{}.", topic))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaze::GazeDirection;

    #[test]
    fn test_should_send_event_exact_and_prefix() {
        let event = MonitorEvent::GazeUpdated {
            direction: GazeDirection::Forward,
            detected: true,
        };

        assert!(should_send_event(&event, &["gaze.updated".to_string()]));
        assert!(should_send_event(&event, &["gaze".to_string()]));
        assert!(!should_send_event(&event, &["monitor".to_string()]));
        assert!(!should_send_event(&event, &[]));
    }

    #[test]
    fn test_handle_client_message_subscribe_unsubscribe() {
        let mut topics = vec![];

        handle_client_message(
            r#"{"type":"subscribe","payload":{"topics":["gaze","alert"]}}"#,
            &mut topics,
        )
        .unwrap();
        assert_eq!(topics, vec!["gaze", "alert"]);

        handle_client_message(
            r#"{"type":"unsubscribe","payload":{"topics":["gaze"]}}"#,
            &mut topics,
        )
        .unwrap();
        assert_eq!(topics, vec!["alert"]);
    }

    #[test]
    fn test_handle_client_message_rejects_garbage() {
        let mut topics = vec![];
        assert!(handle_client_message("not json", &mut topics).is_err());
        assert!(topics.is_empty());
    }
}
