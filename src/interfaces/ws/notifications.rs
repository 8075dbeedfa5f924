//! `/ws/spaces` websocket stream
//!
//! Pushes spot, reservation and occupancy events to connected clients.
//! Clients may narrow the stream with `?spot_id=3&event_types=spot_added,spaces_updated`.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::select;
use tracing::{debug, error, info, warn};

use crate::notifications::{EventMessage, SharedEventBus};

#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    /// Only events about this spot
    pub spot_id: Option<i32>,
    /// Comma-separated event type names
    pub event_types: Option<String>,
}

impl EventFilter {
    pub fn matches(&self, message: &EventMessage) -> bool {
        if let Some(wanted) = self.spot_id {
            if message.event.spot_id() != Some(wanted) {
                return false;
            }
        }

        match &self.event_types {
            Some(types) => types
                .split(',')
                .map(str::trim)
                .any(|t| t == message.event.event_type()),
            None => true,
        }
    }
}

#[derive(Clone)]
pub struct NotificationState {
    pub event_bus: SharedEventBus,
}

pub async fn ws_spaces_handler(
    ws: WebSocketUpgrade,
    State(state): State<NotificationState>,
    Query(filter): Query<EventFilter>,
) -> impl IntoResponse {
    info!(
        "Websocket client connecting: spot_id={:?}, event_types={:?}",
        filter.spot_id, filter.event_types
    );
    ws.on_upgrade(move |socket| stream_events(socket, state, filter))
}

async fn stream_events(socket: WebSocket, state: NotificationState, filter: EventFilter) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscriber = state.event_bus.subscribe();

    let welcome = serde_json::json!({
        "type": "connected",
        "filter": {
            "spot_id": filter.spot_id,
            "event_types": filter.event_types,
        }
    });
    if let Err(e) = sender.send(Message::Text(welcome.to_string().into())).await {
        error!("Failed to greet websocket client: {}", e);
        return;
    }

    loop {
        select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Ping(data))) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Websocket receive error: {}", e);
                    break;
                }
            },

            event = subscriber.recv() => {
                let Some(message) = event else {
                    warn!("Event bus closed");
                    break;
                };
                if !filter.matches(&message) {
                    continue;
                }
                match serde_json::to_string(&message) {
                    Ok(json) => {
                        if let Err(e) = sender.send(Message::Text(json.into())).await {
                            debug!("Websocket send failed, dropping client: {}", e);
                            break;
                        }
                    }
                    Err(e) => error!("Failed to serialize event: {}", e),
                }
            }
        }
    }

    info!("Websocket client disconnected");
}
