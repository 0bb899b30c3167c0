// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live event streaming for dispatcher and rescuer clients.
//!
//! Events are broadcast after the write that produced them has committed.
//! They are notifications only: clients re-read the affected record over
//! HTTP for authoritative data, and nothing sent by a client over the
//! socket is executed.

use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use rescue_dispatch_domain::{AssignmentStatus, IncidentStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Maximum number of events buffered per subscriber.
/// Slow clients lose the oldest events.
const EVENT_BUFFER_SIZE: usize = 256;

/// A committed change clients may want to react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// An incident was created, merged into, or changed status.
    IncidentUpdated {
        incident_id: i64,
        status: IncidentStatus,
        last_updated: i64,
    },
    /// An incident and its satellite records were removed.
    IncidentDeleted { incident_id: i64 },
    /// A new offer is open for every rescuer.
    AssignmentOffered {
        assignment_id: i64,
        incident_id: i64,
    },
    /// A rescuer won an offer.
    AssignmentClaimed {
        assignment_id: i64,
        incident_id: i64,
        rescuer_id: i64,
    },
    /// An offer was rejected, withdrawn, or completed.
    AssignmentResolved {
        assignment_id: i64,
        incident_id: i64,
        status: AssignmentStatus,
    },
    /// An incident's transcript changed.
    TranscriptUpdated {
        incident_id: i64,
        chunk_count: usize,
        revision: i64,
    },
    /// The active pointer for a scope was patched.
    ActivePointerChanged {
        scope: String,
        active_dispatcher_id: Option<i64>,
        active_incident_id: Option<i64>,
    },
    /// All data was cleared.
    DataCleared,
    /// Connection confirmation (sent on initial connect).
    Connected {
        /// Server time, epoch milliseconds.
        now: i64,
    },
}

/// Fan-out of live events to every connected client.
#[derive(Clone)]
pub struct LiveEventBroadcaster {
    tx: broadcast::Sender<LiveEvent>,
}

impl LiveEventBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    /// Broadcasts an event to all connected clients.
    ///
    /// Never blocks. With no clients connected the event is dropped.
    pub fn broadcast(&self, event: LiveEvent) {
        match self.tx.send(event) {
            Ok(receivers) => debug!(receivers, "Broadcast live event"),
            Err(broadcast::error::SendError(event)) => {
                debug!(?event, "No receivers for live event");
            }
        }
    }

    /// Returns a receiver for events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }
}

impl Default for LiveEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Upgrades the connection and streams live events to it.
pub async fn live_events_handler(
    ws: WebSocketUpgrade,
    AxumState(broadcaster): AxumState<Arc<LiveEventBroadcaster>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

async fn handle_socket(socket: WebSocket, broadcaster: Arc<LiveEventBroadcaster>) {
    info!("Client connected to live event stream");

    let (mut sender, mut receiver) = socket.split();
    let mut rx: broadcast::Receiver<LiveEvent> = broadcaster.subscribe();

    let connected: LiveEvent = LiveEvent::Connected {
        now: rescue_dispatch_api::current_time_millis(),
    };
    if let Ok(json) = serde_json::to_string(&connected) {
        if sender.send(Message::Text(json.into())).await.is_err() {
            warn!("Failed to send connection confirmation");
            return;
        }
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => error!(?e, "Failed to serialize live event"),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live event subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Received unexpected message from client, ignoring");
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!("Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("Receive task completed");
            send_task.abort();
        }
    }

    info!("Client disconnected from live event stream");
}
