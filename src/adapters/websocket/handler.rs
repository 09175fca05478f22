//! Websocket upgrade handler for the auction live feed.
//!
//! Connection lifecycle:
//! 1. Validate the auction id and viewer id, load the current state
//! 2. Upgrade, join the auction room and the presence count
//! 3. Forward room broadcasts; answer ping (heartbeat) and request_state
//! 4. On close, leave the room and the presence count

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};

use crate::application::AuctionEngine;
use crate::domain::auction::AuctionError;
use crate::domain::foundation::{AuctionId, EventMessage, Timestamp, ViewerId};
use crate::ports::Channel;

use super::messages::{ClientMessage, ConnectedMessage, ErrorMessage, PongMessage, ServerMessage};
use super::rooms::{ClientId, RoomManager};

/// Replies queued by the receive side for the send side.
const DIRECT_CAPACITY: usize = 16;

#[derive(Clone)]
pub struct LiveFeedState {
    pub engine: Arc<AuctionEngine>,
    pub rooms: Arc<RoomManager>,
}

impl LiveFeedState {
    pub fn new(engine: Arc<AuctionEngine>, rooms: Arc<RoomManager>) -> Self {
        Self { engine, rooms }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LiveFeedParams {
    /// Stable id for a reconnecting viewer; generated when absent.
    pub viewer: Option<String>,
}

/// `GET /auctions/:auction_id/live?viewer=…`
pub async fn live_feed_handler(
    ws: WebSocketUpgrade,
    Path(auction_id): Path<String>,
    Query(params): Query<LiveFeedParams>,
    State(state): State<LiveFeedState>,
) -> Response {
    let (auction_id, viewer_id) = match parse_request(&auction_id, params.viewer) {
        Ok(ids) => ids,
        Err(rejection) => return rejection.into_response(),
    };

    let initial = match state.engine.auction_state(auction_id).await {
        Ok(initial) => initial,
        Err(AuctionError::AuctionNotFound(_)) => {
            return (StatusCode::NOT_FOUND, "Auction not found").into_response();
        }
        Err(e) => {
            tracing::warn!(auction_id = %auction_id, error = %e, "Live feed state load failed");
            return (StatusCode::SERVICE_UNAVAILABLE, "Auction state unavailable").into_response();
        }
    };

    ws.on_upgrade(move |socket| {
        handle_socket(socket, auction_id, viewer_id, ServerMessage::State(Box::new(initial)), state)
    })
}

fn parse_request(
    auction_id: &str,
    viewer: Option<String>,
) -> Result<(AuctionId, ViewerId), (StatusCode, &'static str)> {
    let auction_id = auction_id
        .parse::<AuctionId>()
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid auction ID"))?;
    let viewer_id = match viewer {
        Some(raw) => ViewerId::new(raw).map_err(|_| (StatusCode::BAD_REQUEST, "Invalid viewer ID"))?,
        None => ViewerId::generate(),
    };
    Ok((auction_id, viewer_id))
}

async fn handle_socket(
    socket: WebSocket,
    auction_id: AuctionId,
    viewer_id: ViewerId,
    initial: ServerMessage,
    state: LiveFeedState,
) {
    let (mut sender, mut receiver) = socket.split();
    let client_id = ClientId::new();
    let room_rx = state
        .rooms
        .join(&Channel::Auction(auction_id), client_id.clone())
        .await;

    let viewer_count = state
        .engine
        .join_viewer(auction_id, viewer_id.clone())
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(auction_id = %auction_id, error = %e, "Presence join failed");
            0
        });

    let connected = ServerMessage::Connected(ConnectedMessage {
        auction_id: auction_id.to_string(),
        client_id: client_id.to_string(),
        viewer_id: viewer_id.to_string(),
        viewer_count,
        timestamp: Timestamp::now(),
    });
    let greeted = match send_message(&mut sender, &connected).await {
        Ok(()) => send_message(&mut sender, &initial).await.is_ok(),
        Err(_) => false,
    };

    if greeted {
        let (direct_tx, direct_rx) = mpsc::channel(DIRECT_CAPACITY);

        let mut send_task = tokio::spawn(forward(
            sender,
            room_rx,
            direct_rx,
            state.engine.clone(),
            auction_id,
        ));

        let engine = state.engine.clone();
        let viewer = viewer_id.clone();
        let mut recv_task = tokio::spawn(async move {
            while let Some(result) = receiver.next().await {
                match result {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => {
                            let reply = respond(&engine, auction_id, &viewer, message).await;
                            if direct_tx.send(reply).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::debug!(auction_id = %auction_id, error = %e, "Unrecognised client message");
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!(auction_id = %auction_id, error = %e, "Receive error");
                        break;
                    }
                }
            }
        });

        tokio::select! {
            _ = &mut send_task => recv_task.abort(),
            _ = &mut recv_task => send_task.abort(),
        }
        let _ = send_task.await;
        let _ = recv_task.await;
    } else {
        drop(room_rx);
    }

    // Cleanup: the room receiver is gone with the send task.
    state.rooms.leave(&client_id).await;
    if let Err(e) = state.engine.leave_viewer(auction_id, viewer_id).await {
        tracing::warn!(auction_id = %auction_id, error = %e, "Presence leave failed");
    }
    tracing::debug!(auction_id = %auction_id, client_id = %client_id, "Live feed closed");
}

/// Send side: room broadcasts and direct replies, until either the client
/// or the room goes away.
async fn forward(
    mut sender: SplitSink<WebSocket, Message>,
    mut room_rx: broadcast::Receiver<EventMessage>,
    mut direct_rx: mpsc::Receiver<ServerMessage>,
    engine: Arc<AuctionEngine>,
    auction_id: AuctionId,
) {
    loop {
        let outgoing = tokio::select! {
            received = room_rx.recv() => match received {
                Ok(event) => ServerMessage::Event(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::debug!(auction_id = %auction_id, missed, "Live feed lagged; resending state");
                    state_message(&engine, auction_id).await
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            direct = direct_rx.recv() => match direct {
                Some(reply) => reply,
                None => break,
            },
        };
        if let Err(e) = send_message(&mut sender, &outgoing).await {
            tracing::debug!(auction_id = %auction_id, error = %e, "Send error, closing connection");
            break;
        }
    }
}

async fn respond(
    engine: &AuctionEngine,
    auction_id: AuctionId,
    viewer_id: &ViewerId,
    message: ClientMessage,
) -> ServerMessage {
    match message {
        ClientMessage::Ping => match engine.heartbeat_viewer(auction_id, viewer_id.clone()).await {
            Ok(viewer_count) => ServerMessage::Pong(PongMessage {
                viewer_count,
                timestamp: Timestamp::now(),
            }),
            Err(e) => ServerMessage::Error(ErrorMessage::from(&e)),
        },
        ClientMessage::RequestState => state_message(engine, auction_id).await,
    }
}

async fn state_message(engine: &AuctionEngine, auction_id: AuctionId) -> ServerMessage {
    match engine.auction_state(auction_id).await {
        Ok(state) => ServerMessage::State(Box::new(state)),
        Err(e) => ServerMessage::Error(ErrorMessage::from(&e)),
    }
}

async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

/// Router for the live feed endpoint.
///
/// ```ignore
/// let app = live_feed_router().with_state(LiveFeedState::new(engine, rooms));
/// ```
pub fn live_feed_router() -> axum::Router<LiveFeedState> {
    use axum::routing::get;

    axum::Router::new().route("/auctions/:auction_id/live", get(live_feed_handler))
}
