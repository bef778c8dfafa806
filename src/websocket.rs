// src/websocket.rs

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::warn;

use crate::session::{CloseReason, Session};
use crate::state::RoomRegistry;

/// Builds the relay's router. Three addressing styles, one socket handler:
/// the room and identity segments are both optional.
pub fn router(registry: Arc<RoomRegistry>) -> Router {
    Router::new()
        .route("/ws", get(ws_default))
        .route("/ws/{room}", get(ws_room))
        .route("/ws/{room}/{identity}", get(ws_room_identity))
        .with_state(registry)
}

async fn ws_default(
    ws: WebSocketUpgrade,
    State(registry): State<Arc<RoomRegistry>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, registry, None, None))
}

async fn ws_room(
    ws: WebSocketUpgrade,
    Path(room): Path<String>,
    State(registry): State<Arc<RoomRegistry>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, registry, Some(room), None))
}

async fn ws_room_identity(
    ws: WebSocketUpgrade,
    Path((room, identity)): Path<(String, String)>,
    State(registry): State<Arc<RoomRegistry>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, registry, Some(room), Some(identity)))
}

/// Drives one connection from upgrade to teardown. The socket is split: a
/// writer task drains the session's outbound queue into the sink while this
/// task reads inbound frames and feeds the session state machine.
async fn handle_socket(
    socket: WebSocket,
    registry: Arc<RoomRegistry>,
    room: Option<String>,
    identity: Option<String>,
) {
    let (sink, mut receiver) = socket.split();
    let (outbound, queue) = mpsc::unbounded_channel();
    let writer = tokio::spawn(forward_outbound(queue, sink));

    let mut session = Session::connect(registry, room, identity, outbound);
    session.join().await;

    let reason = loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => session.handle_text(&text).await,
            Some(Ok(Message::Close(_))) | None => break CloseReason::ClientClosed,
            // ping/pong is answered by the websocket layer; binary frames
            // carry nothing the relay understands
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!(
                    "websocket transport error for '{}' in '{}': {e}",
                    session.identity(),
                    session.room()
                );
                break CloseReason::TransportError;
            }
        }
    };

    session.close(reason).await;
    writer.abort();
}

/// Writer half of a connection: relays every queued frame onto the socket
/// until the queue closes or the peer stops accepting writes.
async fn forward_outbound(
    mut queue: UnboundedReceiver<String>,
    mut sink: SplitSink<WebSocket, Message>,
) {
    while let Some(frame) = queue.recv().await {
        if sink.send(Message::Text(frame.into())).await.is_err() {
            // peer unreachable; the read half will observe the close
            break;
        }
    }
}
