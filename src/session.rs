// src/session.rs

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::identity;
use crate::models::{self, ChatMessage, ClientPayload};
use crate::state::{ClientSender, LeaveOutcome, RoomRegistry};

/// Why the transport handed the connection back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer closed cleanly, or the stream simply ended.
    ClientClosed,
    /// The transport reported an error. Behaviorally identical to a clean
    /// close; only the logging differs.
    TransportError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Connecting,
    Joined,
    Closed,
}

/// One connection's walk through the relay protocol: who and where are
/// resolved at construction, then the session moves Connecting → Joined →
/// Closed and never back. Inbound frames only mean something while Joined.
pub struct Session {
    registry: Arc<RoomRegistry>,
    room: String,
    identity: String,
    conn: Uuid,
    outbound: ClientSender,
    state: SessionState,
}

impl Session {
    /// A fresh session for a connection that just finished its handshake.
    pub fn connect(
        registry: Arc<RoomRegistry>,
        room: Option<String>,
        identity: Option<String>,
        outbound: ClientSender,
    ) -> Self {
        let (room, identity) = identity::resolve(room, identity);
        Self {
            registry,
            room,
            identity,
            conn: Uuid::new_v4(),
            outbound,
            state: SessionState::Connecting,
        }
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Connecting → Joined: registers with the room, which replays history
    /// to this connection and announces the new roster to everyone.
    pub async fn join(&mut self) {
        if self.state != SessionState::Connecting {
            warn!("'{}' attempted to join '{}' twice", self.identity, self.room);
            return;
        }
        let snapshot = self
            .registry
            .join(&self.room, &self.identity, self.conn, self.outbound.clone())
            .await;
        self.state = SessionState::Joined;
        info!(
            "'{}' joined '{}' ({} online, {} history entries)",
            self.identity,
            self.room,
            snapshot.users.len(),
            snapshot.history.len()
        );
    }

    /// Joined self-loop: one inbound text frame. Anything that is not a
    /// well-formed post with non-empty content is dropped without a reply.
    pub async fn handle_text(&mut self, text: &str) {
        if self.state != SessionState::Joined {
            return;
        }
        match models::parse_client_payload(text) {
            ClientPayload::Post { id, username, content } => {
                let message = ChatMessage {
                    id: id.unwrap_or_else(models::generate_id),
                    // a client may post under any name it likes; the roster
                    // still shows the join-time identity
                    username: username.unwrap_or_else(|| self.identity.clone()),
                    content,
                    time: models::timestamp_now(),
                    room: self.room.clone(),
                };
                let delivered = self.registry.append(&self.room, message).await;
                debug!(
                    "relayed a message from '{}' to {} member(s) of '{}'",
                    self.identity, delivered, self.room
                );
            }
            ClientPayload::Ignored => {
                debug!("ignoring a payload without content from '{}'", self.identity);
            }
            ClientPayload::Malformed => {
                debug!("ignoring a malformed payload from '{}'", self.identity);
            }
        }
    }

    /// Joined → Closed: deregisters and lets the room announce the change
    /// to whoever remains. Terminal; calling it again does nothing.
    pub async fn close(&mut self, reason: CloseReason) {
        if self.state != SessionState::Joined {
            self.state = SessionState::Closed;
            return;
        }
        self.state = SessionState::Closed;
        match reason {
            CloseReason::ClientClosed => info!("'{}' left '{}'", self.identity, self.room),
            CloseReason::TransportError => error!(
                "'{}' dropped from '{}' after a transport error",
                self.identity, self.room
            ),
        }
        let outcome = self
            .registry
            .leave(&self.room, &self.identity, self.conn)
            .await;
        if outcome == LeaveOutcome::Superseded {
            debug!(
                "'{}' had already been replaced in '{}'",
                self.identity, self.room
            );
        }
    }
}
