// src/broadcast.rs

use tracing::{debug, warn};

use crate::models::{ChatMessage, ServerMessage};
use crate::state::{ClientSender, Room};

/// Sends the one-time history snapshot to a connection that just joined.
/// Nobody else hears this.
pub fn send_history(outbound: &ClientSender, history: &[ChatMessage]) {
    let envelope = ServerMessage::History {
        messages: history.to_vec(),
    };
    let Some(frame) = encode(&envelope) else { return };
    if outbound.send(frame).is_err() {
        debug!("history snapshot dropped, connection closed before delivery");
    }
}

/// Fans the current roster out to every live member of the room. Returns
/// how many members the frame was enqueued for.
pub fn send_roster(room: &Room) -> usize {
    let envelope = ServerMessage::ActiveUsers { users: room.users() };
    match encode(&envelope) {
        Some(frame) => fan_out(room, &frame),
        None => 0,
    }
}

/// Fans a message envelope out to every live member, the sender included;
/// the broadcast copy is the canonical one, clients never locally echo.
pub fn send_message(room: &Room, message: &ChatMessage) -> usize {
    let envelope = ServerMessage::Message(message.clone());
    match encode(&envelope) {
        Some(frame) => fan_out(room, &frame),
        None => 0,
    }
}

/// Serializes an envelope once; fan-out reuses the same text for everyone.
fn encode(envelope: &ServerMessage) -> Option<String> {
    match serde_json::to_string(envelope) {
        Ok(frame) => Some(frame),
        Err(e) => {
            warn!("failed to encode an outbound frame: {e}");
            None
        }
    }
}

/// Best-effort delivery: a member whose connection is no longer writable is
/// skipped, not queued, not retried.
fn fan_out(room: &Room, frame: &str) -> usize {
    let mut delivered = 0;
    for (identity, member) in &room.members {
        if member.send(frame.to_string()) {
            delivered += 1;
        } else {
            debug!("skipping '{identity}', connection no longer writable");
        }
    }
    delivered
}
