// src/models.rs

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One chat message, as it lives in room history and on the wire.
#[derive(Serialize, Clone, Debug)]
pub struct ChatMessage {
    pub id: String,
    pub username: String,
    pub content: String,
    pub time: String,
    pub room: String,
}

/// Envelopes going FROM the server TO the clients.
#[derive(Serialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    History { messages: Vec<ChatMessage> },
    ActiveUsers { users: Vec<String> },
    Message(ChatMessage),
}

/// Raw shape of a payload coming FROM a client. Everything is optional at
/// this layer; unknown fields (a client-side `time`, for instance) are
/// dropped on the floor.
#[derive(Deserialize, Debug)]
struct RawPayload {
    id: Option<String>,
    username: Option<String>,
    content: Option<String>,
}

/// What one inbound text frame amounted to.
#[derive(Debug, PartialEq)]
pub enum ClientPayload {
    /// A well-formed post with non-empty content.
    Post {
        id: Option<String>,
        username: Option<String>,
        content: String,
    },
    /// Structurally fine, but nothing to relay (content absent or empty).
    Ignored,
    /// Not JSON the relay understands.
    Malformed,
}

/// Classifies an inbound frame. Never errors; the relay answers bad input
/// with silence.
pub fn parse_client_payload(text: &str) -> ClientPayload {
    match serde_json::from_str::<RawPayload>(text) {
        Ok(raw) => match raw.content {
            Some(content) if !content.is_empty() => ClientPayload::Post {
                id: raw.id,
                username: raw.username,
                content,
            },
            _ => ClientPayload::Ignored,
        },
        Err(_) => ClientPayload::Malformed,
    }
}

/// Server-assigned message id. Time-ordered, so ids within a room roughly
/// sort by arrival.
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// Wall-clock timestamp in the ISO-8601 shape the clients expect,
/// millisecond precision, `Z` suffix.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
