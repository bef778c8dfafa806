// src/state.rs

use std::collections::{HashMap, VecDeque};

use tokio::sync::{mpsc, Mutex};
use tracing::debug;
use uuid::Uuid;

use crate::broadcast;
use crate::models::ChatMessage;

/// Handle for pushing serialized frames toward one connection's writer task.
pub type ClientSender = mpsc::UnboundedSender<String>;

/// Messages retained per room; the oldest entry falls off first.
pub const HISTORY_CAP: usize = 200;

/// A single live member of a room.
pub struct Member {
    conn: Uuid,
    outbound: ClientSender,
}

impl Member {
    pub fn new(conn: Uuid, outbound: ClientSender) -> Self {
        Self { conn, outbound }
    }

    /// Best-effort enqueue toward this member's connection. `false` means
    /// the writer task is gone and the member is unreachable.
    pub fn send(&self, frame: String) -> bool {
        self.outbound.send(frame).is_ok()
    }
}

/// A chat room: who is here, and what was said recently.
#[derive(Default)]
pub struct Room {
    pub members: HashMap<String, Member>,
    pub history: VecDeque<ChatMessage>,
}

impl Room {
    /// Current member identities, sorted so roster payloads are stable.
    pub fn users(&self) -> Vec<String> {
        let mut users: Vec<String> = self.members.keys().cloned().collect();
        users.sort();
        users
    }
}

/// The room as a join saw it land: history so far, membership including the
/// joiner.
pub struct JoinSnapshot {
    pub history: Vec<ChatMessage>,
    pub users: Vec<String>,
}

/// How a leave resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Removed; other members remain and were sent the new roster.
    Departed,
    /// Removed; the room emptied out and was discarded with its history.
    RoomRemoved,
    /// A newer connection took over this identity (or the room is already
    /// gone); membership unchanged, nothing broadcast.
    Superseded,
}

/// Process-wide room table. One lock serializes every membership and
/// history mutation, and fan-out enqueues happen inside the critical
/// section so all members observe appends in the same order. The enqueue
/// never touches the network, so the lock is never held across I/O; actual
/// socket writes happen in each connection's writer task.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Room>>,
}

impl RoomRegistry {
    /// Registers `identity` in `room`, creating the room on first join. An
    /// existing member under the same identity is replaced; the old
    /// connection is not told, it just stops receiving. The joiner gets the
    /// history snapshot, everyone gets the new roster.
    pub async fn join(
        &self,
        room: &str,
        identity: &str,
        conn: Uuid,
        outbound: ClientSender,
    ) -> JoinSnapshot {
        let mut rooms = self.rooms.lock().await;
        let entry = rooms.entry(room.to_string()).or_default();
        let replaced = entry
            .members
            .insert(identity.to_string(), Member::new(conn, outbound.clone()))
            .is_some();
        if replaced {
            debug!("'{identity}' rejoined '{room}', replacing the previous connection");
        }
        let snapshot = JoinSnapshot {
            history: entry.history.iter().cloned().collect(),
            users: entry.users(),
        };
        broadcast::send_history(&outbound, &snapshot.history);
        broadcast::send_roster(entry);
        snapshot
    }

    /// Appends to the room's history, evicting the oldest entry past
    /// [`HISTORY_CAP`], and fans the envelope out to every live member,
    /// sender included. Returns how many members the frame was enqueued
    /// for. A room that no longer exists swallows the message without
    /// being resurrected.
    pub async fn append(&self, room: &str, message: ChatMessage) -> usize {
        let mut rooms = self.rooms.lock().await;
        let Some(entry) = rooms.get_mut(room) else {
            debug!("dropping a message for unknown room '{room}'");
            return 0;
        };
        entry.history.push_back(message.clone());
        if entry.history.len() > HISTORY_CAP {
            entry.history.pop_front();
        }
        broadcast::send_message(entry, &message)
    }

    /// Removes `identity` from `room`, but only if the entry still belongs
    /// to `conn`: a close arriving after a same-identity rejoin must not
    /// take the newer connection's seat. The last member out takes the
    /// room and its history with them.
    pub async fn leave(&self, room: &str, identity: &str, conn: Uuid) -> LeaveOutcome {
        let mut rooms = self.rooms.lock().await;
        let Some(entry) = rooms.get_mut(room) else {
            return LeaveOutcome::Superseded;
        };
        if !entry.members.get(identity).is_some_and(|m| m.conn == conn) {
            return LeaveOutcome::Superseded;
        }
        entry.members.remove(identity);
        if entry.members.is_empty() {
            rooms.remove(room);
            debug!("room '{room}' is empty, removing it");
            return LeaveOutcome::RoomRemoved;
        }
        broadcast::send_roster(entry);
        LeaveOutcome::Departed
    }

    /// Current member identities of `room`, sorted; empty if the room does
    /// not exist (an unknown room and an empty one are indistinguishable by
    /// design).
    pub async fn roster(&self, room: &str) -> Vec<String> {
        let rooms = self.rooms.lock().await;
        rooms.get(room).map(Room::users).unwrap_or_default()
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }
}
