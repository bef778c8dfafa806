// src/identity.rs

use uuid::Uuid;

/// Room a connection lands in when its path names none.
pub const DEFAULT_ROOM: &str = "general";

const ANON_PREFIX: &str = "anon_";

/// Derives `(room, identity)` from the optional path segments. Never fails:
/// a missing or empty room falls back to [`DEFAULT_ROOM`], a missing or
/// empty identity gets a synthesized anonymous one. No charset or length
/// validation; any non-empty string passes through untouched.
pub fn resolve(room: Option<String>, identity: Option<String>) -> (String, String) {
    let room = match room {
        Some(room) if !room.is_empty() => room,
        _ => DEFAULT_ROOM.to_string(),
    };
    let identity = match identity {
        Some(identity) if !identity.is_empty() => identity,
        _ => anonymous_identity(),
    };
    (room, identity)
}

/// A fixed prefix plus a short random suffix. Collision avoidance is
/// best-effort; two anonymous visitors drawing the same suffix behave like
/// any other identity clash (the later join wins the seat).
pub fn anonymous_identity() -> String {
    let entropy = Uuid::new_v4().simple().to_string();
    format!("{ANON_PREFIX}{}", &entropy[..6])
}
