// src/lib.rs

//! Real-time room-based WebSocket message relay.
//!
//! Clients join a named room over a WebSocket, receive the room's recent
//! history once, then exchange messages fanned out to every member along
//! with a live roster of who is present. Everything lives in process
//! memory; when the last member leaves a room, the room and its history
//! are gone.

pub mod broadcast;
pub mod identity;
pub mod models;
pub mod session;
pub mod state;
pub mod websocket;
