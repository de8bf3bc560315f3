//! Realtime Connect Four client core.
//!
//! SYSTEM CONTEXT
//! ==============
//! Talks to a match backend over REST (`net::api`) and per-path websockets
//! (`net::channel`), keeps one authoritative view of a game (`state::game`),
//! and drives the game, waiting, and share-link screens (`pages`).

pub mod config;
pub mod game;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;
