//! Wire model shared by the game client and its terminal driver.
//!
//! This crate owns the JSON shapes exchanged with the match backend: REST
//! payloads for game/invitation/matchmaking endpoints, the outbound websocket
//! commands, and the inbound websocket events. Inbound events arrive in more
//! than one historical shape; [`parse_event`] folds them into one closed
//! [`Event`] enum so downstream reconciliation never probes optional fields.

pub mod event;
pub mod rest;

use serde::Serialize;

pub use event::{Event, InvitationEvent, MoveEvent, event_from_value, parse_event};
pub use rest::{
    AcceptInvitationResponse, CreateGameRequest, CreateGameResponse, GameData, GenerateInvitationResponse,
    InvitationData, MatchRequestResponse,
};

/// Error returned while decoding wire payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The raw text was not valid JSON.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The JSON decoded but matches none of the known event shapes.
    #[error("unrecognized message shape: {0}")]
    Unrecognized(String),
    /// A known shape was detected but a required field is absent or mistyped.
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
}

/// Command sent by the client over a websocket channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Drop the viewer's token at `(row, column)`.
    PlayerMove { column: usize, row: usize },
    /// Take back the viewer's most recent move.
    UndoMove,
    /// Player-inbox keep-alive; refreshes the viewer's last activity.
    Ping,
}

impl ClientMessage {
    /// Serialize into the JSON text sent on the socket.
    #[must_use]
    pub fn to_json(&self) -> String {
        // Serializing a fieldless/integer-only enum cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
