//! REST payloads exchanged with the match backend.
//!
//! Field names mirror the backend serializers verbatim so serde needs no
//! renames. Nullable columns are `Option`s; the client decides defaults.

use serde::{Deserialize, Serialize};

/// Response body of `GET /game/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameData {
    pub game_id: String,
    pub player_one_username: String,
    #[serde(default)]
    pub player_two_username: Option<String>,
    pub rows: usize,
    pub columns: usize,
    /// Row-major grid, top row first; 0 = empty, 1/2 = player token.
    pub board: Vec<Vec<u8>>,
    #[serde(default)]
    pub current_turn_username: Option<String>,
    /// RFC 3339 timestamp of the first move.
    #[serde(default)]
    pub start_time: Option<String>,
    /// RFC 3339 timestamp of the game's conclusion.
    #[serde(default)]
    pub end_time: Option<String>,
    pub status_name: String,
}

/// Body of `POST /game/create` (play against an AI opponent).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGameRequest {
    pub difficulty_level: u8,
    pub algorithm: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGameResponse {
    pub game_id: String,
}

/// Response of `POST /invitation/generate`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateInvitationResponse {
    pub invitation_id: String,
}

/// Response of `GET /invitation/share-invite/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationData {
    pub invitation_id: String,
    pub sender_username: String,
    #[serde(default)]
    pub receiver_username: Option<String>,
    pub status_name: String,
    /// Game created once the invitation is accepted.
    #[serde(default)]
    pub game: Option<String>,
    #[serde(default)]
    pub play_preference: Option<String>,
    #[serde(default)]
    pub rows: Option<usize>,
    #[serde(default)]
    pub columns: Option<usize>,
}

/// Response of `POST /invitation/{id}/accept`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptInvitationResponse {
    #[serde(default)]
    pub game: Option<String>,
}

/// Response of `POST /match/request`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRequestResponse {
    pub status: String,
    #[serde(default)]
    pub queue_id: Option<String>,
}
