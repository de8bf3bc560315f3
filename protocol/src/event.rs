//! Inbound websocket event normalization.
//!
//! DESIGN
//! ======
//! Probing order matters: move broadcasts carry a top-level `event_type`;
//! AI moves arrive as `{message: {player, row, column}}`; invitation updates
//! carry their own `status` field and so are checked before plain status
//! updates; matchmaking notifications only carry `game_id`.

#[cfg(test)]
#[path = "event_test.rs"]
mod event_test;

use serde_json::Value;

use crate::ProtocolError;

const PLAYER_MOVE: &str = "player_move";
const UNDO_MOVE: &str = "undo_move";
const INVITATION_UPDATE: &str = "invitation update";

/// A move placed (or taken back) by one participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveEvent {
    /// Wire token of the participant who moved (1 or 2 for valid games).
    pub player_token: u8,
    pub row: usize,
    pub column: usize,
}

/// Status change of a shared-link invitation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvitationEvent {
    pub invitation_id: String,
    /// Backend status name, e.g. `"Accepted"`.
    pub status: String,
    /// Game created for the invitation, once there is one.
    pub game_id: Option<String>,
}

/// Every inbound event the client reacts to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Move(MoveEvent),
    Undo(MoveEvent),
    Status { status: String },
    Invitation(InvitationEvent),
    Matched {
        game_id: String,
        player_one: Option<String>,
        player_two: Option<String>,
    },
    Error { message: String },
}

/// Parse raw socket text into a normalized [`Event`].
///
/// # Errors
///
/// Returns [`ProtocolError::Json`] for non-JSON text, and
/// [`ProtocolError::Unrecognized`] / [`ProtocolError::MissingField`] when the
/// payload matches no known shape.
pub fn parse_event(text: &str) -> Result<Event, ProtocolError> {
    let value = serde_json::from_str::<Value>(text)?;
    event_from_value(&value)
}

/// Normalize an already-decoded JSON value.
///
/// # Errors
///
/// See [`parse_event`].
pub fn event_from_value(value: &Value) -> Result<Event, ProtocolError> {
    if let Some(event_type) = value.get("event_type").and_then(Value::as_str) {
        return broadcast_event(event_type, value);
    }

    if value.get("type").and_then(Value::as_str) == Some("error") {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_owned();
        return Ok(Event::Error { message });
    }

    let Some(message) = value.get("message").filter(|m| m.is_object()) else {
        return Err(ProtocolError::Unrecognized(value.to_string()));
    };

    if let Some(player) = message.get("player") {
        let player_token = as_token(player).ok_or(ProtocolError::MissingField("player"))?;
        return move_event(message, player_token).map(Event::Move);
    }

    if let Some(invite) = invitation_payload(message) {
        return invitation_event(invite).map(Event::Invitation);
    }

    if let Some(status) = message.get("status").and_then(Value::as_str) {
        return Ok(Event::Status { status: status.to_owned() });
    }

    if let Some(game_id) = pick_str(message, "game_id") {
        return Ok(Event::Matched {
            game_id,
            player_one: pick_str(message, "player_one"),
            player_two: pick_str(message, "player_two"),
        });
    }

    Err(ProtocolError::Unrecognized(value.to_string()))
}

fn broadcast_event(event_type: &str, value: &Value) -> Result<Event, ProtocolError> {
    let message = value.get("message").ok_or(ProtocolError::MissingField("message"))?;
    let player_token = value
        .get("player_token")
        .and_then(as_token)
        .ok_or(ProtocolError::MissingField("player_token"))?;

    match event_type {
        PLAYER_MOVE => move_event(message, player_token).map(Event::Move),
        UNDO_MOVE => move_event(message, player_token).map(Event::Undo),
        other => Err(ProtocolError::Unrecognized(other.to_owned())),
    }
}

fn move_event(message: &Value, player_token: u8) -> Result<MoveEvent, ProtocolError> {
    let row = pick_index(message, &["row"]).ok_or(ProtocolError::MissingField("row"))?;
    let column = pick_index(message, &["column", "col"]).ok_or(ProtocolError::MissingField("column"))?;
    Ok(MoveEvent { player_token, row, column })
}

/// Invitation updates arrive either directly under `message` or wrapped once
/// more when relayed through the player inbox notification handler.
fn invitation_payload(message: &Value) -> Option<&Value> {
    let is_invitation = |v: &Value| v.get("event_type").and_then(Value::as_str) == Some(INVITATION_UPDATE);
    if is_invitation(message) {
        return Some(message);
    }
    message.get("message").filter(|inner| is_invitation(inner))
}

fn invitation_event(invite: &Value) -> Result<InvitationEvent, ProtocolError> {
    Ok(InvitationEvent {
        invitation_id: pick_str(invite, "invitation_id").ok_or(ProtocolError::MissingField("invitation_id"))?,
        status: pick_str(invite, "status").ok_or(ProtocolError::MissingField("status"))?,
        game_id: pick_str(invite, "game_id"),
    })
}

fn as_token(value: &Value) -> Option<u8> {
    value.as_u64().and_then(|n| u8::try_from(n).ok())
}

fn pick_index(payload: &Value, keys: &[&str]) -> Option<usize> {
    keys.iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_u64))
        .and_then(|n| usize::try_from(n).ok())
}

fn pick_str(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_owned)
}
