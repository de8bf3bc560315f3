//! Game screen controller.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds one [`GameStore`] to the `/game/{id}` channel. The caller feeds it
//! status transitions and mailbox updates from the channel's watch
//! receivers and forwards user clicks; the screen keeps the store in sync
//! with the server.
//!
//! DESIGN
//! ======
//! - Local clicks are validated, sent, then applied optimistically. A click
//!   that could not be sent still lands locally; the next refresh reconciles.
//! - Moves carrying the viewer's own token are echoes and are skipped.
//! - A channel drop marks the screen stale; the next open triggers a forced
//!   re-fetch. A gap in mailbox sequence numbers triggers the same re-fetch.

#[cfg(test)]
#[path = "game_test.rs"]
mod game_test;

use protocol::{ClientMessage, Event, parse_event};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::game::Token;
use crate::net::api::{ApiError, GameSource};
use crate::net::channel::{Channel, ConnectionStatus, Inbound, SendError};
use crate::state::game::{
    GameStore, MoveRejection, Phase, Placement, status_indicates_draw, status_indicates_win, status_winner,
};
use crate::util::timer::{elapsed, format_clock};

/// What an inbound message did to the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reaction {
    Applied(Placement),
    Undone(Placement),
    /// The viewer's own move coming back.
    Echo,
    Rejected(MoveRejection),
    StatusChanged { concluded: bool },
    /// Messages were missed and the game was re-fetched instead.
    Resynced,
    ServerError(String),
    /// Already seen, malformed, or meant for another screen.
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClickOutcome {
    pub placement: Placement,
    /// Whether the move reached an open channel.
    pub delivered: bool,
}

pub struct GameScreen<S> {
    store: GameStore,
    channel: Channel,
    source: S,
    initialized: bool,
    stale: bool,
    last_seq: u64,
    last_error: Option<String>,
}

impl<S: GameSource> GameScreen<S> {
    /// Messages already in the mailbox when the screen mounts are treated as
    /// seen; the initial fetch covers them.
    #[must_use]
    pub fn new(channel: Channel, source: S) -> Self {
        let last_seq = channel.received_message().map_or(0, |m| m.seq);
        Self {
            store: GameStore::new(),
            channel,
            source,
            initialized: false,
            stale: false,
            last_seq,
            last_error: None,
        }
    }

    /// Fetch the game for the first time.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the store is then in [`Phase::NotFound`].
    pub async fn load(&mut self, game_id: &str) -> Result<(), ApiError> {
        self.store.load(game_id, &self.source).await
    }

    #[must_use]
    pub fn store(&self) -> &GameStore {
        &self.store
    }

    #[must_use]
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Last error message pushed by the server, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the UI should show a waiting state instead of the board.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.store.loading() || self.channel.connection_status() != ConnectionStatus::Open || !self.initialized
    }

    /// React to a channel status transition. Returns whether a refresh ran.
    ///
    /// # Errors
    ///
    /// Returns the refresh error; the store is then in [`Phase::NotFound`].
    pub async fn on_connection_status(&mut self, status: ConnectionStatus) -> Result<bool, ApiError> {
        match status {
            ConnectionStatus::Open if !self.initialized => {
                self.initialized = true;
                Ok(false)
            }
            ConnectionStatus::Open if self.stale => {
                info!(path = %self.channel.path(), "game: reconnected; refreshing");
                self.stale = false;
                self.refresh().await?;
                Ok(true)
            }
            ConnectionStatus::Open => Ok(false),
            _ if self.initialized => {
                if !self.stale {
                    warn!(path = %self.channel.path(), ?status, "game: connection lost");
                }
                self.stale = true;
                self.store.set_loading(true);
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    /// React to a mailbox update.
    ///
    /// # Errors
    ///
    /// Returns the refresh error when a sequence gap forced a re-fetch.
    pub async fn on_message(&mut self, inbound: &Inbound) -> Result<Reaction, ApiError> {
        if inbound.seq <= self.last_seq {
            return Ok(Reaction::Ignored);
        }
        let gap = inbound.seq > self.last_seq + 1;
        self.last_seq = inbound.seq;
        if gap {
            warn!(seq = inbound.seq, "game: missed channel messages; refreshing");
            self.refresh().await?;
            return Ok(Reaction::Resynced);
        }

        let event = match parse_event(&inbound.text) {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, "game: dropping unrecognized message");
                return Ok(Reaction::Ignored);
            }
        };
        Ok(self.apply_event(event))
    }

    fn apply_event(&mut self, event: Event) -> Reaction {
        match event {
            Event::Move(m) => {
                let viewer = self.store.token();
                if Token::from_wire(m.player_token).is_some_and(|token| Some(token) == viewer) {
                    return Reaction::Echo;
                }
                match self.store.update_game(m.player_token, m.row, m.column) {
                    Ok(placement) => Reaction::Applied(placement),
                    Err(rejection) => {
                        debug!(%rejection, "game: remote move dropped");
                        Reaction::Rejected(rejection)
                    }
                }
            }
            Event::Undo(m) => match self.store.undo_move(m.player_token, m.row, m.column) {
                Ok(placement) => Reaction::Undone(placement),
                Err(rejection) => {
                    debug!(%rejection, "game: undo dropped");
                    Reaction::Rejected(rejection)
                }
            },
            Event::Status { status } => {
                self.store.set_status(&status);
                self.store.set_all_connected(true);
                Reaction::StatusChanged { concluded: self.store.phase() == Phase::Concluded }
            }
            Event::Error { message } => {
                warn!(%message, "game: server error");
                self.last_error = Some(message.clone());
                Reaction::ServerError(message)
            }
            Event::Invitation(_) | Event::Matched { .. } => Reaction::Ignored,
        }
    }

    async fn refresh(&mut self) -> Result<(), ApiError> {
        self.store.set_loading(true);
        self.store.set_game_data(&self.source).await
    }

    /// Play the viewer's token in `col`: validate, send, then apply locally.
    ///
    /// # Errors
    ///
    /// Returns [`MoveRejection`] without sending when the move is illegal.
    pub fn click(&mut self, col: usize) -> Result<ClickOutcome, MoveRejection> {
        let row = self.store.check_click(col)?;
        let delivered = self.channel.send_message(&ClientMessage::PlayerMove { column: col, row }.to_json()).is_ok();
        let placement = self.store.on_cell_click(col)?;
        Ok(ClickOutcome { placement, delivered })
    }

    /// Ask the server to take back the viewer's last move. The board changes
    /// when the server broadcasts the undo.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] when the channel is not open.
    pub fn undo(&self) -> Result<(), SendError> {
        self.channel.send_message(&ClientMessage::UndoMove.to_json())
    }

    /// `"{PLAYER}'s Turn"` while the game runs.
    #[must_use]
    pub fn turn_banner(&self) -> Option<String> {
        let game = self.store.game()?;
        if game.is_over() || game.current_turn.is_empty() {
            return None;
        }
        Some(format!("{}'s Turn", game.current_turn.to_uppercase()))
    }

    /// `"{WINNER} WON!"` or `"It's a draw!"` once the game has ended. A win
    /// with no four-in-a-row on the board is credited from the status text.
    #[must_use]
    pub fn result_banner(&self) -> Option<String> {
        let game = self.store.game()?;
        if game.end_time.is_none() {
            return None;
        }
        if status_indicates_win(&game.status) {
            let banner = match self.store.winner_token().or_else(|| status_winner(&game.status)) {
                Some(token) => format!("{} WON!", game.username_of(token).to_uppercase()),
                None => game.status.to_uppercase(),
            };
            return Some(banner);
        }
        if status_indicates_draw(&game.status) {
            return Some("It's a draw!".to_owned());
        }
        Some(game.status.clone())
    }

    /// Match clock as `MM:SS`.
    #[must_use]
    pub fn clock(&self, now: OffsetDateTime) -> String {
        let played = self.store.game().map(|game| elapsed(game.start_time, game.end_time, now)).unwrap_or_default();
        format_clock(played)
    }
}
