//! Game state store for one open match.
//!
//! SYSTEM CONTEXT
//! ==============
//! The store is the single owner of what the viewer sees for a game: the board,
//! whose turn it is, the per-column landing rows, the status line, and the
//! winning cells. Local clicks and remote events both flow through it.
//!
//! DESIGN
//! ======
//! - Loading happens once per screen unless forced; a forced reload replaces
//!   the whole snapshot, which is how reconnects recover missed events.
//! - Remote placements recompute the column's landing row from the board, so
//!   replaying an event is harmless.
//! - Timestamps are stamped from the local clock only when the server has not
//!   already supplied them.
//!
//! ERROR HANDLING
//! ==============
//! Move mutations return [`MoveRejection`] instead of mutating partially. A
//! failed fetch moves the store to [`Phase::NotFound`]; it is not retried.

#[cfg(test)]
#[path = "game_test.rs"]
mod game_test;

use protocol::GameData;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info, warn};

use crate::game::{Board, BoardError, Coord, Token, find_connected_tokens};
use crate::net::api::{ApiError, GameSource};

/// Whether a backend status string announces a winner (e.g. "Player 1 Wins").
#[must_use]
pub fn status_indicates_win(status: &str) -> bool {
    status.to_ascii_lowercase().contains("wins")
}

/// Player named by a win status ("Player 1 Wins", "Player Two Wins"), for
/// wins the board does not show, such as a forfeit.
#[must_use]
pub fn status_winner(status: &str) -> Option<Token> {
    let status = status.to_ascii_lowercase();
    if !status_indicates_win(&status) {
        return None;
    }
    if status.contains("player 1") || status.contains("player one") {
        Some(Token::One)
    } else if status.contains("player 2") || status.contains("player two") {
        Some(Token::Two)
    } else {
        None
    }
}

/// Whether a backend status string announces a draw.
#[must_use]
pub fn status_indicates_draw(status: &str) -> bool {
    status.to_ascii_lowercase().contains("draw")
}

/// Whether a status string means the game is over.
#[must_use]
pub fn status_concludes(status: &str) -> bool {
    status_indicates_win(status) || status_indicates_draw(status)
}

#[derive(Debug, thiserror::Error)]
pub enum GameDataError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("invalid timestamp `{value}`: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: time::error::Parse,
    },
}

/// Snapshot of a game as seen by one viewer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Game {
    pub game_id: String,
    pub player_one: String,
    /// Empty until a second player joins.
    pub player_two: String,
    pub board: Board,
    pub current_turn: String,
    pub start_time: Option<OffsetDateTime>,
    pub end_time: Option<OffsetDateTime>,
    pub status: String,
    /// The viewer.
    pub username: String,
}

impl Game {
    /// Build the client model from a `GET /game/{id}` payload.
    ///
    /// # Errors
    ///
    /// Returns [`GameDataError`] when the board shape disagrees with the
    /// declared dimensions or a timestamp is not RFC 3339.
    pub fn from_wire(data: GameData, username: &str) -> Result<Self, GameDataError> {
        let board = Board::from_rows(data.rows, data.columns, &data.board)?;
        Ok(Self {
            game_id: data.game_id,
            player_one: data.player_one_username,
            player_two: data.player_two_username.unwrap_or_default(),
            board,
            current_turn: data.current_turn_username.unwrap_or_default(),
            start_time: parse_timestamp(data.start_time)?,
            end_time: parse_timestamp(data.end_time)?,
            status: data.status_name,
            username: username.to_owned(),
        })
    }

    /// Token a participant plays with. Anyone other than player one is treated
    /// as player two.
    #[must_use]
    pub fn token_of(&self, username: &str) -> Token {
        if username == self.player_one { Token::One } else { Token::Two }
    }

    #[must_use]
    pub fn username_of(&self, token: Token) -> &str {
        match token {
            Token::One => &self.player_one,
            Token::Two => &self.player_two,
        }
    }

    /// The participant who is not the viewer.
    #[must_use]
    pub fn opponent(&self) -> &str {
        self.username_of(self.token_of(&self.username).other())
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.end_time.is_some() || status_concludes(&self.status)
    }
}

fn parse_timestamp(raw: Option<String>) -> Result<Option<OffsetDateTime>, GameDataError> {
    match raw {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => OffsetDateTime::parse(&value, &Rfc3339)
            .map(Some)
            .map_err(|source| GameDataError::Timestamp { value, source }),
    }
}

/// Lifecycle of the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Loading,
    InProgress,
    Concluded,
    NotFound,
}

/// A token written to the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub row: usize,
    pub col: usize,
    pub token: Token,
    /// Whether `current_turn` changed as a result.
    pub turn_flipped: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    #[error("no game is loaded")]
    NotLoaded,
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("the game has ended")]
    GameEnded,
    #[error("column {0} does not exist")]
    ColumnOutOfRange(usize),
    #[error("column {0} is full")]
    ColumnFull(usize),
    #[error("cell {row}-{col} is outside the board")]
    OutOfBounds { row: usize, col: usize },
    #[error("unknown player token {0}")]
    UnknownToken(u8),
}

#[derive(Debug, Default)]
pub struct GameStore {
    game: Option<Game>,
    token: Option<Token>,
    /// Per column: row the next token lands in, `None` once full.
    empty_rows: Vec<Option<usize>>,
    hovered: Option<usize>,
    connect_tokens: Vec<Coord>,
    loading: bool,
    not_found: bool,
}

impl GameStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- lifecycle ------------------------------------------------------

    /// Load a game snapshot. Ignored when a game is already loaded unless
    /// `force` is set. Returns whether the snapshot was applied.
    pub fn initialize(&mut self, game: Game, force: bool) -> bool {
        if self.game.is_some() && !force {
            debug!(game_id = %game.game_id, "store: already initialized; ignoring snapshot");
            return false;
        }

        let token = game.token_of(&game.username);
        self.empty_rows = (0..game.board.cols()).map(|col| game.board.landing_row(col)).collect();
        self.token = Some(token);
        self.hovered = None;
        self.not_found = false;
        info!(game_id = %game.game_id, token = token.as_wire(), status = %game.status, force, "store: game loaded");
        self.game = Some(game);
        self.set_all_connected(false);
        self.loading = false;
        true
    }

    /// Fetch a game for the first time.
    ///
    /// # Errors
    ///
    /// Propagates the fetch error after moving to [`Phase::NotFound`].
    pub async fn load(&mut self, game_id: &str, source: &dyn GameSource) -> Result<(), ApiError> {
        self.fetch_into(game_id, source, false).await
    }

    /// Re-fetch the loaded game and replace the local snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotLoaded`] when there is nothing to refresh, or the
    /// fetch error after moving to [`Phase::NotFound`].
    pub async fn set_game_data(&mut self, source: &dyn GameSource) -> Result<(), ApiError> {
        let Some(game_id) = self.game.as_ref().map(|game| game.game_id.clone()) else {
            return Err(ApiError::NotLoaded);
        };
        self.fetch_into(&game_id, source, true).await
    }

    async fn fetch_into(&mut self, game_id: &str, source: &dyn GameSource, force: bool) -> Result<(), ApiError> {
        self.loading = true;
        match source.fetch_game(game_id).await {
            Ok(game) => {
                self.initialize(game, force);
                self.loading = false;
                Ok(())
            }
            Err(e) => {
                warn!(%game_id, error = %e, "store: game fetch failed");
                self.loading = false;
                self.not_found = true;
                Err(e)
            }
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.loading {
            return Phase::Loading;
        }
        if self.not_found {
            return Phase::NotFound;
        }
        match &self.game {
            None => Phase::Uninitialized,
            Some(game) if game.is_over() => Phase::Concluded,
            Some(_) => Phase::InProgress,
        }
    }

    // -- queries --------------------------------------------------------

    #[must_use]
    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    /// The viewer's token, once a game is loaded.
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        self.token
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn is_my_turn(&self) -> bool {
        self.game.as_ref().is_some_and(|game| game.current_turn == game.username)
    }

    #[must_use]
    pub fn empty_rows(&self) -> &[Option<usize>] {
        &self.empty_rows
    }

    #[must_use]
    pub fn get_token(&self, row: usize, col: usize) -> Option<Token> {
        self.game.as_ref().and_then(|game| game.board.get(row, col))
    }

    /// Full means the top cell is occupied. Unknown columns count as full.
    #[must_use]
    pub fn is_column_full(&self, col: usize) -> bool {
        self.game.as_ref().is_none_or(|game| game.board.is_column_full(col))
    }

    /// Winning cells after the last live status update; duplicates possible.
    #[must_use]
    pub fn connect_tokens(&self) -> &[Coord] {
        &self.connect_tokens
    }

    #[must_use]
    pub fn is_connected(&self, row: usize, col: usize) -> bool {
        self.connect_tokens.contains(&Coord::new(row, col))
    }

    /// Token of the first winning cell, if any.
    #[must_use]
    pub fn winner_token(&self) -> Option<Token> {
        let first = self.connect_tokens.first()?;
        self.get_token(first.row, first.col)
    }

    // -- hover ----------------------------------------------------------

    pub fn on_mouse_over(&mut self, col: usize) {
        self.hovered = Some(col);
    }

    pub fn on_mouse_out(&mut self) {
        self.hovered = None;
    }

    /// Hovered column, suppressed when it is not the viewer's turn, the game
    /// is over, or the column is full.
    #[must_use]
    pub fn column_highlight(&self) -> Option<usize> {
        let col = self.hovered?;
        let game = self.game.as_ref()?;
        if !self.is_my_turn() || game.is_over() || self.is_column_full(col) {
            return None;
        }
        Some(col)
    }

    // -- mutations ------------------------------------------------------

    /// Row a local click on `col` would fill, without mutating.
    ///
    /// # Errors
    ///
    /// Returns the [`MoveRejection`] the click would hit.
    pub fn check_click(&self, col: usize) -> Result<usize, MoveRejection> {
        let game = self.game.as_ref().ok_or(MoveRejection::NotLoaded)?;
        if game.current_turn != game.username {
            return Err(MoveRejection::NotYourTurn);
        }
        if game.is_over() {
            return Err(MoveRejection::GameEnded);
        }
        let slot = self.empty_rows.get(col).ok_or(MoveRejection::ColumnOutOfRange(col))?;
        slot.ok_or(MoveRejection::ColumnFull(col))
    }

    /// Drop the viewer's token into `col` and hand the turn to the opponent.
    ///
    /// # Errors
    ///
    /// Returns [`MoveRejection`] and leaves the store untouched when it is not
    /// the viewer's turn, the game is over, or the column cannot take a token.
    pub fn on_cell_click(&mut self, col: usize) -> Result<Placement, MoveRejection> {
        let row = self.check_click(col)?;
        let token = self.token.ok_or(MoveRejection::NotLoaded)?;
        let game = self.game.as_mut().ok_or(MoveRejection::NotLoaded)?;

        game.board.set(row, col, Some(token));
        self.empty_rows[col] = row.checked_sub(1);
        game.current_turn = game.opponent().to_owned();
        if game.start_time.is_none() {
            game.start_time = Some(OffsetDateTime::now_utc());
        }
        debug!(row, col, "store: local move applied");
        Ok(Placement { row, col, token, turn_flipped: true })
    }

    /// Apply a placement reported by the server.
    ///
    /// The landing row for `col` is recomputed from the board afterwards, so
    /// an echo or duplicate of an already-applied move changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`MoveRejection`] when no game is loaded, the cell is outside
    /// the board, or the token value is not 1 or 2.
    pub fn update_game(&mut self, remote_token: u8, row: usize, col: usize) -> Result<Placement, MoveRejection> {
        let viewer = self.token;
        let game = self.game.as_mut().ok_or(MoveRejection::NotLoaded)?;
        if !game.board.contains(row, col) {
            debug!(row, col, "store: remote move outside board");
            return Err(MoveRejection::OutOfBounds { row, col });
        }
        let token = Token::from_wire(remote_token).ok_or(MoveRejection::UnknownToken(remote_token))?;

        game.board.set(row, col, Some(token));
        if game.start_time.is_none() {
            game.start_time = Some(OffsetDateTime::now_utc());
        }
        self.empty_rows[col] = game.board.landing_row(col);

        let turn_flipped = viewer != Some(token) && game.current_turn != game.username;
        if viewer != Some(token) {
            game.current_turn = game.username.clone();
        }
        debug!(row, col, token = remote_token, "store: remote move applied");
        Ok(Placement { row, col, token, turn_flipped })
    }

    /// Remove a token after the server accepted an undo. The turn returns to
    /// whoever played the removed token.
    ///
    /// # Errors
    ///
    /// Same conditions as [`GameStore::update_game`].
    pub fn undo_move(&mut self, remote_token: u8, row: usize, col: usize) -> Result<Placement, MoveRejection> {
        let game = self.game.as_mut().ok_or(MoveRejection::NotLoaded)?;
        if !game.board.contains(row, col) {
            return Err(MoveRejection::OutOfBounds { row, col });
        }
        let token = Token::from_wire(remote_token).ok_or(MoveRejection::UnknownToken(remote_token))?;

        game.board.set(row, col, None);
        self.empty_rows[col] = game.board.landing_row(col);

        let owner = game.username_of(token).to_owned();
        let turn_flipped = game.current_turn != owner;
        game.current_turn = owner;
        debug!(row, col, token = remote_token, "store: move undone");
        Ok(Placement { row, col, token, turn_flipped })
    }

    pub fn set_status(&mut self, status: &str) {
        match self.game.as_mut() {
            Some(game) => {
                info!(game_id = %game.game_id, %status, "store: status changed");
                game.status = status.to_owned();
            }
            None => debug!(%status, "store: status ignored; no game loaded"),
        }
    }

    /// Recompute winning cells from the board.
    ///
    /// `live` marks a status change observed on the channel; only then is a
    /// missing end time stamped from the local clock for a concluded game.
    /// Loading a snapshot passes `false` so historical games keep the server's
    /// timestamps.
    pub fn set_all_connected(&mut self, live: bool) {
        self.connect_tokens.clear();
        let Some(game) = self.game.as_mut() else {
            return;
        };
        if live && status_concludes(&game.status) && game.end_time.is_none() {
            game.end_time = Some(OffsetDateTime::now_utc());
        }
        if !status_indicates_win(&game.status) {
            return;
        }
        self.connect_tokens = find_connected_tokens(&game.board);
    }
}
