//! Plain-text rendering of the game screen.
//!
//! Player one is `X`, player two is `O`. Winning cells are bracketed.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::fmt::Write as _;

use client::game::Token;
use client::net::api::GameSource;
use client::pages::game::GameScreen;
use client::state::game::GameStore;
use time::OffsetDateTime;

fn glyph(token: Option<Token>) -> char {
    match token {
        Some(Token::One) => 'X',
        Some(Token::Two) => 'O',
        None => '.',
    }
}

/// Board with a 1-based column header. Empty when no game is loaded.
#[must_use]
pub fn board_text(store: &GameStore) -> String {
    let Some(game) = store.game() else {
        return String::new();
    };
    let mut out = String::new();
    for col in 0..game.board.cols() {
        let _ = write!(out, "{:^3}", col + 1);
    }
    out.push('\n');
    for row in 0..game.board.rows() {
        for col in 0..game.board.cols() {
            let g = glyph(game.board.get(row, col));
            if store.is_connected(row, col) {
                let _ = write!(out, "[{g}]");
            } else {
                let _ = write!(out, " {g} ");
            }
        }
        out.push('\n');
    }
    out
}

/// Players, clock, and the turn or result line.
#[must_use]
pub fn status_text<S: GameSource>(screen: &GameScreen<S>, now: OffsetDateTime) -> String {
    let store = screen.store();
    let Some(game) = store.game() else {
        return String::new();
    };
    let opponent = if game.player_two.is_empty() { "(waiting)" } else { game.player_two.as_str() };
    let mut out = format!("{} (X) vs {opponent} (O)  [{}]  {}\n", game.player_one, game.status, screen.clock(now));
    if screen.is_waiting() {
        out.push_str("Connecting...\n");
    }
    if let Some(banner) = screen.result_banner().or_else(|| screen.turn_banner()) {
        out.push_str(&banner);
        out.push('\n');
    }
    if let Some(error) = screen.last_error() {
        let _ = writeln!(out, "server: {error}");
    }
    out
}

pub fn draw<S: GameSource>(screen: &GameScreen<S>, now: OffsetDateTime) {
    print!("\n{}{}", board_text(screen.store()), status_text(screen, now));
}
