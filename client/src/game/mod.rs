//! Pure board model and win detection.
//!
//! Nothing here touches the network or the clock; the game store in
//! `state::game` layers turn ownership and timestamps on top.

pub mod board;
pub mod scan;

pub use board::{Board, BoardError, Coord, Token};
pub use scan::{CONNECT, find_connected_tokens};
