//! Client-side state.
//!
//! `auth` is the session boundary; `game` is the per-match store every
//! screen mutates.

pub mod auth;
pub mod game;
