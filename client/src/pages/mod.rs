//! Screen controllers.
//!
//! ARCHITECTURE
//! ============
//! Each screen owns route-scoped orchestration: it wires a channel and the
//! REST client to the store and tells its caller where to navigate next.
//! Rendering is left to the caller.

pub mod game;
pub mod sharelink;
pub mod waiting;
