//! Networking modules for HTTP and websocket channels.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` handles REST calls against the match backend; `channel` manages the
//! shared, reconnecting websocket per path.

pub mod api;
pub mod channel;

#[cfg(test)]
pub(crate) mod test_support;
