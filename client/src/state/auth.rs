//! Session collaborator boundary.
//!
//! SYSTEM CONTEXT
//! ==============
//! Sign-in lives outside this crate. Everything here needs only the viewer's
//! username, their player inbox id, and the bearer token attached to HTTP
//! calls and websocket URLs.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

/// The signed-in viewer as seen by the game client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub username: String,
    /// Player id used for the `/player/{id}` inbox channel.
    pub player_id: Option<String>,
    /// Bearer access token; absent for anonymous connections.
    pub token: Option<String>,
}

impl CurrentUser {
    /// Bearer token, ignoring empty strings.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.is_empty())
    }
}

/// Source of the current session. Read at connect/request time so a refreshed
/// token is picked up on the next attempt.
pub trait SessionProvider: Send + Sync {
    fn current_user(&self) -> Option<CurrentUser>;
}

/// Fixed session supplied up front, e.g. from CLI flags.
#[derive(Clone, Debug, Default)]
pub struct StaticSession {
    user: Option<CurrentUser>,
}

impl StaticSession {
    #[must_use]
    pub fn new(user: CurrentUser) -> Self {
        Self { user: Some(user) }
    }

    /// Session with nobody signed in.
    #[must_use]
    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

impl SessionProvider for StaticSession {
    fn current_user(&self) -> Option<CurrentUser> {
        self.user.clone()
    }
}
