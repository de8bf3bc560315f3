//! Share-link landing: decide what opening an invitation link means for the
//! viewer.

#[cfg(test)]
#[path = "sharelink_test.rs"]
mod sharelink_test;

use protocol::InvitationData;
use tracing::info;

use crate::net::api::{ApiClient, ApiError};
use crate::util::share_link::{ShareLinkError, parse_share_link, share_link};

/// What the viewer should see for an invitation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvitationRoute {
    /// A game exists and the viewer is one of its players.
    OpenGame(String),
    /// The viewer sent the invitation and nobody has accepted yet.
    WaitForOpponent,
    /// Someone else's open invitation; the viewer may accept it.
    Accept,
    /// Taken by someone else, or otherwise unusable.
    Invalid,
}

#[must_use]
pub fn resolve_invitation(invite: &InvitationData, username: &str) -> InvitationRoute {
    let is_sender = invite.sender_username == username;
    let receiver = invite.receiver_username.as_deref().filter(|r| !r.is_empty());
    let game = invite.game.as_deref().filter(|g| !g.is_empty());

    if let Some(game_id) = game {
        if is_sender || receiver == Some(username) {
            return InvitationRoute::OpenGame(game_id.to_owned());
        }
    }
    match (is_sender, receiver) {
        (true, None) => InvitationRoute::WaitForOpponent,
        (false, None) => InvitationRoute::Accept,
        _ => InvitationRoute::Invalid,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InvitationError {
    #[error(transparent)]
    Link(#[from] ShareLinkError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("invitation is no longer valid")]
    Invalid,
}

/// Where following a share link leads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShareLinkOutcome {
    Game(String),
    /// Wait on the player inbox for the invitation to be accepted.
    Waiting { invitation_id: String, share_link: String },
}

/// Decode a share link, look the invitation up, and accept it if it is
/// someone else's open invitation.
///
/// # Errors
///
/// Returns [`InvitationError`] for undecodable links, failed API calls, or
/// invitations already taken by another player.
pub async fn follow_share_link(
    api: &ApiClient,
    app_url: &str,
    link: &str,
    username: &str,
) -> Result<ShareLinkOutcome, InvitationError> {
    let invitation_id = parse_share_link(link)?;
    let invite = api.get_invitation(&invitation_id).await?;

    match resolve_invitation(&invite, username) {
        InvitationRoute::OpenGame(game_id) => Ok(ShareLinkOutcome::Game(game_id)),
        InvitationRoute::WaitForOpponent => Ok(ShareLinkOutcome::Waiting {
            share_link: share_link(app_url, &invitation_id)?,
            invitation_id,
        }),
        InvitationRoute::Accept => {
            let game_id = api.accept_invitation(&invitation_id).await?;
            info!(%invitation_id, %game_id, "invitation: accepted");
            Ok(ShareLinkOutcome::Game(game_id))
        }
        InvitationRoute::Invalid => Err(InvitationError::Invalid),
    }
}
