//! Waiting room on the player inbox (`/player/{id}`).
//!
//! Used while an invitation is open or while queued for matchmaking. It only
//! decides where to go next; the caller owns the channel subscription.

#[cfg(test)]
#[path = "waiting_test.rs"]
mod waiting_test;

use protocol::{Event, parse_event};
use tracing::{debug, info};

use crate::net::channel::{ConnectionStatus, Inbound};

const ACCEPTED: &str = "Accepted";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WaitFor {
    Invitation { invitation_id: String, share_link: String },
    Match,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigate {
    Game(String),
    /// The inbox dropped while waiting on an invitation; re-open the share
    /// link to re-check its state.
    ShareLink(String),
}

pub struct WaitingRoom {
    wait_for: WaitFor,
    initialized: bool,
    last_seq: u64,
}

impl WaitingRoom {
    #[must_use]
    pub fn new(wait_for: WaitFor) -> Self {
        Self { wait_for, initialized: false, last_seq: 0 }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.initialized
    }

    pub fn on_connection_status(&mut self, status: ConnectionStatus) -> Option<Navigate> {
        match (status, self.initialized) {
            (ConnectionStatus::Open, false) => {
                self.initialized = true;
                None
            }
            (ConnectionStatus::Open, true) | (_, false) => None,
            (_, true) => match &self.wait_for {
                WaitFor::Invitation { share_link, .. } => {
                    info!(?status, "waiting: inbox dropped; re-checking invitation");
                    Some(Navigate::ShareLink(share_link.clone()))
                }
                WaitFor::Match => None,
            },
        }
    }

    pub fn on_message(&mut self, inbound: &Inbound) -> Option<Navigate> {
        if inbound.seq <= self.last_seq {
            return None;
        }
        self.last_seq = inbound.seq;

        let event = match parse_event(&inbound.text) {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, "waiting: dropping unrecognized message");
                return None;
            }
        };

        match (&self.wait_for, event) {
            (WaitFor::Invitation { invitation_id, .. }, Event::Invitation(update))
                if update.invitation_id == *invitation_id && update.status == ACCEPTED =>
            {
                let game_id = update.game_id?;
                info!(%invitation_id, %game_id, "waiting: invitation accepted");
                Some(Navigate::Game(game_id))
            }
            (WaitFor::Match, Event::Matched { game_id, .. }) => {
                info!(%game_id, "waiting: match found");
                Some(Navigate::Game(game_id))
            }
            _ => None,
        }
    }
}
