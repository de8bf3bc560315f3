//! REST client for the match backend.
//!
//! Every request carries the session's bearer token; calls made without one
//! fail fast with [`ApiError::MissingSession`] instead of hitting the server.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses map to [`ApiError::Status`], except 404 which becomes
//! [`ApiError::NotFound`] so screens can render a not-found state.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;

use async_trait::async_trait;
use protocol::{
    AcceptInvitationResponse, CreateGameRequest, CreateGameResponse, GameData, GenerateInvitationResponse,
    InvitationData, MatchRequestResponse,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::state::auth::{CurrentUser, SessionProvider};
use crate::state::game::{Game, GameDataError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing session; sign in and pass a username and token")]
    MissingSession,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid game payload: {0}")]
    InvalidGame(#[from] GameDataError),
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
    #[error("no game is loaded")]
    NotLoaded,
}

/// Anything that can produce a game snapshot for the store.
#[async_trait]
pub trait GameSource: Send + Sync {
    async fn fetch_game(&self, game_id: &str) -> Result<Game, ApiError>;
}

fn game_endpoint(game_id: &str) -> String {
    format!("/game/{game_id}")
}

fn share_invite_endpoint(invitation_id: &str) -> String {
    format!("/invitation/share-invite/{invitation_id}")
}

fn accept_invitation_endpoint(invitation_id: &str) -> String {
    format!("/invitation/{invitation_id}/accept")
}

fn status_error(endpoint: &str, status: u16) -> ApiError {
    if status == 404 {
        ApiError::NotFound(endpoint.to_owned())
    } else {
        ApiError::Status { endpoint: endpoint.to_owned(), status }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionProvider>,
}

impl ApiClient {
    #[must_use]
    pub fn new(config: &ClientConfig, session: Arc<dyn SessionProvider>) -> Self {
        Self::with_base_url(&config.api_url, session)
    }

    #[must_use]
    pub fn with_base_url(base_url: &str, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized_user(&self) -> Result<(CurrentUser, String), ApiError> {
        let user = self.session.current_user().ok_or(ApiError::MissingSession)?;
        let token = user.bearer().ok_or(ApiError::MissingSession)?.to_owned();
        Ok((user, token))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let (_, token) = self.authorized_user()?;
        debug!(%path, "api: GET");
        let response = self.http.get(self.url(path)).bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(path, status.as_u16()));
        }
        Ok(response.json::<T>().await?)
    }

    async fn post_json<B, T>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let (_, token) = self.authorized_user()?;
        debug!(%path, "api: POST");
        let request = self.http.post(self.url(path)).bearer_auth(token);
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(path, status.as_u16()));
        }
        Ok(response.json::<T>().await?)
    }

    /// Raw game payload from `GET /game/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on a missing session, transport failure, non-2xx
    /// status, or undecodable body.
    pub async fn fetch_game_data(&self, game_id: &str) -> Result<GameData, ApiError> {
        self.get_json(&game_endpoint(game_id)).await
    }

    /// Create a game against an AI opponent and return its id.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch_game_data`].
    pub async fn create_ai_game(&self, difficulty_level: u8, algorithm: &str) -> Result<String, ApiError> {
        let body = CreateGameRequest { difficulty_level, algorithm: algorithm.to_owned() };
        let response: CreateGameResponse = self.post_json("/game/create", Some(&body)).await?;
        Ok(response.game_id)
    }

    /// Create an invitation and return its id.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch_game_data`].
    pub async fn generate_invitation(&self) -> Result<String, ApiError> {
        let response: GenerateInvitationResponse = self.post_json::<(), _>("/invitation/generate", None).await?;
        Ok(response.invitation_id)
    }

    /// # Errors
    ///
    /// See [`ApiClient::fetch_game_data`].
    pub async fn get_invitation(&self, invitation_id: &str) -> Result<InvitationData, ApiError> {
        self.get_json(&share_invite_endpoint(invitation_id)).await
    }

    /// Accept an invitation and return the id of the game it created.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] when the backend accepted without
    /// naming a game, otherwise see [`ApiClient::fetch_game_data`].
    pub async fn accept_invitation(&self, invitation_id: &str) -> Result<String, ApiError> {
        let response: AcceptInvitationResponse =
            self.post_json::<(), _>(&accept_invitation_endpoint(invitation_id), None).await?;
        response.game.ok_or(ApiError::MissingField("game"))
    }

    /// Join the matchmaking queue. A match arrives later on the player inbox.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch_game_data`].
    pub async fn request_match(&self) -> Result<MatchRequestResponse, ApiError> {
        self.post_json::<(), _>("/match/request", None).await
    }

    /// Leave the matchmaking queue.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::fetch_game_data`].
    pub async fn cancel_match(&self) -> Result<(), ApiError> {
        let _: serde_json::Value = self.post_json::<(), _>("/match/cancel", None).await?;
        Ok(())
    }
}

#[async_trait]
impl GameSource for ApiClient {
    async fn fetch_game(&self, game_id: &str) -> Result<Game, ApiError> {
        let (user, _) = self.authorized_user()?;
        let data = self.fetch_game_data(game_id).await?;
        Ok(Game::from_wire(data, &user.username)?)
    }
}
