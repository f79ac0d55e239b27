//! Session context: startup check, login, and logout over the FSM.
//!
//! A [`Session`] bundles the token store, the request executor, and the
//! shared state. It is built once by [`create_session`] and cloned into
//! whatever needs it; clones share everything.

use crate::auth_fsm::{SessionMachineInput, SessionPhase, SessionStatus};
use crate::error::{ApiError, ApiResult, SessionError, SessionResult};
use crate::executor::ApiClient;
use crate::request::{ApiRequest, ApiResponse};
use crate::state::SessionState;
use crate::transport::{HttpTransport, ReqwestTransport};
use client_config::Config;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use token_store::{SessionUser, TokenPair, TokenStore};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

/// Shown when a login is refused without a server message.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";

/// `data` of a successful `POST /auth/login`.
#[derive(Debug, Deserialize)]
struct LoginData {
    access_token: String,
    refresh_token: String,
    user: SessionUser,
}

/// Build a session talking to the configured backend.
pub fn create_session(config: &Config, store: TokenStore) -> ApiResult<Session> {
    let api_root = config
        .api_root()
        .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
    let transport = ReqwestTransport::new(config.request_timeout())
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    Ok(Session::new(api_root, Arc::new(transport), Arc::new(store)))
}

/// Explicit session context.
#[derive(Clone)]
pub struct Session {
    state: Arc<SessionState>,
    store: Arc<TokenStore>,
    api: ApiClient,
}

impl Session {
    pub fn new(api_root: Url, transport: Arc<dyn HttpTransport>, store: Arc<TokenStore>) -> Self {
        let state = Arc::new(SessionState::new());
        let api = ApiClient::new(api_root, transport, store.clone(), state.clone());
        Self { state, store, api }
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.state.user()
    }

    /// Observe status changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.state.subscribe()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Send a request through the executor.
    pub async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        self.api.send(request).await
    }

    /// Resolve the startup status.
    ///
    /// Without an access token this settles on `Unauthenticated` without any
    /// request. Otherwise the identity endpoint decides; if it fails for any
    /// reason other than an expired session, the cached user keeps the
    /// session authenticated.
    pub async fn check_auth(&self) -> SessionResult<SessionStatus> {
        self.state
            .transition(&SessionMachineInput::CheckStarted, None)?;

        if self.store.access_token().is_none() {
            debug!("No access token stored");
            self.state.transition(&SessionMachineInput::NoToken, None)?;
            return Ok(self.status());
        }

        match self.fetch_identity().await {
            Ok(user) => {
                self.store.set_cached_user(&user);
                info!(user_id = user.id, username = %user.username, "Session verified");
                self.state
                    .transition(&SessionMachineInput::IdentityVerified, Some(user))?;
            }
            Err(ApiError::AuthExpired) => {
                // Store already cleared and state downgraded by the executor
                info!("Stored session is no longer valid");
            }
            Err(e) => match self.store.cached_user() {
                Some(user) => {
                    warn!(error = %e, user_id = user.id, "Identity check failed, using cached user");
                    self.state
                        .transition(&SessionMachineInput::CachedIdentityUsed, Some(user))?;
                }
                None => {
                    warn!(error = %e, "Identity check failed and no cached user");
                    self.state
                        .transition(&SessionMachineInput::IdentityRejected, None)?;
                }
            },
        }

        Ok(self.status())
    }

    /// `GET /auth/me`.
    pub async fn fetch_identity(&self) -> ApiResult<SessionUser> {
        let response = self.api.send(ApiRequest::get("/auth/me")).await?;
        if !response.is_success() {
            return Err(ApiError::Api {
                status: response.status,
                message: response
                    .message()
                    .unwrap_or(crate::error::GENERIC_ERROR_MESSAGE)
                    .to_string(),
            });
        }
        response.data()
    }

    /// Exchange credentials for a token pair.
    ///
    /// On refusal the server's message is returned verbatim as
    /// [`SessionError::LoginRejected`] and the store is left as it was.
    pub async fn login(&self, username: &str, password: &str) -> SessionResult<SessionUser> {
        self.state
            .transition(&SessionMachineInput::LoginAttempt, None)?;

        match self.exchange_credentials(username, password).await {
            Ok((pair, user)) => {
                self.store.set_token_pair(&pair);
                self.store.set_cached_user(&user);
                info!(user_id = user.id, username = %user.username, "Logged in");
                self.state
                    .transition(&SessionMachineInput::LoginSucceeded, Some(user.clone()))?;
                Ok(user)
            }
            Err(e) => {
                warn!(username, error = %e, "Login failed");
                self.state
                    .transition(&SessionMachineInput::LoginFailed, None)?;
                Err(e)
            }
        }
    }

    async fn exchange_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> SessionResult<(TokenPair, SessionUser)> {
        let request = ApiRequest::post("/auth/login")
            .json(json!({ "username": username, "password": password }))
            .public();

        let response = match self.api.send(request).await {
            Ok(response) => response,
            Err(ApiError::Api { message, .. }) => return Err(SessionError::LoginRejected(message)),
            Err(e) => return Err(e.into()),
        };

        if !response.is_success() {
            let message = response.message().unwrap_or(LOGIN_FAILED_MESSAGE);
            return Err(SessionError::LoginRejected(message.to_string()));
        }

        let data: LoginData = response.data()?;
        Ok((
            TokenPair {
                access_token: data.access_token,
                refresh_token: data.refresh_token,
            },
            data.user,
        ))
    }

    /// Notify the server, then clear local state whatever happened.
    pub async fn logout(&self) {
        let requested = self
            .state
            .transition(&SessionMachineInput::LogoutRequested, None)
            .is_ok();

        if self.store.access_token().is_some() {
            match self.api.send(ApiRequest::post("/auth/logout")).await {
                Ok(_) => debug!("Server acknowledged logout"),
                Err(e) => warn!(error = %e, "Server logout failed, clearing local session anyway"),
            }
        }

        self.store.clear_session();

        let completed = requested
            && self
                .state
                .transition(&SessionMachineInput::LogoutComplete, None)
                .is_ok();
        if !completed {
            self.state.reset();
        }

        info!("Logged out");
    }

    pub fn is_closed(&self) -> bool {
        self.api.is_closed()
    }

    /// Close the session for every clone.
    ///
    /// Later requests fail with [`ApiError::Closed`], transitions with
    /// [`SessionError::Closed`], and an in-flight refresh is forgotten.
    /// Status subscribers see the channel end. Stored tokens are kept, so a
    /// new session over the same store resumes where this one stopped.
    pub fn shutdown(&self) {
        debug!(phase = ?self.phase(), "Shutting down session");
        self.api.close();
    }
}
