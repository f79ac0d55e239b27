//! Client session pipeline for the School Portal.
//!
//! This crate provides:
//! - An authenticated request executor with refresh-on-401 and a single retry
//! - Single-flight access token refresh
//! - An explicit FSM-based session (startup check, login, logout)
//! - A route guard gating views on the session status
//! - A scripted in-memory transport for tests

mod auth_fsm;
mod error;
mod executor;
mod guard;
mod refresh;
mod request;
mod session;
mod state;
pub mod testing;
mod transport;

pub use auth_fsm::session_machine;
pub use auth_fsm::{
    SessionMachine, SessionMachineInput, SessionMachineState, SessionPhase, SessionStatus,
};
pub use error::{
    ApiError, ApiResult, RefreshFailure, SessionError, SessionResult, GENERIC_ERROR_MESSAGE,
};
pub use executor::ApiClient;
pub use guard::{with_auth_required, GuardView, Liveness, Navigator, RouteGuard};
pub use refresh::TokenRefresher;
pub use request::{ApiRequest, ApiResponse};
pub use session::{create_session, Session, LOGIN_FAILED_MESSAGE};
pub use state::SessionState;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};

pub use reqwest::{Method, StatusCode};
pub use token_store::{SessionUser, TokenPair, TokenStore};

#[cfg(test)]
mod tests;
