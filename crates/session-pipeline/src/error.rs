//! Error types for the request pipeline and the session machine.

use reqwest::StatusCode;
use thiserror::Error;

/// Message used when a failed response carries no usable `message` field.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

/// Outcome of a request that did not produce a usable 2xx response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Server unreachable, DNS failure, timeout, or connection reset
    #[error("Network error: {0}")]
    Transport(String),

    /// The access token was rejected and could not be renewed
    #[error("Session expired")]
    AuthExpired,

    /// Any other non-2xx response
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    /// A response body that is not the JSON envelope we expect
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A request path that cannot be joined onto the API root, or that
    /// would leave it
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The session was shut down
    #[error("Session is closed")]
    Closed,
}

impl ApiError {
    /// Failures where the server never produced a meaningful answer.
    pub fn is_transport_class(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::MalformedResponse(_))
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired)
    }

    /// HTTP status for [`ApiError::Api`] failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(e: url::ParseError) -> Self {
        ApiError::InvalidUrl(e.to_string())
    }
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;

/// Why a token refresh did not yield a new access token.
///
/// Cloneable because every caller attached to a shared refresh observes the
/// same outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshFailure {
    /// Nothing to exchange; no request was made
    #[error("No refresh token stored")]
    NoRefreshToken,

    #[error("Refresh request failed: {0}")]
    Transport(String),

    /// Non-2xx status or `success: false`
    #[error("Refresh rejected with status {status}")]
    Rejected { status: StatusCode },

    #[error("Malformed refresh response: {0}")]
    Malformed(String),
}

/// Session-level errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The server refused the credentials; carries its message verbatim
    #[error("{0}")]
    LoginRejected(String),

    /// The login exchange failed before the server could answer
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// The session was shut down
    #[error("Session is closed")]
    Closed,
}

/// Result type alias using SessionError.
pub type SessionResult<T> = Result<T, SessionError>;
