//! Session state machine using rust-fsm.
//!
//! The machine tracks the in-progress phases (validating, authenticating,
//! logging out) that never reach storage. Consumers see the coarser
//! [`SessionStatus`].
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │     Unknown     │ (initial)
//! └────────┬────────┘
//!          │ CheckStarted                 LoginAttempt
//!          ▼                                   │
//! ┌─────────────────┐                 ┌────────▼────────┐
//! │   Validating    │                 │ Authenticating  │
//! └────────┬────────┘                 └────────┬────────┘
//!          │ IdentityVerified /                │ LoginSucceeded
//!          │ CachedIdentityUsed                │
//!          ▼                                   ▼
//! ┌─────────────────┐   SessionExpired   ┌─────────────────┐
//! │ Unauthenticated │ ◄───────────────── │  Authenticated  │
//! └─────────────────┘                    └────────┬────────┘
//!          ▲                                      │ LogoutRequested
//!          │ LogoutComplete              ┌────────▼────────┐
//!          └──────────────────────────── │   LoggingOut    │
//!                                        └─────────────────┘
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};
use token_store::SessionUser;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Unknown)

    Unknown => {
        CheckStarted => Validating,
        LoginAttempt => Authenticating,
        LogoutRequested => LoggingOut,
        SessionExpired => Unauthenticated
    },
    Validating => {
        NoToken => Unauthenticated,
        IdentityVerified => Authenticated,
        // Identity call failed but a cached user is available
        CachedIdentityUsed => Authenticated,
        IdentityRejected => Unauthenticated,
        SessionExpired => Unauthenticated
    },
    Unauthenticated => {
        CheckStarted => Validating,
        LoginAttempt => Authenticating,
        LogoutRequested => LoggingOut,
        SessionExpired => Unauthenticated
    },
    Authenticating => {
        LoginSucceeded => Authenticated,
        LoginFailed => Unauthenticated
    },
    Authenticated => {
        CheckStarted => Validating,
        LogoutRequested => LoggingOut,
        SessionExpired => Unauthenticated
    },
    LoggingOut => {
        LogoutComplete => Unauthenticated
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Fine-grained session phase, mirroring the FSM state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Nothing resolved yet.
    Unknown,
    /// Startup check in progress.
    Validating,
    /// No usable session.
    Unauthenticated,
    /// Login request in flight.
    Authenticating,
    /// Logged in.
    Authenticated,
    /// Logout in progress.
    LoggingOut,
}

impl SessionPhase {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionPhase::Authenticated)
    }

    /// Returns true while an operation is still resolving the session.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionPhase::Unknown
                | SessionPhase::Validating
                | SessionPhase::Authenticating
                | SessionPhase::LoggingOut
        )
    }
}

impl From<&SessionMachineState> for SessionPhase {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Unknown => SessionPhase::Unknown,
            SessionMachineState::Validating => SessionPhase::Validating,
            SessionMachineState::Unauthenticated => SessionPhase::Unauthenticated,
            SessionMachineState::Authenticating => SessionPhase::Authenticating,
            SessionMachineState::Authenticated => SessionPhase::Authenticated,
            SessionMachineState::LoggingOut => SessionPhase::LoggingOut,
        }
    }
}

/// What views and guards observe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "user", rename_all = "snake_case")]
pub enum SessionStatus {
    /// Still loading; guards show a placeholder.
    Unknown,
    Unauthenticated,
    Authenticated(SessionUser),
}

impl SessionStatus {
    /// Collapse a phase and the current user into the public status.
    ///
    /// An authenticated phase without a user is reported as unknown so a
    /// guard never renders without an identity.
    pub fn from_phase(phase: SessionPhase, user: Option<&SessionUser>) -> Self {
        match (phase, user) {
            (SessionPhase::Authenticated, Some(user)) => SessionStatus::Authenticated(user.clone()),
            (SessionPhase::Unauthenticated, _) => SessionStatus::Unauthenticated,
            _ => SessionStatus::Unknown,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionStatus::Unknown)
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            SessionStatus::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}
