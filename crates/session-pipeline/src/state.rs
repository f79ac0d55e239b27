//! Shared session state: the FSM, the current user, and the status channel.

use crate::auth_fsm::{SessionMachine, SessionMachineInput, SessionPhase, SessionStatus};
use crate::error::{SessionError, SessionResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use token_store::SessionUser;
use tokio::sync::watch;
use tracing::debug;

struct Inner {
    machine: SessionMachine,
    user: Option<SessionUser>,
    /// Dropped on close so subscribers see the channel end.
    status_tx: Option<watch::Sender<SessionStatus>>,
}

/// State shared by the session, the executor, and guards.
///
/// Every transition republishes [`SessionStatus`] on a watch channel when
/// the visible status changes. After [`close`](Self::close) the channel is
/// gone and the state stops accepting transitions.
pub struct SessionState {
    inner: Mutex<Inner>,
    closed: AtomicBool,
}

impl SessionState {
    pub fn new() -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Unknown);
        Self {
            inner: Mutex::new(Inner {
                machine: SessionMachine::new(),
                user: None,
                status_tx: Some(status_tx),
            }),
            closed: AtomicBool::new(false),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from(self.inner.lock().machine.state())
    }

    pub fn status(&self) -> SessionStatus {
        let inner = self.inner.lock();
        SessionStatus::from_phase(SessionPhase::from(inner.machine.state()), inner.user.as_ref())
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.inner.lock().user.clone()
    }

    /// Observe status changes. Once closed, the receiver holds the last
    /// status and reports the channel as ended.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        let inner = self.inner.lock();
        match &inner.status_tx {
            Some(tx) => tx.subscribe(),
            None => {
                let status = SessionStatus::from_phase(
                    SessionPhase::from(inner.machine.state()),
                    inner.user.as_ref(),
                );
                watch::channel(status).1
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop accepting transitions and end the status channel. Returns
    /// false if already closed.
    pub fn close(&self) -> bool {
        let mut inner = self.inner.lock();
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        inner.status_tx = None;
        debug!(phase = ?SessionPhase::from(inner.machine.state()), "Session state closed");
        true
    }

    /// Apply an input. Entering `Authenticated` installs `user`; entering
    /// `Unauthenticated` forgets the current one.
    pub fn transition(
        &self,
        input: &SessionMachineInput,
        user: Option<SessionUser>,
    ) -> SessionResult<SessionPhase> {
        let mut inner = self.inner.lock();
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        let old_phase = SessionPhase::from(inner.machine.state());

        inner.machine.consume(input).map_err(|_| {
            SessionError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                inner.machine.state()
            ))
        })?;

        let new_phase = SessionPhase::from(inner.machine.state());
        match new_phase {
            SessionPhase::Authenticated => {
                if user.is_some() {
                    inner.user = user;
                }
            }
            SessionPhase::Unauthenticated => inner.user = None,
            _ => {}
        }

        // Publish under the lock so concurrent transitions stay ordered
        let status = SessionStatus::from_phase(new_phase, inner.user.as_ref());
        publish(&inner, status);
        drop(inner);

        if old_phase != new_phase {
            debug!(old_phase = ?old_phase, new_phase = ?new_phase, "Session state transition");
        }

        Ok(new_phase)
    }

    /// Downgrade after the server rejected the session.
    ///
    /// Ignored while logging in or out, since those flows settle the state
    /// themselves. Returns whether a downgrade happened.
    pub fn expire(&self) -> bool {
        self.transition(&SessionMachineInput::SessionExpired, None)
            .is_ok()
    }

    /// Force `Unauthenticated` from any state.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        if self.is_closed() {
            return;
        }
        let old_phase = SessionPhase::from(inner.machine.state());
        let mut machine = SessionMachine::new();
        let _ = machine.consume(&SessionMachineInput::SessionExpired);
        inner.machine = machine;
        inner.user = None;
        publish(&inner, SessionStatus::Unauthenticated);
        drop(inner);

        if old_phase != SessionPhase::Unauthenticated {
            debug!(old_phase = ?old_phase, "Session state reset");
        }
    }

}

fn publish(inner: &Inner, status: SessionStatus) {
    let Some(tx) = &inner.status_tx else {
        return;
    };
    tx.send_if_modified(|current| {
        if *current == status {
            false
        } else {
            *current = status;
            true
        }
    });

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_status_is_unknown() {
        let state = SessionState::new();
        assert_eq!(state.phase(), SessionPhase::Unknown);
        assert_eq!(state.status(), SessionStatus::Unknown);
        assert!(state.user().is_none());
    }

    #[test]
    fn test_transition_installs_user() {
        let state = SessionState::new();
        let user = SessionUser::new(1, "admin");

        state.transition(&SessionMachineInput::CheckStarted, None).unwrap();
        state
            .transition(&SessionMachineInput::IdentityVerified, Some(user.clone()))
            .unwrap();

        assert_eq!(state.phase(), SessionPhase::Authenticated);
        assert_eq!(state.status(), SessionStatus::Authenticated(user.clone()));
        assert_eq!(state.user(), Some(user));
    }

    #[test]
    fn test_invalid_transition_leaves_state() {
        let state = SessionState::new();
        let err = state
            .transition(&SessionMachineInput::LoginSucceeded, None)
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidStateTransition(_)));
        assert_eq!(state.phase(), SessionPhase::Unknown);
    }

    #[test]
    fn test_expire_clears_user() {
        let state = SessionState::new();
        state.transition(&SessionMachineInput::LoginAttempt, None).unwrap();
        state
            .transition(
                &SessionMachineInput::LoginSucceeded,
                Some(SessionUser::new(1, "admin")),
            )
            .unwrap();

        assert!(state.expire());
        assert_eq!(state.status(), SessionStatus::Unauthenticated);
        assert!(state.user().is_none());
    }

    #[test]
    fn test_expire_ignored_while_logging_out() {
        let state = SessionState::new();
        state.transition(&SessionMachineInput::LogoutRequested, None).unwrap();

        assert!(!state.expire());
        assert_eq!(state.phase(), SessionPhase::LoggingOut);
    }

    #[test]
    fn test_reset_from_any_state() {
        let state = SessionState::new();
        state.transition(&SessionMachineInput::CheckStarted, None).unwrap();

        state.reset();
        assert_eq!(state.phase(), SessionPhase::Unauthenticated);
        assert_eq!(state.status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_subscribers_observe_changes_only() {
        let state = SessionState::new();
        let mut rx = state.subscribe();

        // Unknown -> Validating keeps the public status at Unknown
        state.transition(&SessionMachineInput::CheckStarted, None).unwrap();
        assert!(!rx.has_changed().unwrap());

        state.transition(&SessionMachineInput::NoToken, None).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_close_ends_channel_and_freezes_state() {
        let state = SessionState::new();
        let mut rx = state.subscribe();
        state.transition(&SessionMachineInput::CheckStarted, None).unwrap();
        state.transition(&SessionMachineInput::NoToken, None).unwrap();

        assert!(state.close());
        assert!(!state.close());
        assert!(state.is_closed());

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionStatus::Unauthenticated);
        assert!(rx.changed().await.is_err());

        assert!(matches!(
            state.transition(&SessionMachineInput::LoginAttempt, None),
            Err(SessionError::Closed)
        ));
        assert!(!state.expire());
        state.reset();
        assert_eq!(state.status(), SessionStatus::Unauthenticated);

        let mut late = state.subscribe();
        assert_eq!(*late.borrow(), SessionStatus::Unauthenticated);
        assert!(late.changed().await.is_err());
    }
}
