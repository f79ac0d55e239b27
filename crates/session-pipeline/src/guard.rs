//! Route guard for views that require a logged-in user.
//!
//! A [`RouteGuard`] wraps a render callback. Each evaluation maps the current
//! [`SessionStatus`] to a [`GuardView`]:
//!
//! - `Unknown`: [`GuardView::Loading`], no redirect
//! - `Authenticated`: the callback runs with the user
//! - `Unauthenticated`: the [`Navigator`] is asked to go to the login surface
//!   once per entry into that status, and nothing renders
//!
//! The guard follows the session's status channel, so callers re-evaluate
//! after [`RouteGuard::changed`] instead of only at mount.

use crate::auth_fsm::SessionStatus;
use crate::session::Session;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use token_store::SessionUser;
use tokio::sync::watch;
use tracing::debug;

/// Where an unauthenticated visitor is sent.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Result of evaluating a guard.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardView<T> {
    /// Session still resolving; show a placeholder.
    Loading,
    /// Authenticated; the wrapped view's output.
    Render(T),
    /// Sent to login; render nothing.
    Redirect,
}

impl<T> GuardView<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, GuardView::Loading)
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, GuardView::Redirect)
    }

    pub fn into_rendered(self) -> Option<T> {
        match self {
            GuardView::Render(value) => Some(value),
            _ => None,
        }
    }
}

/// Shared flag telling async work whether its view is still mounted.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Keep `value` only if the view is still mounted.
    pub fn accept<T>(&self, value: T) -> Option<T> {
        if self.is_alive() {
            Some(value)
        } else {
            debug!("Discarding result for unmounted view");
            None
        }
    }
}

/// Guard around a render callback.
pub struct RouteGuard<F> {
    status_rx: watch::Receiver<SessionStatus>,
    navigator: Arc<dyn Navigator>,
    render: F,
    redirected: bool,
    alive: Arc<AtomicBool>,
}

/// Wrap `render` so it only runs for an authenticated session.
pub fn with_auth_required<T, F>(
    session: &Session,
    navigator: Arc<dyn Navigator>,
    render: F,
) -> RouteGuard<F>
where
    F: FnMut(&SessionUser) -> T,
{
    RouteGuard {
        status_rx: session.subscribe(),
        navigator,
        render,
        redirected: false,
        alive: Arc::new(AtomicBool::new(true)),
    }
}

impl<T, F> RouteGuard<F>
where
    F: FnMut(&SessionUser) -> T,
{
    /// Map the current status to a view.
    pub fn evaluate(&mut self) -> GuardView<T> {
        let status = self.status_rx.borrow_and_update().clone();

        match status {
            SessionStatus::Unknown => {
                self.redirected = false;
                GuardView::Loading
            }
            SessionStatus::Authenticated(user) => {
                self.redirected = false;
                GuardView::Render((self.render)(&user))
            }
            SessionStatus::Unauthenticated => {
                if !self.redirected {
                    self.redirected = true;
                    debug!("Unauthenticated, redirecting to login");
                    self.navigator.redirect_to_login();
                }
                GuardView::Redirect
            }
        }
    }

    /// Wait for the next status change. Returns false once the session is
    /// gone and no further changes can arrive.
    pub async fn changed(&mut self) -> bool {
        self.status_rx.changed().await.is_ok()
    }

    /// Wait for a status change and evaluate again.
    pub async fn next(&mut self) -> Option<GuardView<T>> {
        if self.changed().await {
            Some(self.evaluate())
        } else {
            None
        }
    }

    /// Evaluate, waiting out `Loading` until the session resolves.
    pub async fn resolve(&mut self) -> GuardView<T> {
        loop {
            let view = self.evaluate();
            if !view.is_loading() || !self.changed().await {
                return view;
            }
        }
    }

    pub fn liveness(&self) -> Liveness {
        Liveness(self.alive.clone())
    }
}

impl<F> Drop for RouteGuard<F> {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use parking_lot::Mutex;
    use token_store::create_memory_token_store;
    use url::Url;

    #[derive(Default)]
    struct RecordingNavigator {
        redirects: Mutex<usize>,
    }

    impl Navigator for RecordingNavigator {
        fn redirect_to_login(&self) {
            *self.redirects.lock() += 1;
        }
    }

    fn session() -> Session {
        Session::new(
            Url::parse("http://school.test/api/").unwrap(),
            Arc::new(MockTransport::new()),
            Arc::new(create_memory_token_store()),
        )
    }

    #[test]
    fn test_loading_while_unknown() {
        let session = session();
        let navigator = Arc::new(RecordingNavigator::default());
        let mut guard = with_auth_required(&session, navigator.clone(), |user| user.id);

        assert_eq!(guard.evaluate(), GuardView::Loading);
        assert_eq!(*navigator.redirects.lock(), 0);
    }

    #[tokio::test]
    async fn test_redirects_once_per_entry() {
        let session = session();
        let navigator = Arc::new(RecordingNavigator::default());
        let mut guard = with_auth_required(&session, navigator.clone(), |user| user.id);

        session.check_auth().await.unwrap();

        assert_eq!(guard.evaluate(), GuardView::Redirect);
        assert_eq!(guard.evaluate(), GuardView::Redirect);
        assert_eq!(*navigator.redirects.lock(), 1);
    }

    #[test]
    fn test_liveness_flips_on_drop() {
        let session = session();
        let guard = with_auth_required(
            &session,
            Arc::new(RecordingNavigator::default()),
            |user: &SessionUser| user.id,
        );
        let liveness = guard.liveness();

        assert_eq!(liveness.accept(1), Some(1));
        drop(guard);
        assert!(!liveness.is_alive());
        assert_eq!(liveness.accept(1), None);
    }

    #[test]
    fn test_guard_view_helpers() {
        assert!(GuardView::<()>::Loading.is_loading());
        assert!(GuardView::<()>::Redirect.is_redirect());
        assert_eq!(GuardView::Render(3).into_rendered(), Some(3));
        assert_eq!(GuardView::<i32>::Redirect.into_rendered(), None);
    }
}
