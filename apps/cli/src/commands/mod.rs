//! CLI command implementations.

mod auth;
mod resources;
mod theme;

pub use auth::{change_password, login, logout, status, whoami};
pub use resources::{
    dashboard, delete, list, list_registrations, registration_review, show, ListArgs, ReviewAction,
};
pub use theme::{theme, ThemeAction};

use anyhow::Result;
use client_config::{Config, Paths};
use school_api::SchoolApi;
use session_pipeline::{create_session, with_auth_required, ApiError, GuardView, Navigator, Session};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use token_store::{create_file_token_store, SessionUser};
use tracing::debug;

pub const LOGIN_HINT: &str = "Not logged in. Run `school-portal login`.";

/// Raised after the login hint has been printed; `main` exits non-zero
/// without printing again.
#[derive(Debug, Error)]
#[error("{}", LOGIN_HINT)]
pub struct NotLoggedIn;

/// Everything a command needs.
pub struct Context {
    pub paths: Paths,
    pub session: Session,
    pub api: SchoolApi,
}

impl Context {
    pub fn open(paths: Paths, config: &Config) -> Result<Self> {
        let store = create_file_token_store(paths.storage_file());
        let session = create_session(config, store)?;
        let api = SchoolApi::for_session(&session);
        debug!(api_root = %session.api().api_root(), "Session ready");
        Ok(Self {
            paths,
            session,
            api,
        })
    }
}

/// Terminal stand-in for the login page.
struct LoginHint;

impl Navigator for LoginHint {
    fn redirect_to_login(&self) {
        eprintln!("{}", LOGIN_HINT);
    }
}

/// Run `body` for a logged-in user only.
///
/// The startup check runs first; an unauthenticated session prints the
/// login hint instead of running the body. A session that expires while
/// the body runs is reported the same way.
pub async fn guarded<T, F, Fut>(ctx: &Context, body: F) -> Result<T>
where
    F: FnOnce(SessionUser) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut guard = with_auth_required(&ctx.session, Arc::new(LoginHint), SessionUser::clone);
    ctx.session.check_auth().await?;

    let user = match guard.resolve().await {
        GuardView::Render(user) => user,
        GuardView::Loading | GuardView::Redirect => return Err(NotLoggedIn.into()),
    };

    match body(user).await {
        Ok(value) => Ok(value),
        Err(ApiError::AuthExpired) => {
            guard.evaluate();
            Err(NotLoggedIn.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// The logged-in user, as verified by the startup check.
pub async fn current_user(ctx: &Context) -> Result<SessionUser> {
    guarded(ctx, |user| async move { Ok(user) }).await
}
