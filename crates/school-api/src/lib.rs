//! Typed School Portal API.
//!
//! Thin wrappers over [`session_pipeline::ApiClient::send`], grouped the way
//! the backend groups its routes:
//! - [`AuthApi`] for `/auth/*` account calls
//! - [`PublicApi`] for the public pages and student self-registration
//! - [`AdminApi`] for the dashboard, CRUD over each [`Resource`], and
//!   registration review
//!
//! Every call goes through the session's executor, so admin calls pick up
//! token refresh and session expiry for free.

mod admin;
mod auth;
mod models;
mod public;
mod query;

pub use admin::AdminApi;
pub use auth::AuthApi;
pub use models::{DashboardStats, Page, Resource};
pub use public::PublicApi;
pub use query::ListQuery;

use session_pipeline::{ApiClient, Session};

/// Entry point to the typed endpoints.
#[derive(Clone)]
pub struct SchoolApi {
    client: ApiClient,
}

impl SchoolApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn for_session(session: &Session) -> Self {
        Self::new(session.api().clone())
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(&self.client)
    }

    pub fn public(&self) -> PublicApi<'_> {
        PublicApi::new(&self.client)
    }

    pub fn admin(&self) -> AdminApi<'_> {
        AdminApi::new(&self.client)
    }
}
