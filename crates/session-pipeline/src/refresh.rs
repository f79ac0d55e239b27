//! Single-flight access token refresh.
//!
//! At most one `POST /auth/refresh` is in flight per burst. Callers arriving
//! while an exchange is running attach to the same shared future and all
//! observe its outcome. The slot is cleared once the exchange settles, so
//! the next burst starts a fresh one.

use crate::error::RefreshFailure;
use crate::transport::{HttpRequest, HttpTransport};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use reqwest::Method;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use token_store::TokenStore;
use tracing::{debug, info, warn};
use url::Url;

type RefreshFuture = Shared<BoxFuture<'static, Result<String, RefreshFailure>>>;

#[derive(Debug, Deserialize)]
struct RefreshEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<RefreshData>,
}

#[derive(Debug, Deserialize)]
struct RefreshData {
    access_token: String,
}

/// Exchanges the stored refresh token for a new access token.
pub struct TokenRefresher {
    transport: Arc<dyn HttpTransport>,
    store: Arc<TokenStore>,
    refresh_url: Url,
    /// In-flight exchange tagged with its generation.
    in_flight: Mutex<Option<(u64, RefreshFuture)>>,
    next_generation: AtomicU64,
}

impl TokenRefresher {
    pub fn new(transport: Arc<dyn HttpTransport>, store: Arc<TokenStore>, api_root: &Url) -> Self {
        let refresh_url = api_root
            .join("auth/refresh")
            .unwrap_or_else(|_| api_root.clone());
        Self {
            transport,
            store,
            refresh_url,
            in_flight: Mutex::new(None),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Refresh the access token, joining an exchange already in flight.
    ///
    /// On success the new token is committed to the store before this
    /// returns. On failure the store is left untouched.
    pub async fn refresh(&self) -> Result<String, RefreshFailure> {
        let (generation, shared, joined) = {
            let mut slot = self.in_flight.lock();
            match slot.as_ref() {
                Some((generation, shared)) => (*generation, shared.clone(), true),
                None => {
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                    let shared = exchange(
                        self.transport.clone(),
                        self.store.clone(),
                        self.refresh_url.clone(),
                    )
                    .boxed()
                    .shared();
                    *slot = Some((generation, shared.clone()));
                    (generation, shared, false)
                }
            }
        };

        if joined {
            debug!(generation, "Joining in-flight token refresh");
        }

        let outcome = shared.await;

        let mut slot = self.in_flight.lock();
        if matches!(slot.as_ref(), Some((current, _)) if *current == generation) {
            *slot = None;
        }

        outcome
    }

    /// Refresh after `rejected` was refused with a 401.
    ///
    /// If the stored access token already differs from the rejected one,
    /// another request renewed it in the meantime and it is returned without
    /// a new exchange.
    pub async fn refresh_rejected(&self, rejected: Option<&str>) -> Result<String, RefreshFailure> {
        if let Some(current) = self.store.access_token() {
            if rejected != Some(current.as_str()) {
                debug!("Access token already renewed by a concurrent request");
                return Ok(current);
            }
        }
        self.refresh().await
    }

    /// Whether an exchange is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    /// Forget the in-flight exchange so later callers start afresh.
    /// Callers already waiting on it still get its outcome.
    pub fn cancel(&self) -> bool {
        let dropped = self.in_flight.lock().take();
        if let Some((generation, _)) = &dropped {
            debug!(generation, "Dropped in-flight token refresh");
        }
        dropped.is_some()
    }
}

async fn exchange(
    transport: Arc<dyn HttpTransport>,
    store: Arc<TokenStore>,
    url: Url,
) -> Result<String, RefreshFailure> {
    let refresh_token = store.refresh_token().ok_or_else(|| {
        debug!("No refresh token stored, skipping refresh");
        RefreshFailure::NoRefreshToken
    })?;

    info!("Refreshing access token");

    let response = transport
        .execute(HttpRequest {
            method: Method::POST,
            url,
            bearer: Some(refresh_token),
            headers: Vec::new(),
            body: None,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "Token refresh request failed");
            RefreshFailure::Transport(e.to_string())
        })?;

    if !response.status.is_success() {
        warn!(status = %response.status, "Token refresh rejected");
        return Err(RefreshFailure::Rejected {
            status: response.status,
        });
    }

    let envelope: RefreshEnvelope = serde_json::from_str(&response.body)
        .map_err(|e| RefreshFailure::Malformed(e.to_string()))?;

    if envelope.success == Some(false) {
        warn!(status = %response.status, "Token refresh returned success: false");
        return Err(RefreshFailure::Rejected {
            status: response.status,
        });
    }

    let access_token = envelope
        .data
        .map(|data| data.access_token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| RefreshFailure::Malformed("missing access_token".to_string()))?;

    store.set_access_token(&access_token);
    info!("Access token refreshed");

    Ok(access_token)
}
