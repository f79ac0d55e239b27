//! Tolerant, typed facade over a [`KeyValueStorage`] backend.
//!
//! Every operation here is infallible from the caller's point of view:
//! backend failures are logged and behave like a cache miss, and stored
//! values that no longer deserialize are treated as absent.

use crate::{KeyValueStorage, SessionUser, StorageKeys, TokenPair};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Session token store.
pub struct TokenStore {
    storage: Box<dyn KeyValueStorage>,
}

impl TokenStore {
    /// Create a new token store with the given storage backend
    pub fn new(storage: Box<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Read and deserialize a value. Missing, unreadable, or malformed
    /// entries all come back as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Storage read failed, treating as missing");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "Stored value is malformed, treating as missing");
                None
            }
        }
    }

    /// Serialize and write a value. Failures are logged and dropped.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key, error = %e, "Could not encode value for storage");
                return;
            }
        };

        if let Err(e) = self.storage.set(key, &encoded) {
            warn!(key, error = %e, "Storage write failed");
        }
    }

    /// Remove a value. Failures are logged and dropped.
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.storage.delete(key) {
            warn!(key, error = %e, "Storage delete failed");
        }
    }

    // ==========================================
    // Session tokens
    // ==========================================

    pub fn access_token(&self) -> Option<String> {
        self.get::<String>(StorageKeys::ACCESS_TOKEN)
            .filter(|token| !token.is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get::<String>(StorageKeys::REFRESH_TOKEN)
            .filter(|token| !token.is_empty())
    }

    /// Overwrite only the access token. The refresh token is not rotated.
    pub fn set_access_token(&self, token: &str) {
        self.set(StorageKeys::ACCESS_TOKEN, token);
    }

    pub fn set_token_pair(&self, pair: &TokenPair) {
        self.set(StorageKeys::ACCESS_TOKEN, &pair.access_token);
        self.set(StorageKeys::REFRESH_TOKEN, &pair.refresh_token);
    }

    // ==========================================
    // Cached identity
    // ==========================================

    pub fn cached_user(&self) -> Option<SessionUser> {
        self.get(StorageKeys::USER)
    }

    pub fn set_cached_user(&self, user: &SessionUser) {
        self.set(StorageKeys::USER, user);
    }

    /// Remove the token pair and the cached user.
    pub fn clear_session(&self) {
        self.remove(StorageKeys::ACCESS_TOKEN);
        self.remove(StorageKeys::REFRESH_TOKEN);
        self.remove(StorageKeys::USER);
        debug!("Cleared session from storage");
    }

    /// True when neither token nor a cached user is stored.
    pub fn is_session_empty(&self) -> bool {
        self.access_token().is_none() && self.refresh_token().is_none() && self.cached_user().is_none()
    }
}
