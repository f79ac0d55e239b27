//! Storage key constants.

/// Storage keys used by the client
pub struct StorageKeys;

impl StorageKeys {
    /// Bearer access token
    pub const ACCESS_TOKEN: &'static str = "access_token";

    /// Refresh token, presented only to the refresh endpoint
    pub const REFRESH_TOKEN: &'static str = "refresh_token";

    /// Cached session user (JSON)
    pub const USER: &'static str = "user";

    /// Theme preference ("light" or "dark")
    pub const THEME: &'static str = "theme";
}
