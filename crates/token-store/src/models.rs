//! Values persisted by the session pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Access/refresh token pair. Both are opaque bearer strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Cached projection of the authenticated identity.
///
/// Fields the client does not know about are kept in `extra` so a cached
/// user round-trips without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionUser {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            full_name: None,
            email: None,
            role: None,
            extra: Map::new(),
        }
    }

    /// Name to show in UI chrome: full name when known, else the username.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_user_minimal_payload() {
        let user: SessionUser =
            serde_json::from_value(serde_json::json!({"id": 1, "username": "admin"})).unwrap();
        assert_eq!(user, SessionUser::new(1, "admin"));
    }

    #[test]
    fn test_session_user_keeps_unknown_fields() {
        let raw = serde_json::json!({
            "id": 7,
            "username": "jdoe",
            "full_name": "Jane Doe",
            "email": "jane@school.test",
            "role": "admin",
            "is_active": true,
            "last_login": "2024-09-01 08:00:00"
        });

        let user: SessionUser = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(user.extra.get("is_active"), Some(&Value::Bool(true)));
        assert_eq!(serde_json::to_value(&user).unwrap(), raw);
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        let mut user = SessionUser::new(1, "admin");
        assert_eq!(user.display_name(), "admin");

        user.full_name = Some("  ".to_string());
        assert_eq!(user.display_name(), "admin");

        user.full_name = Some("Site Admin".to_string());
        assert_eq!(user.display_name(), "Site Admin");
    }
}
