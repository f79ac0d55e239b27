//! Light/dark theme preference.
//!
//! The choice lives under [`StorageKeys::THEME`] in the same store as the
//! session. A stored value is an explicit choice and always wins; without
//! one the theme follows whatever the system reports.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use token_store::{StorageKeys, TokenStore};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn from_system(prefers_dark: bool) -> Self {
        if prefers_dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown theme: {0} (expected light or dark)")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(UnknownTheme(other.to_string())),
        }
    }
}

/// The active theme and whether the user picked it.
pub struct ThemePreference {
    store: Arc<TokenStore>,
    current: Mutex<Theme>,
}

impl ThemePreference {
    /// Resolve the startup theme: stored choice first, then the system.
    pub fn load(store: Arc<TokenStore>, prefers_dark: bool) -> Self {
        let current = match store.get::<Theme>(StorageKeys::THEME) {
            Some(stored) => stored,
            None => Theme::from_system(prefers_dark),
        };
        debug!(theme = %current, "Theme resolved");
        Self {
            store,
            current: Mutex::new(current),
        }
    }

    pub fn current(&self) -> Theme {
        *self.current.lock()
    }

    /// True once the user has chosen a theme.
    pub fn is_explicit(&self) -> bool {
        self.store.get::<Theme>(StorageKeys::THEME).is_some()
    }

    /// Apply and persist an explicit choice.
    pub fn set(&self, theme: Theme) {
        *self.current.lock() = theme;
        self.store.set(StorageKeys::THEME, &theme);
        debug!(theme = %theme, "Theme set");
    }

    /// Flip between light and dark, persisting the result.
    pub fn toggle(&self) -> Theme {
        let next = self.current().toggled();
        self.set(next);
        next
    }

    /// Track a system preference change. Ignored after an explicit choice.
    /// Returns whether the active theme was updated.
    pub fn follow_system(&self, prefers_dark: bool) -> bool {
        if self.is_explicit() {
            return false;
        }
        let theme = Theme::from_system(prefers_dark);
        let mut current = self.current.lock();
        let changed = *current != theme;
        *current = theme;
        changed
    }

    /// Forget the explicit choice and fall back to the system.
    pub fn clear(&self, prefers_dark: bool) {
        self.store.remove(StorageKeys::THEME);
        *self.current.lock() = Theme::from_system(prefers_dark);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use token_store::create_memory_token_store;

    fn store() -> Arc<TokenStore> {
        Arc::new(create_memory_token_store())
    }

    #[test]
    fn test_startup_uses_system_without_stored_choice() {
        let theme = ThemePreference::load(store(), true);
        assert_eq!(theme.current(), Theme::Dark);
        assert!(!theme.is_explicit());
    }

    #[test]
    fn test_stored_choice_wins_over_system() {
        let store = store();
        store.set(StorageKeys::THEME, &Theme::Light);

        let theme = ThemePreference::load(store, true);
        assert_eq!(theme.current(), Theme::Light);
        assert!(!theme.follow_system(true));
        assert_eq!(theme.current(), Theme::Light);
    }

    #[test]
    fn test_toggle_persists() {
        let store = store();
        let theme = ThemePreference::load(store.clone(), false);

        assert_eq!(theme.toggle(), Theme::Dark);
        assert_eq!(store.get::<Theme>(StorageKeys::THEME), Some(Theme::Dark));

        let reloaded = ThemePreference::load(store, false);
        assert_eq!(reloaded.current(), Theme::Dark);
    }

    #[test]
    fn test_follow_system_until_explicit() {
        let theme = ThemePreference::load(store(), false);
        assert!(theme.follow_system(true));
        assert_eq!(theme.current(), Theme::Dark);
        assert!(!theme.follow_system(true));

        theme.set(Theme::Light);
        assert!(!theme.follow_system(true));
        assert_eq!(theme.current(), Theme::Light);

        theme.clear(true);
        assert_eq!(theme.current(), Theme::Dark);
        assert!(!theme.is_explicit());
    }

    #[test]
    fn test_unreadable_stored_theme_falls_back_to_system() {
        let store = store();
        store.set(StorageKeys::THEME, "sepia");

        let theme = ThemePreference::load(store, true);
        assert_eq!(theme.current(), Theme::Dark);
    }

    #[test]
    fn test_parse() {
        assert_eq!(" Dark ".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!(
            "sepia".parse::<Theme>(),
            Err(UnknownTheme("sepia".to_string()))
        );
        assert_eq!(Theme::Light.to_string(), "light");
    }
}
