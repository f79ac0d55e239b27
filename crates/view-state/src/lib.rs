//! View state shared by School Portal front ends.
//!
//! - [`ThemePreference`]: light/dark choice persisted next to the session
//! - [`ToastQueue`]: short-lived notifications removed on a timer

mod theme;
mod toast;

pub use theme::{Theme, ThemePreference, UnknownTheme};
pub use toast::{Toast, ToastKind, ToastQueue, DEFAULT_TOAST_DURATION};
