//! Theme preference command.

use super::Context;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::ValueEnum;
use serde_json::json;
use view_state::{Theme, ThemePreference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeAction {
    Light,
    Dark,
    Toggle,
    /// Forget the explicit choice and follow the system
    System,
}

/// Read or change the persisted theme. Without an action, prints it.
pub fn theme(ctx: &Context, action: Option<ThemeAction>, format: OutputFormat) -> Result<()> {
    let prefers_dark = system_prefers_dark();
    let preference = ThemePreference::load(ctx.session.store().clone(), prefers_dark);

    match action {
        Some(ThemeAction::Light) => preference.set(Theme::Light),
        Some(ThemeAction::Dark) => preference.set(Theme::Dark),
        Some(ThemeAction::Toggle) => {
            preference.toggle();
        }
        Some(ThemeAction::System) => preference.clear(prefers_dark),
        None => {}
    }

    let current = preference.current();
    let source = if preference.is_explicit() { "chosen" } else { "system" };
    match format {
        OutputFormat::Text => println!("Theme: {} ({})", current, source),
        OutputFormat::Json => output::print_json(&json!({"theme": current, "source": source})),
    }
    Ok(())
}

/// Best guess at the terminal's color scheme. `COLORFGBG` is "fg;bg" with
/// ANSI color numbers; a dark background is 0-6 or 8.
fn system_prefers_dark() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|value| value.rsplit(';').next()?.trim().parse::<u8>().ok())
        .map(|bg| matches!(bg, 0..=6 | 8))
        .unwrap_or(true)
}
