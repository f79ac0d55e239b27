//! Logging initialization for client binaries.
//!
//! Thin wrapper over the observability crate so binaries configure logging
//! from [`Config`](crate::Config) and [`Paths`](crate::Paths) in one call.

use observability::LogConfig;
use std::path::PathBuf;

/// Initialize the logging system.
///
/// * `service_name` - Included in every structured log line
/// * `level` - Default level; `RUST_LOG` takes precedence when set
/// * `log_file` - When set, structured JSONL is appended there as well
///
/// ```ignore
/// init_logging("cli", &config.log_level, Some(paths.log_file()));
/// tracing::info!("started");
/// ```
pub fn init_logging(service_name: &str, level: &str, log_file: Option<PathBuf>) {
    let also_stderr = log_file.is_none()
        || std::env::var("SCHOOL_PORTAL_LOG_STDERR")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: parse_level(level).to_string().to_lowercase(),
        log_path: log_file,
        also_stderr,
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_all_variants() {
        assert_eq!(parse_level("trace"), tracing::Level::TRACE);
        assert_eq!(parse_level("debug"), tracing::Level::DEBUG);
        assert_eq!(parse_level("info"), tracing::Level::INFO);
        assert_eq!(parse_level("warn"), tracing::Level::WARN);
        assert_eq!(parse_level("warning"), tracing::Level::WARN);
        assert_eq!(parse_level("error"), tracing::Level::ERROR);
    }

    #[test]
    fn parse_level_case_insensitive() {
        assert_eq!(parse_level("TRACE"), tracing::Level::TRACE);
        assert_eq!(parse_level(" Debug "), tracing::Level::DEBUG);
        assert_eq!(parse_level("WARNING"), tracing::Level::WARN);
    }

    #[test]
    fn parse_level_unknown_defaults_to_info() {
        assert_eq!(parse_level(""), tracing::Level::INFO);
        assert_eq!(parse_level("verbose"), tracing::Level::INFO);
    }

    #[test]
    fn level_display_is_accepted_by_env_filter_syntax() {
        assert_eq!(parse_level("warn").to_string().to_lowercase(), "warn");
    }
}
