//! # Observability
//!
//! Logging setup shared by School Portal binaries.
//!
//! Binaries call [`init`] or [`init_with_config`] once at startup and use the
//! standard `tracing` macros everywhere else. Libraries never install a
//! subscriber themselves.
//!
//! Two sinks are available:
//!
//! - compact human-readable output on stderr, filtered by `RUST_LOG` or the
//!   configured default level
//! - structured JSONL appended to a log file, one [`LogEntry`] per line, with
//!   credential-looking fields redacted
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "cli".into(),
//!         default_level: "debug".into(),
//!         log_path: Some(paths.log_file()),
//!         ..Default::default()
//!     });
//!     tracing::info!("ready");
//! }
//! ```

mod file;
mod json_layer;

use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use file::{CentralLogWriter, WriterFactory};
pub use json_layer::{redact_fields, JsonLayer, LogEntry};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "cli"). Included in every JSON log line.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Structured JSONL output file. `None` disables the file sink.
    pub log_path: Option<PathBuf>,

    /// Also emit compact logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: true,
        }
    }
}

/// Initialize logging to stderr only.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// A second call in the same process is a no-op. If the log file cannot be
/// opened the file sink is skipped and a warning goes to stderr, through the
/// stderr layer when there is one and straight to the terminal otherwise.
pub fn init_with_config(config: LogConfig) {
    let env_filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level))
    };

    let mut file_error = None;
    let json_layer = config.log_path.as_ref().and_then(|path| {
        match CentralLogWriter::new(path) {
            Ok(writer) => Some(
                JsonLayer::new(config.service_name.clone(), WriterFactory::new(writer))
                    .with_filter(env_filter()),
            ),
            Err(e) => {
                file_error = Some((path.clone(), e));
                None
            }
        }
    });

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(env_filter())
    });

    let has_stderr = stderr_layer.is_some();
    let installed = tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if !installed {
        return;
    }

    match (file_error, &config.log_path) {
        (Some((path, e)), _) if has_stderr => {
            tracing::warn!(log_path = %path.display(), error = %e, "could not open log file");
        }
        (Some((path, e)), _) => {
            eprintln!("{}", file_error_message(&path, &e));
        }
        (None, Some(path)) => {
            tracing::debug!(log_path = %path.display(), "observability initialized");
        }
        (None, None) => {}
    }
}

fn file_error_message(path: &Path, e: &io::Error) -> String {
    format!(
        "warning: could not open log file {}: {}; file logging disabled",
        path.display(),
        e
    )
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "unknown");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(config.also_stderr);
    }

    #[test]
    fn test_file_error_message_names_path_and_cause() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
        let message = file_error_message(Path::new("/var/log/cli.jsonl"), &err);
        assert_eq!(
            message,
            "warning: could not open log file /var/log/cli.jsonl: permission denied; file logging disabled"
        );
    }

    #[test]
    fn test_unwritable_log_path_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        init_with_config(LogConfig {
            service_name: "test".into(),
            log_path: Some(blocker.join("cli.jsonl")),
            also_stderr: false,
            ..Default::default()
        });
    }
}
