//! Pipeline progress logging.
//!
//! Progress goes to stderr through `tracing`, so stdout only carries the
//! report itself. The `log_*` helpers keep call sites short.

use tracing::Level;

/// Log level for progress lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Install the stderr subscriber. Call once from the binary.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Emit one progress line at the given level
pub fn log(level: LogLevel, message: &str) {
    match level {
        LogLevel::Info => tracing::info!("{}", message),
        LogLevel::Success => tracing::info!(status = "ok", "{}", message),
        LogLevel::Warning => tracing::warn!("{}", message),
        LogLevel::Error => tracing::error!("{}", message),
    }
}

pub fn log_info(message: impl Into<String>) {
    log(LogLevel::Info, &message.into());
}

pub fn log_success(message: impl Into<String>) {
    log(LogLevel::Success, &message.into());
}

pub fn log_warning(message: impl Into<String>) {
    log(LogLevel::Warning, &message.into());
}

pub fn log_error(message: impl Into<String>) {
    log(LogLevel::Error, &message.into());
}
