//! # Conduit Logger
//!
//! Installs the global `tracing` subscriber for a conduit service: a compact
//! console layer, optional rolling log files written through a non-blocking
//! worker, and an `EnvFilter` built from a default level plus per-target
//! directives (falling back to `RUST_LOG`).
//!
//! Services normally call [`Logger::from_config`] with their `logging` section;
//! [`Logger::builder`] covers programmatic setup.
//!
//! ## Example
//!
//! ```rust
//! # use conduit_logger::{LevelFilter, Logger};
//!
//! let _logger = Logger::builder()
//!     .name("sensor-gateway")
//!     .console(true)
//!     .level(LevelFilter::DEBUG)
//!     .filter("conduit_events=trace")
//!     .init()
//!     .unwrap();
//! ```

mod builder;
mod error;

pub use crate::builder::{ConsoleOnly, LoggerBuilder, Named, Unnamed, WithDirectory};
pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use crate::builder::Settings;
use conduit_config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;

/// Handle to the installed subscriber.
///
/// Holds the file writer's [`WorkerGuard`]; buffered records are flushed when the
/// handle is dropped, so keep it alive until shutdown.
#[must_use = "dropping the handle stops the background log writer"]
#[derive(Debug)]
pub struct Logger {
    name: String,
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Starts configuring the global subscriber.
    ///
    /// ```rust
    /// use conduit_logger::{LevelFilter, Logger};
    ///
    /// let _builder = Logger::builder().name("hub").level(LevelFilter::WARN);
    /// ```
    #[must_use = "the builder does nothing until `init` is called"]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Installs the global subscriber described by the `logging` section of the
    /// service configuration. Rolling files rotate daily.
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown level, a bad
    /// filter, an empty name, no enabled output, or zero `max_files` alongside a
    /// directory. Otherwise fails like [`LoggerBuilder::init`].
    pub fn from_config(config: &LoggingConfig) -> Result<Self, LoggerError> {
        builder::install(config.name.clone(), Settings::try_from(config)?)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file writer guard, present only when a directory was configured.
    #[must_use]
    pub const fn guard(&self) -> Option<&WorkerGuard> {
        self.guard.as_ref()
    }

    /// Whether records are also written to rolling files.
    #[must_use]
    pub const fn writes_files(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!(logger = %self.name, "Logging shutting down, flushing file output");
        }
    }
}

/// Parses a level name such as `"info"` or `"TRACE"`; `"off"` disables output.
///
/// # Errors
/// Returns [`LoggerError::InvalidConfiguration`] for unknown names.
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggerError> {
    level.trim().parse::<LevelFilter>().map_err(|e| LoggerError::InvalidConfiguration {
        message: format!("unknown level '{level}': {e}").into(),
        context: None,
    })
}
