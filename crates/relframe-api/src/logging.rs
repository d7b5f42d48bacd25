//! Logging configuration for relframe
//!
//! Structured logging through the `tracing` framework, with level filtering,
//! pretty or compact output and daily-rotated log files.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output destination
#[derive(Debug, Clone)]
pub enum LogOutput {
    /// Output to stdout
    Stdout,
    /// Output to a file with rotation
    File(PathBuf),
    /// Output to both stdout and file
    Both(PathBuf),
}

/// Log format style
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Errors raised while installing the global subscriber
#[derive(Error, Debug)]
pub enum LogError {
    /// The level string is not a valid filter directive
    #[error("Invalid log filter: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),

    /// A global subscriber is already installed
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level filter, `RUST_LOG` takes precedence
    pub level: String,
    /// Output destination
    pub output: LogOutput,
    /// Format style
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: LogOutput::Stdout,
            format: LogFormat::Pretty,
        }
    }
}

impl LogConfig {
    /// Create config with info level and stdout output
    pub fn info() -> Self {
        Self::default()
    }

    /// Create config with debug level, which logs every filter stage
    pub fn debug() -> Self {
        Self {
            level: "debug".to_string(),
            ..Default::default()
        }
    }

    /// Create config with trace level, which also logs every join step
    pub fn trace() -> Self {
        Self {
            level: "trace".to_string(),
            ..Default::default()
        }
    }

    /// Set log output to file with rotation
    pub fn with_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = LogOutput::File(path.into());
        self
    }

    /// Set log output to both stdout and file
    pub fn with_both<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = LogOutput::Both(path.into());
        self
    }

    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set log level filter
    pub fn with_level<S: Into<String>>(mut self, level: S) -> Self {
        self.level = level.into();
        self
    }

    /// Install this configuration as the global subscriber.
    ///
    /// Returns a guard for file output that must be kept alive for buffered
    /// lines to be flushed.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use relframe::logging::LogConfig;
    ///
    /// let _guard = LogConfig::debug().init()?;
    /// # Ok::<(), relframe::logging::LogError>(())
    /// ```
    pub fn init(self) -> Result<Option<WorkerGuard>, LogError> {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&self.level)?,
        };

        match self.output {
            LogOutput::Stdout => {
                match self.format {
                    LogFormat::Pretty => tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().pretty())
                        .try_init()?,
                    LogFormat::Compact => tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().compact())
                        .try_init()?,
                }
                Ok(None)
            }
            LogOutput::File(path) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(rolling_file(&path));
                match self.format {
                    LogFormat::Pretty => tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().with_writer(non_blocking).with_ansi(false).pretty())
                        .try_init()?,
                    LogFormat::Compact => tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().with_writer(non_blocking).with_ansi(false).compact())
                        .try_init()?,
                }
                Ok(Some(guard))
            }
            LogOutput::Both(path) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(rolling_file(&path));
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().compact())
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false).compact())
                    .try_init()?;
                Ok(Some(guard))
            }
        }
    }
}

fn rolling_file(path: &Path) -> tracing_appender::rolling::RollingFileAppender {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("relframe.log");
    tracing_appender::rolling::daily(dir, file)
}
