//! Structured logging setup.
//!
//! The library only emits `tracing` events under the `iocsh_wrap` target;
//! hosts that want to see them install a subscriber, either their own or the
//! one built here. The filter comes from `IOCSH_WRAP_LOG` (same syntax as
//! `RUST_LOG`) and falls back to the configured level.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::filter::{Directive, EnvFilter, LevelFilter, ParseError};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{Layer, fmt, layer::SubscriberExt};

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "IOCSH_WRAP_LOG";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human-oriented output
    Pretty,
    /// One line per event
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level used when the environment sets no filter
    pub level: Level,
    pub format: LogFormat,
    /// Extra directives, e.g. `"iocsh_wrap=trace"`
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::Compact,
            filter: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// The filter this configuration installs.
    pub fn build_filter(&self) -> Result<EnvFilter, LogInitError> {
        let mut filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.level).into())
            .with_env_var(LOG_ENV)
            .from_env_lossy();
        if let Some(extra) = &self.filter {
            for directive in extra.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                let directive: Directive = directive.parse()?;
                filter = filter.add_directive(directive);
            }
        }
        Ok(filter)
    }
}

#[derive(Debug, Error)]
pub enum LogInitError {
    #[error("invalid log filter directive: {0}")]
    InvalidDirective(#[from] ParseError),

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Install a stderr subscriber for `config`.
pub fn init(config: &LogConfig) -> Result<(), LogInitError> {
    let filter = config.build_filter()?;
    let layer = match config.format {
        LogFormat::Pretty => fmt::layer().with_writer(std::io::stderr).pretty().boxed(),
        LogFormat::Compact => fmt::layer().with_writer(std::io::stderr).compact().boxed(),
    };
    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = LogConfig::new();
        assert_eq!(config.level, Level::WARN);
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.filter.is_none());
    }

    #[test]
    fn builder_methods() {
        let config = LogConfig::new()
            .with_level(Level::DEBUG)
            .with_format(LogFormat::Pretty)
            .with_filter("iocsh_wrap=trace");
        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.build_filter().is_ok());
    }

    #[test]
    fn bad_directive_is_an_error() {
        let config = LogConfig::new().with_filter("iocsh_wrap=notalevel");
        let err = config.build_filter().unwrap_err();
        assert!(err.to_string().contains("invalid log filter directive"));
    }
}
