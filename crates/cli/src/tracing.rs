//! Log setup for the `monochart` binary.
//!
//! Stdout belongs to command output (paths, JSON), so every log line is written
//! to stderr. Colors are only emitted when stderr is a terminal.

use crate::errors::CliError;
use std::io::{self, IsTerminal};
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Log line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Multi-line, with source locations
    Pretty,
    /// One line per event
    Compact,
    /// Newline-delimited JSON objects
    Json,
}

/// Most verbose level shown for monochart's own targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Filter directive used when `RUST_LOG` is unset.
    ///
    /// Only the binary and the library are raised; dependencies stay at `warn`.
    fn directive(self) -> String {
        let level = self.as_str();
        format!("warn,monochart={level},monochart_workspaces={level}")
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG`, when set and valid, replaces the directive derived from `level`.
pub fn init(level: LogLevel, format: LogFormat) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.directive()))
        .map_err(|e| CliError::Tracing {
            message: e.to_string(),
        })?;

    tracing_subscriber::registry()
        .with(stderr_layer(format).with_filter(filter))
        .try_init()
        .map_err(|e| CliError::Tracing {
            message: e.to_string(),
        })?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        ?format,
        "Logging initialized"
    );
    Ok(())
}

fn stderr_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    let ansi = io::stderr().is_terminal();
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(ansi);

    match format {
        LogFormat::Pretty => Box::new(layer.pretty()),
        LogFormat::Compact => Box::new(layer.compact().with_target(false)),
        LogFormat::Json => Box::new(layer.json().with_ansi(false).with_current_span(true)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_keeps_dependencies_quiet() {
        assert_eq!(
            LogLevel::Debug.directive(),
            "warn,monochart=debug,monochart_workspaces=debug"
        );
        assert!(EnvFilter::try_new(LogLevel::Trace.directive()).is_ok());
    }

    #[test]
    fn test_every_format_builds_a_layer() {
        for format in [LogFormat::Pretty, LogFormat::Compact, LogFormat::Json] {
            let _layer = stderr_layer(format);
        }
    }
}
