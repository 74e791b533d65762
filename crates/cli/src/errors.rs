//! CLI-specific error types
//!
//! Library failures pass through unchanged so that their diagnostic codes and
//! help text reach the terminal.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Workspace(#[from] monochart_workspaces::Error),

    #[error("Failed to resolve working directory {path}")]
    #[diagnostic(
        code(monochart::cli::working_directory),
        help("Pass an existing directory with --cwd")
    )]
    WorkingDirectory {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render {what} as JSON")]
    #[diagnostic(code(monochart::cli::render))]
    Render {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to initialize logging: {message}")]
    #[diagnostic(
        code(monochart::cli::tracing),
        help("Check the RUST_LOG directive syntax")
    )]
    Tracing { message: String },

    #[error("Failed to write command output")]
    #[diagnostic(code(monochart::cli::output))]
    Output {
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn render(what: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Self::Render { what, source }
    }
}

impl From<std::io::Error> for CliError {
    fn from(source: std::io::Error) -> Self {
        Self::Output { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_workspace_error_is_transparent() {
        let inner = monochart_workspaces::Error::EmptyWorkspace {
            root: PathBuf::from("/repo"),
        };
        let expected = inner.to_string();

        let err = CliError::from(inner);

        assert_eq!(err.to_string(), expected);
        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("monochart::workspaces::empty_workspace".to_string())
        );
    }

    #[test]
    fn test_io_error_becomes_output_error() {
        let err = CliError::from(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "closed",
        ));

        assert!(matches!(err, CliError::Output { .. }));
        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("monochart::cli::output".to_string())
        );
    }
}
