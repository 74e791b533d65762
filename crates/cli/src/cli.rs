use crate::commands::Command;
use crate::tracing::{LogFormat, LogLevel};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "monochart")]
#[command(about = "Resolve the package manifests of a chart monorepo")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        env = "MONOCHART_LOG_LEVEL",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(
        long,
        global = true,
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Print the manifest path of every workspace package")]
    Paths {
        #[arg(
            long,
            short = 'C',
            help = "Workspace root directory",
            env = "MONOCHART_CWD",
            default_value = "."
        )]
        cwd: PathBuf,
        #[arg(
            long,
            help = "Package directories to exclude (comma-separated)",
            env = "MONOCHART_IGNORE_PACKAGES",
            value_delimiter = ','
        )]
        ignore_packages: Vec<String>,
        #[arg(long, help = "Include files excluded by .gitignore")]
        no_gitignore: bool,
        #[arg(long, help = "Print a JSON array instead of one path per line")]
        json: bool,
    },
    #[command(about = "Print the detected workspace topology as JSON")]
    Describe {
        #[arg(
            long,
            short = 'C',
            help = "Workspace root directory",
            env = "MONOCHART_CWD",
            default_value = "."
        )]
        cwd: PathBuf,
    },
    #[command(about = "Load and validate a single manifest")]
    Manifest {
        #[arg(help = "Path to the manifest file")]
        path: PathBuf,
        #[arg(long, help = "Print the raw file contents instead of the parsed manifest")]
        raw: bool,
    },
}

impl From<Commands> for Command {
    fn from(cmd: Commands) -> Self {
        match cmd {
            Commands::Paths {
                cwd,
                ignore_packages,
                no_gitignore,
                json,
            } => Self::Paths {
                cwd,
                ignore_packages: (!ignore_packages.is_empty()).then_some(ignore_packages),
                gitignore: !no_gitignore,
                json,
            },
            Commands::Describe { cwd } => Self::Describe { cwd },
            Commands::Manifest { path, raw } => Self::Manifest { path, raw },
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["monochart", "paths"]).unwrap();

        assert_eq!(cli.level, LogLevel::Warn);
        assert_eq!(cli.log_format, LogFormat::Compact);
        match cli.command {
            Commands::Paths {
                cwd,
                ignore_packages,
                no_gitignore,
                json,
            } => {
                assert_eq!(cwd, PathBuf::from("."));
                assert!(ignore_packages.is_empty());
                assert!(!no_gitignore);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_ignore_packages_are_comma_separated() {
        let cli = Cli::try_parse_from([
            "monochart",
            "paths",
            "--ignore-packages",
            "pkgA,pkgB",
            "--ignore-packages",
            "pkgC",
        ])
        .unwrap();

        let command: Command = cli.command.into();
        match command {
            Command::Paths {
                ignore_packages, ..
            } => assert_eq!(
                ignore_packages,
                Some(vec![
                    "pkgA".to_string(),
                    "pkgB".to_string(),
                    "pkgC".to_string()
                ])
            ),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_no_ignore_packages_is_none() {
        let cli = Cli::try_parse_from(["monochart", "paths", "--no-gitignore"]).unwrap();

        let command: Command = cli.command.into();
        assert!(matches!(
            command,
            Command::Paths {
                ignore_packages: None,
                gitignore: false,
                ..
            }
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "monochart",
            "describe",
            "-C",
            "/repo",
            "--level",
            "debug",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.level, LogLevel::Debug);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Commands::Describe { cwd } if cwd == PathBuf::from("/repo")));
    }

    #[test]
    fn test_manifest_requires_path() {
        assert!(Cli::try_parse_from(["monochart", "manifest"]).is_err());

        let cli = Cli::try_parse_from(["monochart", "manifest", "package.json", "--raw"]).unwrap();
        assert!(matches!(cli.command, Commands::Manifest { raw: true, .. }));
    }
}
