//! Command line front end for resolving the package manifests of a chart monorepo.

mod cli;
mod commands;
mod errors;
mod tracing;

use crate::cli::parse;
use crate::commands::Command;

fn main() {
    if let Err(error) = run() {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("{error:?}");
        }
        std::process::exit(1);
    }
}

fn run() -> miette::Result<()> {
    let cli = parse();

    crate::tracing::init(cli.level, cli.log_format)?;

    let command: Command = cli.command.into();
    ::tracing::debug!(?command, "Executing command");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::execute(command, &mut out)?;
    Ok(())
}
