use crate::errors::CliError;
use monochart_workspaces::{ManifestLoader, WorkspaceResolver};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Paths {
        cwd: PathBuf,
        ignore_packages: Option<Vec<String>>,
        gitignore: bool,
        json: bool,
    },
    Describe {
        cwd: PathBuf,
    },
    Manifest {
        path: PathBuf,
        raw: bool,
    },
}

/// Runs `command`, writing its result to `out`.
pub fn execute(command: Command, out: &mut impl Write) -> Result<(), CliError> {
    match command {
        Command::Paths {
            cwd,
            ignore_packages,
            gitignore,
            json,
        } => execute_paths(&cwd, ignore_packages.as_deref(), gitignore, json, out),
        Command::Describe { cwd } => execute_describe(&cwd, out),
        Command::Manifest { path, raw } => execute_manifest(&path, raw, out),
    }
}

fn working_directory(cwd: &Path) -> Result<PathBuf, CliError> {
    std::path::absolute(cwd).map_err(|source| CliError::WorkingDirectory {
        path: cwd.to_path_buf(),
        source,
    })
}

#[instrument(skip(out))]
fn execute_paths(
    cwd: &Path,
    ignore_packages: Option<&[String]>,
    gitignore: bool,
    json: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let cwd = working_directory(cwd)?;
    let paths = WorkspaceResolver::new()
        .respect_gitignore(gitignore)
        .resolve_package_paths(&cwd, ignore_packages)?;

    tracing::debug!(count = paths.len(), "Resolved package manifests");

    if json {
        let rendered =
            serde_json::to_string_pretty(&paths).map_err(CliError::render("package paths"))?;
        writeln!(out, "{rendered}")?;
    } else {
        for path in &paths {
            writeln!(out, "{}", path.display())?;
        }
    }
    Ok(())
}

#[instrument(skip(out))]
fn execute_describe(cwd: &Path, out: &mut impl Write) -> Result<(), CliError> {
    let cwd = working_directory(cwd)?;
    let description = WorkspaceResolver::new().describe(&cwd)?;

    let rendered = serde_json::to_string_pretty(&description)
        .map_err(CliError::render("workspace description"))?;
    writeln!(out, "{rendered}")?;
    Ok(())
}

#[instrument(skip(out))]
fn execute_manifest(path: &Path, raw: bool, out: &mut impl Write) -> Result<(), CliError> {
    let manifest = ManifestLoader.load(path)?;

    if raw {
        out.write_all(manifest.contents().as_bytes())?;
    } else {
        let rendered =
            serde_json::to_string_pretty(&manifest).map_err(CliError::render("manifest"))?;
        writeln!(out, "{rendered}")?;
    }
    Ok(())
}
