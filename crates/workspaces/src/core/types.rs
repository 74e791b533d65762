//! Core types for describing workspace topology.

use crate::manifest::Manifest;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Multi-package convention a workspace root follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceTool {
    /// Yarn workspaces (`workspaces` in `package.json`).
    Yarn,
    /// pnpm workspaces (`pnpm-workspace.yaml`).
    Pnpm,
    /// Lerna (`lerna.json`).
    Lerna,
    /// Bolt (`bolt.workspaces` in `package.json`).
    Bolt,
    /// Rush (`rush.json`).
    Rush,
    /// No multi-package tool; the directory is a single package.
    Root,
}

impl WorkspaceTool {
    /// Returns the lowercase tool identifier.
    ///
    /// # Example
    ///
    /// ```
    /// use monochart_workspaces::WorkspaceTool;
    ///
    /// assert_eq!(WorkspaceTool::Pnpm.as_str(), "pnpm");
    /// assert_eq!(WorkspaceTool::Root.as_str(), "root");
    /// ```
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm",
            Self::Lerna => "lerna",
            Self::Bolt => "bolt",
            Self::Rush => "rush",
            Self::Root => "root",
        }
    }

    /// Returns the file whose presence identifies this tool.
    ///
    /// # Example
    ///
    /// ```
    /// use monochart_workspaces::WorkspaceTool;
    ///
    /// assert_eq!(WorkspaceTool::Lerna.config_file_name(), "lerna.json");
    /// assert_eq!(WorkspaceTool::Yarn.config_file_name(), "package.json");
    /// ```
    #[must_use]
    pub fn config_file_name(&self) -> &'static str {
        match self {
            Self::Yarn | Self::Bolt | Self::Root => "package.json",
            Self::Pnpm => "pnpm-workspace.yaml",
            Self::Lerna => "lerna.json",
            Self::Rush => "rush.json",
        }
    }
}

impl fmt::Display for WorkspaceTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a [`TopologyDetector`](crate::TopologyDetector) found at a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedTopology {
    /// Detected tool. Never [`WorkspaceTool::Root`] for a real detection.
    pub tool: WorkspaceTool,
    /// Workspace root directory.
    pub root_dir: PathBuf,
    /// Absolute member package directories, sorted.
    pub packages: Vec<PathBuf>,
}

impl DetectedTopology {
    /// Topology of a standalone package at `root_dir`.
    #[must_use]
    pub fn single_package(root_dir: PathBuf) -> Self {
        Self {
            tool: WorkspaceTool::Root,
            root_dir,
            packages: Vec::new(),
        }
    }
}

/// Root of a workspace together with its loaded manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRoot {
    /// Directory containing the root manifest.
    pub dir: PathBuf,
    /// The root manifest.
    pub package_json: Manifest,
}

/// How a root directory relates to its member packages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkspaceDescription {
    /// Detected tool, or [`WorkspaceTool::Root`].
    pub tool: WorkspaceTool,
    /// Root directory and manifest.
    pub root: WorkspaceRoot,
    /// Member package directories. Empty when `tool` is [`WorkspaceTool::Root`].
    pub packages: Vec<PathBuf>,
}

impl WorkspaceDescription {
    /// Returns true when no multi-package tool was detected.
    #[must_use]
    pub fn is_single_package(&self) -> bool {
        self.tool == WorkspaceTool::Root
    }
}

/// Options passed to a [`GlobEngine`](crate::GlobEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobOptions {
    /// Directory patterns are relative to.
    pub cwd: PathBuf,
    /// Return absolute paths instead of paths relative to `cwd`.
    pub absolute: bool,
    /// Skip files excluded by `.gitignore`.
    pub gitignore: bool,
}

impl GlobOptions {
    /// Absolute, gitignore-aware matching under `cwd`.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            absolute: true,
            gitignore: true,
        }
    }
}
