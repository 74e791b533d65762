//! Collaborator traits used by the resolver.

use crate::core::types::{DetectedTopology, GlobOptions};
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Inspects a directory and reports which multi-package convention it follows.
///
/// # Example
///
/// ```rust
/// use monochart_workspaces::{DetectedTopology, Result, TopologyDetector};
/// use std::path::Path;
///
/// struct NeverDetects;
///
/// impl TopologyDetector for NeverDetects {
///     fn detect(&self, _root: &Path) -> Result<Option<DetectedTopology>> {
///         Ok(None)
///     }
/// }
/// ```
pub trait TopologyDetector {
    /// Detects the workspace topology at `root`.
    ///
    /// Returns `Ok(None)` when `root` follows no known convention.
    ///
    /// # Errors
    ///
    /// Returns an error if a tool configuration exists but cannot be read or parsed.
    fn detect(&self, root: &Path) -> Result<Option<DetectedTopology>>;
}

/// Expands path patterns into matching files.
///
/// Patterns starting with `!` exclude matches of the remaining patterns.
pub trait GlobEngine {
    /// Expands `patterns` relative to `options.cwd`.
    ///
    /// The result must be free of duplicates and identical across calls for an
    /// unchanged filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is invalid or the directory tree cannot be read.
    fn expand(&self, patterns: &[String], options: &GlobOptions) -> Result<Vec<PathBuf>>;
}
