//! Manifest loading and workspace package path resolution for monochart.
//!
//! Given a repository root, this crate loads the root `package.json`, works out
//! whether the root is a multi-package workspace or a single package, and
//! expands the workspace declaration into the list of member manifest files.
//!
//! # Architecture
//!
//! - [`ManifestLoader`] reads a manifest as JSON, falling back to YAML, and
//!   validates it into a [`Manifest`]
//! - [`WorkspaceResolver`] drives resolution through two collaborator traits:
//!   - [`TopologyDetector`] reports the multi-package tool in use
//!     (default [`WorkspaceToolDetector`])
//!   - [`GlobEngine`] expands path patterns with `.gitignore` support
//!     (default [`GitignoreGlob`])
//!
//! ## Manifest fields
//!
//! Besides the mandatory `name`, the resolver reads two optional fields:
//!
//! - `rootDir` - directory whose first-level subdirectories are member packages
//! - `searchFile` - manifest file required inside each member directory
//!   (defaults to [`DEFAULT_SEARCH_FILE`])
//!
//! ```yaml
//! name: charts
//! rootDir: charts/
//! searchFile: Chart.yaml
//! ```
//!
//! ## Feature flags
//!
//! - `detection-rush` - detect Rush workspaces from `rush.json` (**enabled by default**)
//!
//! # Example
//!
//! ```rust,no_run
//! use monochart_workspaces::resolve_package_paths;
//! use std::path::Path;
//!
//! let ignored = vec!["legacy".to_string()];
//! for manifest in resolve_package_paths(Path::new("."), Some(&ignored))? {
//!     println!("{}", manifest.display());
//! }
//! # Ok::<(), monochart_workspaces::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod core;
pub mod detection;
pub mod error;
pub mod glob;
pub mod manifest;
pub mod resolver;

// Re-export core types
pub use crate::core::{
    DetectedTopology, GlobOptions, WorkspaceDescription, WorkspaceRoot, WorkspaceTool,
};

// Re-export traits
pub use crate::core::{GlobEngine, TopologyDetector};

// Re-export default collaborators
pub use detection::WorkspaceToolDetector;
pub use glob::GitignoreGlob;

// Re-export manifest loading
pub use manifest::{
    DEFAULT_SEARCH_FILE, MANIFEST_FILE_NAME, Manifest, ManifestFormat, ManifestLoader,
    load_manifest,
};

// Re-export resolver
pub use resolver::{WorkspaceResolver, resolve_package_paths};

// Re-export error types
pub use error::{Error, ManifestSyntaxError, Result};
