//! Error types for manifest loading and workspace resolution.

use crate::manifest::ManifestFormat;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for workspace operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading manifests or resolving workspaces.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Manifest file not found.
    #[error("package.json file not found: \"{}\"", path.display())]
    #[diagnostic(
        code(monochart::workspaces::manifest_not_found),
        help("Run the command from a directory that contains a package.json manifest")
    )]
    ManifestNotFound {
        /// The path where the manifest was expected.
        path: PathBuf,
    },

    /// Manifest exists but could not be stat'd or read.
    #[error("package.json cannot be read: \"{}\"", path.display())]
    #[diagnostic(
        code(monochart::workspaces::manifest_unreadable),
        help("Check that you have permission to read the manifest and that it is valid UTF-8")
    )]
    ManifestUnreadable {
        /// Path to the manifest.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Manifest path is a directory, symlink or special file.
    #[error("package.json is not a file: \"{}\"", path.display())]
    #[diagnostic(
        code(monochart::workspaces::not_a_file),
        help("The manifest path must point at a regular file, not a directory or symlink")
    )]
    NotAFile {
        /// Path to the offending entry.
        path: PathBuf,
    },

    /// Every manifest format failed to parse the file.
    #[error("package.json could not be parsed as {format}: \"{}\": {source}", path.display())]
    #[diagnostic(
        code(monochart::workspaces::manifest_parse_failed),
        help("Manifests must be valid JSON or YAML")
    )]
    ManifestParseFailed {
        /// Path to the manifest.
        path: PathBuf,
        /// The last format that was attempted.
        format: ManifestFormat,
        /// Decoder error for `format`.
        #[source]
        source: ManifestSyntaxError,
    },

    /// Decoded manifest is not an object.
    #[error("package.json was not an object: \"{}\"", path.display())]
    #[diagnostic(
        code(monochart::workspaces::not_an_object),
        help("The top level of a manifest must be a mapping of keys to values")
    )]
    NotAnObject {
        /// Path to the manifest.
        path: PathBuf,
    },

    /// Decoded manifest has no usable `name`.
    #[error("Package name must be non-empty string: \"{}\"", path.display())]
    #[diagnostic(
        code(monochart::workspaces::missing_name),
        help("Add a \"name\" field to the manifest")
    )]
    MissingName {
        /// Path to the manifest.
        path: PathBuf,
    },

    /// A recognized manifest field has the wrong type.
    #[error("package.json field '{field}' must be a string: \"{}\"", path.display())]
    #[diagnostic(
        code(monochart::workspaces::invalid_manifest_field),
        help("'rootDir' and 'searchFile' must be strings when present")
    )]
    InvalidManifestField {
        /// Path to the manifest.
        path: PathBuf,
        /// Name of the offending field.
        field: &'static str,
    },

    /// Glob expansion produced no member manifests.
    #[error("package.json: Project must contain one or more workspace-packages (root: {})", root.display())]
    #[diagnostic(
        code(monochart::workspaces::empty_workspace),
        help(
            "Check that 'rootDir' points at a directory whose subdirectories contain the 'searchFile' manifest"
        )
    )]
    EmptyWorkspace {
        /// Workspace root that was searched.
        root: PathBuf,
    },

    /// A glob pattern could not be compiled.
    #[error("Invalid glob pattern '{pattern}': {message}")]
    #[diagnostic(
        code(monochart::workspaces::invalid_glob_pattern),
        help("Check the package paths and exclusions for unbalanced brackets or braces")
    )]
    InvalidGlobPattern {
        /// The offending pattern.
        pattern: String,
        /// Description of the problem.
        message: String,
    },

    /// Invalid workspace tool configuration.
    #[error("Invalid workspace configuration at {}: {message}", path.display())]
    #[diagnostic(
        code(monochart::workspaces::invalid_config),
        help(
            "Check the workspace configuration file for syntax errors or missing required fields"
        )
    )]
    InvalidWorkspaceConfig {
        /// Path to the invalid configuration file.
        path: PathBuf,
        /// Description of what is invalid.
        message: String,
    },

    /// I/O error occurred.
    #[error("I/O error during {operation}{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(monochart::workspaces::io_error),
        help(
            "Check that the referenced paths exist and that you have permission to read them"
        )
    )]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Optional path where the error occurred.
        path: Option<PathBuf>,
        /// Description of the operation being performed.
        operation: String,
    },

    /// JSON parsing error.
    #[error("JSON parsing error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(monochart::workspaces::json_error),
        help("Ensure the JSON has valid syntax")
    )]
    Json {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },

    /// YAML parsing error.
    #[error("YAML parsing error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(monochart::workspaces::yaml_error),
        help("Ensure the YAML has valid syntax")
    )]
    Yaml {
        /// The underlying YAML error.
        #[source]
        source: serde_yaml::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },
}

/// Decoder failure for a single [`ManifestFormat`].
#[derive(Error, Debug)]
pub enum ManifestSyntaxError {
    /// Rejected by the JSON decoder.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Rejected by the YAML decoder.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
