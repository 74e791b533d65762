//! Workspace package path resolution.
//!
//! [`WorkspaceResolver`] turns a working directory into the list of member
//! package manifests:
//!
//! 1. detect the workspace tool, falling back to a single package
//! 2. load the root `package.json` (this is the authoritative validation)
//! 3. list the subdirectories of the manifest's `rootDir`, or use the
//!    detected members when `rootDir` is absent
//! 4. turn them into `cwd`-relative patterns naming the `searchFile` in each
//!    directory, with caller exclusions appended as `!` patterns
//! 5. expand the patterns with the glob engine and reject an empty result

use crate::core::traits::{GlobEngine, TopologyDetector};
use crate::core::types::{
    DetectedTopology, GlobOptions, WorkspaceDescription, WorkspaceRoot, WorkspaceTool,
};
use crate::detection::WorkspaceToolDetector;
use crate::error::{Error, Result};
use crate::glob::{GitignoreGlob, escape_literal, to_slash_path};
use crate::manifest::{MANIFEST_FILE_NAME, ManifestLoader};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Resolves the member package manifests of a workspace.
///
/// # Example
///
/// ```no_run
/// use monochart_workspaces::WorkspaceResolver;
/// use std::path::Path;
///
/// let ignored = vec!["deprecated-chart".to_string()];
/// let paths = WorkspaceResolver::new()
///     .resolve_package_paths(Path::new("."), Some(&ignored))?;
///
/// for path in paths {
///     println!("{}", path.display());
/// }
/// # Ok::<(), monochart_workspaces::Error>(())
/// ```
pub struct WorkspaceResolver {
    detector: Box<dyn TopologyDetector>,
    glob: Box<dyn GlobEngine>,
    loader: ManifestLoader,
    gitignore: bool,
}

impl Default for WorkspaceResolver {
    fn default() -> Self {
        Self {
            detector: Box::new(WorkspaceToolDetector),
            glob: Box::new(GitignoreGlob),
            loader: ManifestLoader,
            gitignore: true,
        }
    }
}

impl fmt::Debug for WorkspaceResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceResolver")
            .field("gitignore", &self.gitignore)
            .finish_non_exhaustive()
    }
}

impl WorkspaceResolver {
    /// Resolver using [`WorkspaceToolDetector`] and [`GitignoreGlob`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the topology detector.
    #[must_use]
    pub fn with_detector(mut self, detector: impl TopologyDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    /// Replaces the glob engine.
    #[must_use]
    pub fn with_glob_engine(mut self, glob: impl GlobEngine + 'static) -> Self {
        self.glob = Box::new(glob);
        self
    }

    /// Whether files excluded by `.gitignore` are skipped. Defaults to `true`.
    #[must_use]
    pub fn respect_gitignore(mut self, gitignore: bool) -> Self {
        self.gitignore = gitignore;
        self
    }

    /// Determines the workspace topology at `cwd` and loads its root manifest.
    ///
    /// A detector error is not fatal: the directory is then treated as a
    /// single package and validated by loading its manifest.
    ///
    /// # Errors
    ///
    /// Returns any error from loading `<root>/package.json`, unchanged.
    pub fn describe(&self, cwd: &Path) -> Result<WorkspaceDescription> {
        let cwd = absolute_dir(cwd);

        let topology = match self.detector.detect(&cwd) {
            Ok(Some(topology)) => topology,
            Ok(None) => DetectedTopology::single_package(cwd),
            Err(e) => {
                tracing::debug!(
                    cwd = %cwd.display(),
                    error = %e,
                    "Workspace detection failed, treating directory as a single package"
                );
                DetectedTopology::single_package(cwd)
            }
        };

        let package_json = self
            .loader
            .load(&topology.root_dir.join(MANIFEST_FILE_NAME))?;

        let packages = if topology.tool == WorkspaceTool::Root {
            Vec::new()
        } else {
            topology.packages
        };

        tracing::debug!(
            tool = %topology.tool,
            root = %topology.root_dir.display(),
            name = package_json.name(),
            packages = packages.len(),
            "Described workspace"
        );

        Ok(WorkspaceDescription {
            tool: topology.tool,
            root: WorkspaceRoot {
                dir: topology.root_dir,
                package_json,
            },
            packages,
        })
    }

    /// Returns the absolute paths of every member package manifest under `cwd`.
    ///
    /// Entries of `ignore_packages` are excluded in addition to anything the
    /// workspace itself excludes.
    ///
    /// # Errors
    ///
    /// - any error from [`WorkspaceResolver::describe`]
    /// - [`Error::Io`] if `rootDir` cannot be listed
    /// - [`Error::InvalidGlobPattern`] or other glob engine failures
    /// - [`Error::EmptyWorkspace`] if no member manifest matched
    pub fn resolve_package_paths(
        &self,
        cwd: &Path,
        ignore_packages: Option<&[String]>,
    ) -> Result<Vec<PathBuf>> {
        let cwd = absolute_dir(cwd);
        let span = tracing::info_span!("workspace.resolve", cwd = %cwd.display());
        let _guard = span.enter();

        let workspace = self.describe(&cwd)?;
        let candidates = candidate_dirs(&workspace)?;

        let mut packages: Vec<String> = candidates
            .iter()
            .filter_map(|dir| relative_to(&cwd, dir))
            .map(|dir| escape_literal(&dir))
            .collect();

        if let Some(ignored) = ignore_packages {
            packages.extend(ignored.iter().map(|p| format!("!{p}")));
        }

        let search_file = workspace.root.package_json.search_file_or_default();
        let patterns: Vec<String> = packages
            .iter()
            .map(|p| manifest_pattern(p, search_file))
            .collect();

        tracing::debug!(patterns = ?patterns, "Expanding workspace packages");

        let options = GlobOptions {
            gitignore: self.gitignore,
            ..GlobOptions::new(cwd.clone())
        };
        let mut paths = self.glob.expand(&patterns, &options)?;

        let mut seen = HashSet::new();
        paths.retain(|path| seen.insert(path.clone()));

        if paths.is_empty() {
            return Err(Error::EmptyWorkspace { root: cwd });
        }

        tracing::info!(count = paths.len(), "Resolved workspace packages");
        Ok(paths)
    }
}

/// Resolves package manifest paths with the default collaborators.
///
/// # Errors
///
/// See [`WorkspaceResolver::resolve_package_paths`].
pub fn resolve_package_paths(
    cwd: &Path,
    ignore_packages: Option<&[String]>,
) -> Result<Vec<PathBuf>> {
    WorkspaceResolver::new().resolve_package_paths(cwd, ignore_packages)
}

fn absolute_dir(path: &Path) -> PathBuf {
    normalize_lexically(&std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()))
}

/// Folds `.` and `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            _ => normalized.push(component),
        }
    }
    normalized
}

/// Directories that may hold a member manifest.
fn candidate_dirs(workspace: &WorkspaceDescription) -> Result<Vec<PathBuf>> {
    match workspace.root.package_json.root_dir() {
        Some(root_dir) => {
            list_subdirectories(&normalize_lexically(&workspace.root.dir.join(root_dir)))
        }
        None => {
            tracing::debug!("Manifest declares no rootDir, using detected packages");
            Ok(workspace.packages.clone())
        }
    }
}

fn list_subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    let io_error = |source: std::io::Error| Error::Io {
        source,
        path: Some(dir.to_path_buf()),
        operation: "listing package directories".to_string(),
    };

    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        if entry.file_type().map_err(io_error)?.is_dir() {
            dirs.push(entry.path());
        }
    }

    dirs.sort();
    Ok(dirs)
}

/// `dir` relative to `cwd` as a `/`-separated directory pattern.
fn relative_to(cwd: &Path, dir: &Path) -> Option<String> {
    let dir = normalize_lexically(dir);
    match dir.strip_prefix(cwd).ok().and_then(to_slash_path) {
        Some(rel) => Some(format!("{rel}/")),
        None => {
            tracing::warn!(
                dir = %dir.display(),
                cwd = %cwd.display(),
                "Package directory is outside the working directory, skipping"
            );
            None
        }
    }
}

/// Replaces the optional trailing `/` of `package` with `/<search_file>`.
fn manifest_pattern(package: &str, search_file: &str) -> String {
    let dir = package.strip_suffix('/').unwrap_or(package);
    format!("{dir}/{search_file}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    struct FailingDetector;

    impl TopologyDetector for FailingDetector {
        fn detect(&self, root: &Path) -> Result<Option<DetectedTopology>> {
            Err(Error::InvalidWorkspaceConfig {
                path: root.join("package.json"),
                message: "boom".to_string(),
            })
        }
    }

    struct FixedDetector(DetectedTopology);

    impl TopologyDetector for FixedDetector {
        fn detect(&self, _root: &Path) -> Result<Option<DetectedTopology>> {
            Ok(Some(self.0.clone()))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingGlob {
        calls: Rc<RefCell<Vec<(Vec<String>, GlobOptions)>>>,
        result: Vec<PathBuf>,
    }

    impl GlobEngine for RecordingGlob {
        fn expand(&self, patterns: &[String], options: &GlobOptions) -> Result<Vec<PathBuf>> {
            self.calls
                .borrow_mut()
                .push((patterns.to_vec(), options.clone()));
            Ok(self.result.clone())
        }
    }

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_manifest_pattern() {
        assert_eq!(manifest_pattern("charts/a/", "Chart.yaml"), "charts/a/Chart.yaml");
        assert_eq!(manifest_pattern("!a", "Chart.yaml"), "!a/Chart.yaml");
        assert_eq!(manifest_pattern("charts/a", "package.json"), "charts/a/package.json");
    }

    #[test]
    fn test_relative_to() {
        let cwd = Path::new("/repo");
        assert_eq!(
            relative_to(cwd, Path::new("/repo/charts/a")),
            Some("charts/a/".to_string())
        );
        assert_eq!(
            relative_to(cwd, Path::new("/repo/tools/../charts/./a")),
            Some("charts/a/".to_string())
        );
        assert_eq!(relative_to(cwd, Path::new("/elsewhere/a")), None);
        assert_eq!(relative_to(cwd, Path::new("/repo/../charts/a")), None);
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/repo/tools/../charts/./a")),
            PathBuf::from("/repo/charts/a")
        );
        assert_eq!(
            normalize_lexically(Path::new("/repo/../../charts")),
            PathBuf::from("/charts")
        );
        assert_eq!(
            normalize_lexically(Path::new("../../charts")),
            PathBuf::from("../../charts")
        );
    }

    #[test]
    fn test_directory_names_are_escaped_in_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "package.json", r#"{"name": "charts", "rootDir": "charts"}"#);
        fs::create_dir_all(root.join("charts/app[v2]")).unwrap();

        let glob = RecordingGlob {
            result: vec![root.join("charts/app[v2]/Chart.yaml")],
            ..RecordingGlob::default()
        };
        let ignored = vec!["legacy-*".to_string()];

        WorkspaceResolver::new()
            .with_detector(FailingDetector)
            .with_glob_engine(glob.clone())
            .resolve_package_paths(root, Some(&ignored))
            .unwrap();

        let calls = glob.calls.borrow();
        assert_eq!(
            calls[0].0,
            vec![
                "charts/app[[]v2[]]/Chart.yaml".to_string(),
                "!legacy-*/Chart.yaml".to_string(),
            ]
        );
    }

    #[test]
    fn test_detector_failure_falls_back_to_root() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "package.json", r#"{"name": "charts"}"#);

        let workspace = WorkspaceResolver::new()
            .with_detector(FailingDetector)
            .describe(temp_dir.path())
            .unwrap();

        assert_eq!(workspace.tool, WorkspaceTool::Root);
        assert!(workspace.is_single_package());
        assert!(workspace.packages.is_empty());
        assert_eq!(workspace.root.package_json.name(), "charts");
    }

    #[test]
    fn test_manifest_errors_propagate_after_detection_failure() {
        let temp_dir = TempDir::new().unwrap();

        let err = WorkspaceResolver::new()
            .with_detector(FailingDetector)
            .describe(temp_dir.path())
            .unwrap_err();

        assert!(matches!(err, Error::ManifestNotFound { .. }));
    }

    #[test]
    fn test_patterns_layer_cli_exclusions() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(
            root,
            "package.json",
            r#"{"name": "charts", "rootDir": "charts/", "searchFile": "Chart.yaml"}"#,
        );
        fs::create_dir_all(root.join("charts/b")).unwrap();
        fs::create_dir_all(root.join("charts/a")).unwrap();
        write(root, "charts/not-a-dir", "");

        let glob = RecordingGlob {
            result: vec![root.join("charts/a/Chart.yaml")],
            ..RecordingGlob::default()
        };
        let ignored = vec!["b".to_string()];

        let paths = WorkspaceResolver::new()
            .with_detector(FailingDetector)
            .with_glob_engine(glob.clone())
            .resolve_package_paths(root, Some(&ignored))
            .unwrap();

        assert_eq!(paths, vec![root.join("charts/a/Chart.yaml")]);

        let calls = glob.calls.borrow();
        assert_eq!(calls.len(), 1);
        let (patterns, options) = &calls[0];
        assert_eq!(
            patterns,
            &vec![
                "charts/a/Chart.yaml".to_string(),
                "charts/b/Chart.yaml".to_string(),
                "!b/Chart.yaml".to_string(),
            ]
        );
        assert!(options.absolute);
        assert!(options.gitignore);
    }

    #[test]
    fn test_detected_packages_used_without_root_dir() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(
            root,
            "package.json",
            r#"{"name": "repo", "searchFile": "package.json"}"#,
        );

        let glob = RecordingGlob {
            result: vec![root.join("packages/a/package.json")],
            ..RecordingGlob::default()
        };
        let detector = FixedDetector(DetectedTopology {
            tool: WorkspaceTool::Yarn,
            root_dir: std::path::absolute(root).unwrap(),
            packages: vec![std::path::absolute(root.join("packages/a")).unwrap()],
        });

        WorkspaceResolver::new()
            .with_detector(detector)
            .with_glob_engine(glob.clone())
            .respect_gitignore(false)
            .resolve_package_paths(root, None)
            .unwrap();

        let calls = glob.calls.borrow();
        assert_eq!(calls[0].0, vec!["packages/a/package.json".to_string()]);
        assert!(!calls[0].1.gitignore);
    }

    #[test]
    fn test_duplicates_removed() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "package.json", r#"{"name": "charts", "rootDir": "charts"}"#);
        fs::create_dir_all(root.join("charts/a")).unwrap();

        let chart = root.join("charts/a/Chart.yaml");
        let glob = RecordingGlob {
            result: vec![chart.clone(), chart.clone()],
            ..RecordingGlob::default()
        };

        let paths = WorkspaceResolver::new()
            .with_detector(FailingDetector)
            .with_glob_engine(glob)
            .resolve_package_paths(root, None)
            .unwrap();

        assert_eq!(paths, vec![chart]);
    }

    #[test]
    fn test_empty_glob_result() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "package.json", r#"{"name": "charts", "rootDir": "charts"}"#);
        fs::create_dir_all(root.join("charts")).unwrap();

        let err = WorkspaceResolver::new()
            .with_detector(FailingDetector)
            .with_glob_engine(RecordingGlob::default())
            .resolve_package_paths(root, None)
            .unwrap_err();

        assert!(matches!(err, Error::EmptyWorkspace { .. }));
    }

    #[test]
    fn test_missing_root_dir_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        write(
            temp_dir.path(),
            "package.json",
            r#"{"name": "charts", "rootDir": "missing"}"#,
        );

        let err = WorkspaceResolver::new()
            .with_detector(FailingDetector)
            .resolve_package_paths(temp_dir.path(), None)
            .unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
    }
}
