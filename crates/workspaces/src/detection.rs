//! Workspace tool detection.
//!
//! [`WorkspaceToolDetector`] inspects a directory for the configuration files
//! of the common JavaScript multi-package tools and reports the first match
//! together with its member package directories.
//!
//! Tools are checked in this order:
//!
//! 1. Yarn - `workspaces` in `package.json` (array or `{ "packages": [...] }`)
//! 2. Bolt - `bolt.workspaces` in `package.json`
//! 3. pnpm - `packages` in `pnpm-workspace.yaml`
//! 4. Lerna - `packages` in `lerna.json` (defaults to `packages/*`)
//! 5. Rush - `projects[].projectFolder` in `rush.json` (feature `detection-rush`)
//!
//! # Examples
//!
//! ```no_run
//! use monochart_workspaces::{TopologyDetector, WorkspaceToolDetector};
//! use std::path::Path;
//!
//! match WorkspaceToolDetector.detect(Path::new("/path/to/repo"))? {
//!     Some(topology) => println!("{} with {} packages", topology.tool, topology.packages.len()),
//!     None => println!("single package"),
//! }
//! # Ok::<(), monochart_workspaces::Error>(())
//! ```

use crate::core::traits::{GlobEngine, TopologyDetector};
use crate::core::types::{DetectedTopology, GlobOptions, WorkspaceTool};
use crate::error::{Error, Result};
use crate::glob::GitignoreGlob;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Member patterns lerna assumes when `lerna.json` declares none.
const LERNA_DEFAULT_PACKAGES: [&str; 1] = ["packages/*"];

/// Default [`TopologyDetector`].
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkspaceToolDetector;

impl TopologyDetector for WorkspaceToolDetector {
    fn detect(&self, root: &Path) -> Result<Option<DetectedTopology>> {
        tracing::debug!("Detecting workspace tool in: {}", root.display());

        if let Some(package_json) = read_package_json(root)? {
            if let Some(patterns) = yarn_workspace_patterns(&package_json) {
                return expand_topology(root, WorkspaceTool::Yarn, &patterns).map(Some);
            }
            if let Some(patterns) = bolt_workspace_patterns(&package_json) {
                return expand_topology(root, WorkspaceTool::Bolt, &patterns).map(Some);
            }
        }

        if let Some(patterns) = read_pnpm_patterns(root)? {
            return expand_topology(root, WorkspaceTool::Pnpm, &patterns).map(Some);
        }

        if let Some(patterns) = read_lerna_patterns(root)? {
            return expand_topology(root, WorkspaceTool::Lerna, &patterns).map(Some);
        }

        #[cfg(feature = "detection-rush")]
        if let Some(packages) = read_rush_projects(root)? {
            tracing::debug!(count = packages.len(), "Detected rush workspace");
            return Ok(Some(DetectedTopology {
                tool: WorkspaceTool::Rush,
                root_dir: root.to_path_buf(),
                packages,
            }));
        }

        tracing::debug!("No workspace tool detected");
        Ok(None)
    }
}

fn read_config(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }

    fs::read_to_string(path)
        .map(Some)
        .map_err(|e| Error::Io {
            source: e,
            path: Some(path.to_path_buf()),
            operation: "reading workspace config".to_string(),
        })
}

fn read_package_json(root: &Path) -> Result<Option<Value>> {
    let path = root.join(WorkspaceTool::Yarn.config_file_name());
    let Some(content) = read_config(&path)? else {
        return Ok(None);
    };

    let parsed = serde_json::from_str::<Value>(&content).map_err(|e| {
        Error::InvalidWorkspaceConfig {
            path: path.clone(),
            message: format!("Invalid JSON: {e}"),
        }
    })?;

    Ok(Some(parsed))
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

fn yarn_workspace_patterns(package_json: &Value) -> Option<Vec<String>> {
    let workspaces = package_json.get("workspaces")?;
    string_list(workspaces).or_else(|| workspaces.get("packages").and_then(string_list))
}

fn bolt_workspace_patterns(package_json: &Value) -> Option<Vec<String>> {
    package_json
        .get("bolt")
        .and_then(|bolt| bolt.get("workspaces"))
        .and_then(string_list)
}

#[derive(Debug, Deserialize)]
struct PnpmWorkspaceConfig {
    #[serde(default)]
    packages: Option<Vec<String>>,
}

fn read_pnpm_patterns(root: &Path) -> Result<Option<Vec<String>>> {
    let path = root.join(WorkspaceTool::Pnpm.config_file_name());
    let Some(content) = read_config(&path)? else {
        return Ok(None);
    };

    let config: Option<PnpmWorkspaceConfig> =
        serde_yaml::from_str(&content).map_err(|e| Error::Yaml {
            source: e,
            path: Some(path.clone()),
        })?;

    Ok(Some(config.and_then(|c| c.packages).unwrap_or_default()))
}

#[derive(Debug, Deserialize)]
struct LernaConfig {
    #[serde(default)]
    packages: Option<Vec<String>>,
}

fn read_lerna_patterns(root: &Path) -> Result<Option<Vec<String>>> {
    let path = root.join(WorkspaceTool::Lerna.config_file_name());
    let Some(content) = read_config(&path)? else {
        return Ok(None);
    };

    let config: LernaConfig = serde_json::from_str(&content).map_err(|e| Error::Json {
        source: e,
        path: Some(path.clone()),
    })?;

    Ok(Some(config.packages.unwrap_or_else(|| {
        LERNA_DEFAULT_PACKAGES.iter().map(|s| (*s).to_string()).collect()
    })))
}

#[cfg(feature = "detection-rush")]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RushProject {
    project_folder: String,
}

#[cfg(feature = "detection-rush")]
fn read_rush_projects(root: &Path) -> Result<Option<Vec<PathBuf>>> {
    let path = root.join(WorkspaceTool::Rush.config_file_name());
    let Some(content) = read_config(&path)? else {
        return Ok(None);
    };

    let value = jsonc_parser::parse_to_value(&content, &jsonc_parser::ParseOptions::default())
        .map_err(|err| Error::InvalidWorkspaceConfig {
            path: path.clone(),
            message: format!("Failed to parse rush.json as JSONC: {err:?}"),
        })?
        .map(convert_jsonc_to_serde_value)
        .unwrap_or(Value::Null);

    let projects: Vec<RushProject> = match value.get("projects") {
        Some(projects) => serde_json::from_value(projects.clone()).map_err(|e| Error::Json {
            source: e,
            path: Some(path.clone()),
        })?,
        None => Vec::new(),
    };

    let packages: BTreeSet<PathBuf> = projects
        .into_iter()
        .map(|project| root.join(project.project_folder))
        .collect();

    Ok(Some(packages.into_iter().collect()))
}

#[cfg(feature = "detection-rush")]
fn convert_jsonc_to_serde_value(jsonc_value: jsonc_parser::JsonValue) -> Value {
    match jsonc_value {
        jsonc_parser::JsonValue::Null => Value::Null,
        jsonc_parser::JsonValue::Boolean(b) => Value::Bool(b),
        jsonc_parser::JsonValue::Number(n) => {
            if let Ok(i) = n.parse::<i64>() {
                Value::Number(i.into())
            } else if let Ok(f) = n.parse::<f64>() {
                serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
            } else {
                Value::Null
            }
        }
        jsonc_parser::JsonValue::String(s) => Value::String(s.to_string()),
        jsonc_parser::JsonValue::Array(arr) => {
            Value::Array(arr.into_iter().map(convert_jsonc_to_serde_value).collect())
        }
        jsonc_parser::JsonValue::Object(obj) => {
            let mut map = serde_json::Map::new();
            for (key, value) in obj {
                map.insert(key, convert_jsonc_to_serde_value(value));
            }
            Value::Object(map)
        }
    }
}

/// Expands member patterns into the directories holding a `package.json`.
fn expand_topology(
    root: &Path,
    tool: WorkspaceTool,
    patterns: &[String],
) -> Result<DetectedTopology> {
    let manifest_patterns: Vec<String> = patterns
        .iter()
        .map(|pattern| {
            let (negation, body) = match pattern.strip_prefix('!') {
                Some(body) => ("!", body),
                None => ("", pattern.as_str()),
            };
            format!("{negation}{}/package.json", body.trim_end_matches('/'))
        })
        .collect();

    let options = GlobOptions {
        gitignore: false,
        ..GlobOptions::new(root.to_path_buf())
    };
    let manifests = GitignoreGlob.expand(&manifest_patterns, &options)?;

    let packages: BTreeSet<PathBuf> = manifests
        .iter()
        .filter_map(|manifest| manifest.parent())
        .filter(|dir| *dir != root)
        .map(Path::to_path_buf)
        .collect();

    tracing::debug!(
        tool = %tool,
        count = packages.len(),
        "Detected workspace"
    );

    Ok(DetectedTopology {
        tool,
        root_dir: root.to_path_buf(),
        packages: packages.into_iter().collect(),
    })
}
