//! Manifest loading.
//!
//! A manifest is read once from disk, decoded with each [`ManifestFormat`] in
//! [`ManifestFormat::FALLBACK_ORDER`] until one succeeds, and validated into a
//! [`Manifest`]. The text that produced the manifest travels with it but is
//! never serialized back out.
//!
//! ```no_run
//! use monochart_workspaces::manifest::load_manifest;
//! use std::path::Path;
//!
//! let manifest = load_manifest(Path::new("package.json"))?;
//! println!("{} ({} bytes)", manifest.name(), manifest.contents().len());
//! # Ok::<(), monochart_workspaces::Error>(())
//! ```

use crate::error::{Error, ManifestSyntaxError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::Path;

/// Manifest file name expected at the root of every workspace.
pub const MANIFEST_FILE_NAME: &str = "package.json";

/// Manifest file looked up inside member directories when `searchFile` is absent.
pub const DEFAULT_SEARCH_FILE: &str = "Chart.yaml";

/// Serialization formats a manifest may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestFormat {
    /// Strict JSON.
    Json,
    /// Relaxed, human-authored YAML.
    Yaml,
}

impl ManifestFormat {
    /// Formats tried by the loader, in order.
    pub const FALLBACK_ORDER: [Self; 2] = [Self::Json, Self::Yaml];

    /// Decodes `contents` into a generic value.
    ///
    /// # Errors
    ///
    /// Returns the decoder's error when `contents` is not valid in this format.
    pub fn parse(self, contents: &str) -> std::result::Result<Value, ManifestSyntaxError> {
        Ok(match self {
            Self::Json => serde_json::from_str(contents)?,
            Self::Yaml => serde_yaml::from_str(contents)?,
        })
    }

    /// Returns the lowercase format name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for ManifestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated package manifest.
///
/// `rootDir` and `searchFile` are lifted into typed fields; every other key is
/// kept verbatim in an open side-map. The raw source text is available through
/// [`Manifest::contents`] and is skipped by serialization and equality.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    root_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_file: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
    #[serde(skip)]
    contents: String,
}

impl Manifest {
    /// Validates a decoded value and attaches the text it was decoded from.
    ///
    /// `path` is only used for error reporting.
    ///
    /// # Errors
    ///
    /// - [`Error::NotAnObject`] if `value` is not an object
    /// - [`Error::MissingName`] if `name` is absent, not a string or empty
    /// - [`Error::InvalidManifestField`] if `rootDir` or `searchFile` is not a string
    pub fn from_value(path: &Path, value: Value, contents: String) -> Result<Self> {
        let Value::Object(mut extra) = value else {
            return Err(Error::NotAnObject {
                path: path.to_path_buf(),
            });
        };

        let name = match extra.remove("name") {
            Some(Value::String(name)) if !name.is_empty() => name,
            _ => {
                return Err(Error::MissingName {
                    path: path.to_path_buf(),
                });
            }
        };

        let root_dir = take_string_field(&mut extra, "rootDir", path)?;
        let search_file = take_string_field(&mut extra, "searchFile", path)?;

        Ok(Self {
            name,
            root_dir,
            search_file,
            extra,
            contents,
        })
    }

    /// Package name. Never empty.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory whose subdirectories are member packages.
    #[must_use]
    pub fn root_dir(&self) -> Option<&str> {
        self.root_dir.as_deref()
    }

    /// Manifest file name required inside each member directory, if declared.
    #[must_use]
    pub fn search_file(&self) -> Option<&str> {
        self.search_file.as_deref()
    }

    /// Declared `searchFile`, or [`DEFAULT_SEARCH_FILE`].
    #[must_use]
    pub fn search_file_or_default(&self) -> &str {
        self.search_file().unwrap_or(DEFAULT_SEARCH_FILE)
    }

    /// Looks up a field that has no typed accessor.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// All fields without a typed accessor.
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Exact text the manifest was parsed from.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }
}

impl PartialEq for Manifest {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.root_dir == other.root_dir
            && self.search_file == other.search_file
            && self.extra == other.extra
    }
}

fn take_string_field(
    fields: &mut Map<String, Value>,
    field: &'static str,
    path: &Path,
) -> Result<Option<String>> {
    match fields.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(_) => Err(Error::InvalidManifestField {
            path: path.to_path_buf(),
            field,
        }),
    }
}

/// Loads manifests from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManifestLoader;

impl ManifestLoader {
    /// Reads, parses and validates the manifest at `path`.
    ///
    /// # Errors
    ///
    /// - [`Error::ManifestNotFound`] if nothing exists at `path`
    /// - [`Error::ManifestUnreadable`] if `path` cannot be stat'd or read
    /// - [`Error::NotAFile`] if `path` is not a regular file
    /// - [`Error::ManifestParseFailed`] if no format can decode the file
    /// - any validation error from [`Manifest::from_value`]
    pub fn load(&self, path: &Path) -> Result<Manifest> {
        let [first, fallbacks @ ..] = ManifestFormat::FALLBACK_ORDER;

        let mut contents = read_manifest(path)?;
        let mut format = first;
        let mut parsed = format.parse(&contents);

        for next in fallbacks {
            let Err(error) = &parsed else {
                break;
            };
            tracing::debug!(
                path = %path.display(),
                format = %format,
                error = %error,
                "Manifest format did not match"
            );
            contents = read_manifest(path)?;
            format = next;
            parsed = format.parse(&contents);
        }

        match parsed {
            Ok(value) => {
                tracing::debug!(path = %path.display(), format = %format, "Parsed manifest");
                Manifest::from_value(path, value, contents)
            }
            Err(source) => Err(Error::ManifestParseFailed {
                path: path.to_path_buf(),
                format,
                source,
            }),
        }
    }
}

/// Convenience wrapper around [`ManifestLoader::load`].
///
/// # Errors
///
/// See [`ManifestLoader::load`].
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    ManifestLoader.load(path)
}

fn read_manifest(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::ManifestNotFound {
            path: path.to_path_buf(),
        });
    }

    let metadata = fs::symlink_metadata(path).map_err(|source| Error::ManifestUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    if !metadata.is_file() {
        return Err(Error::NotAFile {
            path: path.to_path_buf(),
        });
    }

    fs::read_to_string(path).map_err(|source| Error::ManifestUnreadable {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_manifest(dir: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(MANIFEST_FILE_NAME);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_json_parse_keeps_raw_text() {
        let dir = TempDir::new().unwrap();
        let text = "{\n  \"name\": \"charts\",\n  \"version\": \"1.0.0\"\n}\n";
        let path = write_manifest(&dir, text);

        let manifest = load_manifest(&path).unwrap();

        assert_eq!(manifest.name(), "charts");
        assert_eq!(manifest.contents(), text);
        assert_eq!(manifest.get("version"), Some(&Value::from("1.0.0")));
    }

    #[test]
    fn test_yaml_fallback() {
        let dir = TempDir::new().unwrap();
        let text = "name: charts\nrootDir: charts/\nsearchFile: Chart.yaml\n";
        let path = write_manifest(&dir, text);

        let manifest = load_manifest(&path).unwrap();

        assert_eq!(manifest.name(), "charts");
        assert_eq!(manifest.root_dir(), Some("charts/"));
        assert_eq!(manifest.search_file(), Some("Chart.yaml"));
        assert_eq!(manifest.contents(), text);
    }

    #[test]
    fn test_both_formats_fail() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, "name: [unclosed\n  - : :");

        let err = load_manifest(&path).unwrap_err();

        assert!(matches!(
            err,
            Error::ManifestParseFailed {
                format: ManifestFormat::Yaml,
                source: ManifestSyntaxError::Yaml(_),
                ..
            }
        ));
    }

    #[test]
    fn test_format_parse_reports_decoder_error() {
        assert!(matches!(
            ManifestFormat::Json.parse("name: charts"),
            Err(ManifestSyntaxError::Json(_))
        ));
        assert_eq!(
            ManifestFormat::Yaml.parse("name: charts").unwrap(),
            serde_json::json!({"name": "charts"})
        );
    }

    #[test]
    fn test_json_array_is_not_an_object() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, r#"[{"name": "charts"}]"#);

        assert!(matches!(
            load_manifest(&path).unwrap_err(),
            Error::NotAnObject { .. }
        ));
    }

    #[test]
    fn test_yaml_scalar_is_not_an_object() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, "just a sentence\n");

        assert!(matches!(
            load_manifest(&path).unwrap_err(),
            Error::NotAnObject { .. }
        ));
    }

    #[test]
    fn test_missing_and_empty_name() {
        let dir = TempDir::new().unwrap();

        for text in [r#"{"version": "1.0.0"}"#, r#"{"name": ""}"#, r#"{"name": 42}"#] {
            let path = write_manifest(&dir, text);
            assert!(
                matches!(load_manifest(&path).unwrap_err(), Error::MissingName { .. }),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn test_non_string_root_dir() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, r#"{"name": "charts", "rootDir": 7}"#);

        assert!(matches!(
            load_manifest(&path).unwrap_err(),
            Error::InvalidManifestField {
                field: "rootDir",
                ..
            }
        ));
    }

    #[test]
    fn test_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MANIFEST_FILE_NAME);

        assert!(matches!(
            load_manifest(&path).unwrap_err(),
            Error::ManifestNotFound { .. }
        ));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MANIFEST_FILE_NAME);
        fs::create_dir(&path).unwrap();

        assert!(matches!(
            load_manifest(&path).unwrap_err(),
            Error::NotAFile { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("real.json");
        fs::write(&target, r#"{"name": "charts"}"#).unwrap();
        let link = dir.path().join(MANIFEST_FILE_NAME);
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(matches!(
            load_manifest(&link).unwrap_err(),
            Error::NotAFile { .. }
        ));
    }

    #[test]
    fn test_invalid_utf8_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MANIFEST_FILE_NAME);
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        assert!(matches!(
            load_manifest(&path).unwrap_err(),
            Error::ManifestUnreadable { .. }
        ));
    }

    #[test]
    fn test_serialization_excludes_contents() {
        let dir = TempDir::new().unwrap();
        let text = r#"{"name": "charts", "rootDir": "charts/", "private": true}"#;
        let path = write_manifest(&dir, text);

        let manifest = load_manifest(&path).unwrap();
        let value = serde_json::to_value(&manifest).unwrap();

        assert_eq!(
            value,
            serde_json::json!({"name": "charts", "rootDir": "charts/", "private": true})
        );
        assert!(!serde_json::to_string(&manifest).unwrap().contains("contents"));
    }

    #[test]
    fn test_equality_ignores_contents() {
        let path = Path::new("package.json");
        let a = Manifest::from_value(
            path,
            serde_json::json!({"name": "charts"}),
            r#"{"name": "charts"}"#.to_string(),
        )
        .unwrap();
        let b = Manifest::from_value(
            path,
            serde_json::json!({"name": "charts"}),
            "name: charts\n".to_string(),
        )
        .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_search_file_default() {
        let manifest = Manifest::from_value(
            Path::new("package.json"),
            serde_json::json!({"name": "charts"}),
            String::new(),
        )
        .unwrap();

        assert_eq!(manifest.search_file(), None);
        assert_eq!(manifest.search_file_or_default(), DEFAULT_SEARCH_FILE);
    }
}
