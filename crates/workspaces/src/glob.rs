//! Gitignore-aware glob expansion.
//!
//! [`GitignoreGlob`] walks the base directory with the `ignore` crate and
//! matches every regular file against compiled `globset` patterns.

use crate::core::traits::GlobEngine;
use crate::core::types::GlobOptions;
use crate::error::{Error, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// Directories never descended into.
const PRUNED_DIRS: [&str; 1] = ["node_modules"];

/// Default [`GlobEngine`] backed by `globset` and `ignore`.
///
/// - `*` never crosses a `/`; `**` spans any number of directories
/// - a `!pattern` excludes matches; unless it starts with `/` it also
///   matches at any depth, so `!pkg/Chart.yaml` excludes `charts/pkg/Chart.yaml`
/// - wildcards never match a name starting with `.`; such entries are only
///   reached through a pattern segment that itself starts with `.`
/// - `node_modules` is never descended into
/// - with [`GlobOptions::gitignore`] set, `.gitignore` files are honored even
///   outside a git repository
/// - results are sorted and free of duplicates
#[derive(Debug, Default, Clone, Copy)]
pub struct GitignoreGlob;

impl GlobEngine for GitignoreGlob {
    fn expand(&self, patterns: &[String], options: &GlobOptions) -> Result<Vec<PathBuf>> {
        let compiled = CompiledPatterns::new(patterns)?;
        if compiled.include_count == 0 {
            tracing::debug!("No inclusion patterns, nothing to expand");
            return Ok(Vec::new());
        }

        let dot_names = compiled.dot_names.clone();
        let mut builder = WalkBuilder::new(&options.cwd);
        builder
            .standard_filters(true)
            .hidden(false)
            .ignore(false)
            .git_global(false)
            .git_exclude(false)
            .git_ignore(options.gitignore)
            .require_git(false)
            .parents(false)
            .follow_links(false)
            .max_depth(compiled.max_depth)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let Some(name) = entry.file_name().to_str() else {
                    return true;
                };
                if PRUNED_DIRS.contains(&name) {
                    return false;
                }
                !name.starts_with('.') || dot_names.is_match(name)
            });

        let mut matched = BTreeSet::new();
        let mut visited: u64 = 0;

        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Error during directory scan");
                    continue;
                }
            };
            visited += 1;

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let Ok(rel) = entry.path().strip_prefix(&options.cwd) else {
                continue;
            };
            let Some(rel_norm) = to_slash_path(rel) else {
                continue;
            };

            if compiled.include.is_match(rel_norm.as_str())
                && !compiled.exclude.is_match(rel_norm.as_str())
            {
                let found = if options.absolute {
                    entry.path().to_path_buf()
                } else {
                    PathBuf::from(rel_norm)
                };
                matched.insert(found);
            }
        }

        tracing::debug!(
            cwd = %options.cwd.display(),
            entries_visited = visited,
            files_matched = matched.len(),
            "Glob expansion complete"
        );

        Ok(matched.into_iter().collect())
    }
}

struct CompiledPatterns {
    include: GlobSet,
    include_count: usize,
    exclude: GlobSet,
    /// Inclusion segments that start with a literal `.`.
    dot_names: GlobSet,
    max_depth: Option<usize>,
}

impl CompiledPatterns {
    fn new(patterns: &[String]) -> Result<Self> {
        let mut include = GlobSetBuilder::new();
        let mut exclude = GlobSetBuilder::new();
        let mut dot_names = GlobSetBuilder::new();
        let mut include_count = 0;
        let mut max_depth = Some(0);

        for raw in patterns {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            if let Some(negated) = raw.strip_prefix('!') {
                let negated = negated.strip_prefix("./").unwrap_or(negated);
                if let Some(anchored) = negated.strip_prefix('/') {
                    exclude.add(compile(anchored)?);
                } else {
                    exclude.add(compile(negated)?);
                    if !negated.starts_with("**/") {
                        exclude.add(compile(&format!("**/{negated}"))?);
                    }
                }
                continue;
            }

            let pattern = raw.strip_prefix("./").unwrap_or(raw);
            let pattern = pattern.strip_prefix('/').unwrap_or(pattern);
            include.add(compile(pattern)?);
            include_count += 1;

            for segment in pattern.split('/') {
                if segment.starts_with('.') && segment != "." && segment != ".." {
                    dot_names.add(compile(segment)?);
                }
            }

            max_depth = match max_depth {
                Some(depth) if !pattern.contains("**") => {
                    Some(depth.max(pattern.split('/').filter(|s| !s.is_empty()).count()))
                }
                _ => None,
            };
        }

        Ok(Self {
            include: build_set(include)?,
            include_count,
            exclude: build_set(exclude)?,
            dot_names: build_set(dot_names)?,
            max_depth,
        })
    }
}

fn compile(pattern: &str) -> Result<globset::Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| Error::InvalidGlobPattern {
            pattern: pattern.to_string(),
            message: e.kind().to_string(),
        })
}

fn build_set(builder: GlobSetBuilder) -> Result<GlobSet> {
    builder.build().map_err(|e| Error::InvalidGlobPattern {
        pattern: e.glob().unwrap_or_default().to_string(),
        message: e.kind().to_string(),
    })
}

/// Escapes `literal` so it only matches itself.
///
/// `globset::escape` leaves alternation braces alone, so they are bracketed
/// here as well.
pub(crate) fn escape_literal(literal: &str) -> String {
    globset::escape(literal)
        .replace('{', "[{]")
        .replace('}', "[}]")
}

/// Joins the components of a relative `path` with `/`.
///
/// `.` components are dropped. Returns `None` if `path` is absolute or climbs
/// out through `..`.
pub(crate) fn to_slash_path(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(parts.join("/"))
}
