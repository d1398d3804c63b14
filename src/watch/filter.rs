// src/watch/filter.rs

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::{OnchangeError, Result};

/// Decides whether a changed path qualifies to trigger a run.
///
/// A path qualifies when all of the following hold:
/// - its basename does not start with `.` (hidden files never qualify,
///   whatever their extension)
/// - it does not match any configured ignore glob (build outputs)
/// - its extension is in the allow-list
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    /// Lowercase, without a leading dot.
    extensions: Vec<String>,
    ignore: Option<GlobSet>,
}

impl ChangeFilter {
    /// Compile a filter from configuration.
    ///
    /// Extension entries may be given with or without a leading dot.
    pub fn new(extensions: &[String], ignore_patterns: &[String]) -> Result<Self> {
        let extensions = extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();

        let ignore = if ignore_patterns.is_empty() {
            None
        } else {
            Some(build_globset(ignore_patterns)?)
        };

        Ok(Self { extensions, ignore })
    }

    /// Returns true if the given path (relative to the watch root, with
    /// forward slashes, e.g. `"src/main.rs"`) should trigger a run.
    pub fn is_qualifying(&self, rel_path: &str) -> bool {
        let path = Path::new(rel_path);

        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with('.'))
            .unwrap_or(true);
        if hidden {
            return false;
        }

        if let Some(ignore) = &self.ignore {
            if ignore.is_match(rel_path) {
                return false;
            }
        }

        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => self
                .extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).map_err(|err| {
            OnchangeError::Config(format!("invalid ignore glob pattern {pat:?}: {err}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|err| OnchangeError::Config(format!("building ignore glob set: {err}")))
}
