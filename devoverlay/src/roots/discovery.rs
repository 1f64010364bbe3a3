//! Override root discovery.
//!
//! Finds the module directories around the configured hints that carry the
//! overlay layout marker (e.g. `src/main/resources`) and turns each into an
//! absolute [`OverrideRoot`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// A directory standing in for a packaged resource root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OverrideRoot {
    /// Name of the module directory the root was found in.
    pub name: String,

    /// Absolute path of the module directory.
    pub base: PathBuf,

    /// Absolute path of the override root (`base` joined with the marker).
    pub path: PathBuf,
}

impl OverrideRoot {
    /// Create a new override root.
    pub fn new(name: impl Into<String>, base: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            base: base.into(),
            path: path.into(),
        }
    }

    /// Get the override root path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether `path` lies at or below this root.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.path)
    }
}

impl std::fmt::Display for OverrideRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}

/// Discovers override roots from directory hints.
#[derive(Debug, Clone)]
pub struct RootDiscovery {
    /// Relative layout marker, e.g. `src/main/resources`.
    marker: PathBuf,
}

impl RootDiscovery {
    /// Create a new discovery for the given layout marker.
    pub fn new(marker: impl Into<PathBuf>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Get the layout marker.
    pub fn marker(&self) -> &Path {
        &self.marker
    }

    /// Check whether `dir` contains the layout marker.
    pub fn is_override_base(&self, dir: &Path) -> bool {
        dir.join(&self.marker).is_dir()
    }

    /// Discover all override roots for the given hints.
    ///
    /// For each hint, the immediate subdirectories of the hint's parent and
    /// of the hint itself are examined, in that order, each listing sorted by
    /// name. Roots are deduplicated on their canonical path; the first
    /// occurrence determines the position in the result, which is the order
    /// resolution searches in.
    ///
    /// Hints that do not exist are skipped. An empty result is not an error.
    pub fn discover<P: AsRef<Path>>(&self, hints: &[P]) -> Vec<OverrideRoot> {
        let mut seen = HashSet::new();
        let mut roots = Vec::new();

        for hint in hints {
            let hint = hint.as_ref();
            let hint = match hint.canonicalize() {
                Ok(h) => h,
                Err(e) => {
                    debug!(hint = %hint.display(), error = %e, "Skipping unusable directory hint");
                    continue;
                }
            };

            let scan_dirs = hint.parent().into_iter().chain(std::iter::once(hint.as_path()));
            for dir in scan_dirs {
                for candidate in list_subdirectories(dir) {
                    if let Some(root) = self.root_for(&candidate) {
                        if seen.insert(root.path.clone()) {
                            debug!(root = %root, "Discovered override root");
                            roots.push(root);
                        }
                    }
                }
            }
        }

        if roots.is_empty() {
            info!(
                marker = %self.marker.display(),
                "No override roots found, resources resolve through the fallback only"
            );
        } else {
            info!(
                count = roots.len(),
                marker = %self.marker.display(),
                "Override roots discovered"
            );
        }

        roots
    }

    /// Build the override root for a candidate module directory, if it has one.
    fn root_for(&self, candidate: &Path) -> Option<OverrideRoot> {
        if !self.is_override_base(candidate) {
            return None;
        }

        let path = candidate.join(&self.marker).canonicalize().ok()?;
        let name = candidate
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Some(OverrideRoot::new(name, candidate, path))
    }
}

/// List immediate subdirectories of `dir`, sorted by name.
///
/// Unreadable directories yield an empty list.
fn list_subdirectories(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            debug!(path = %dir.display(), error = %e, "Failed to list directory");
            return Vec::new();
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}
