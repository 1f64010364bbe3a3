//! Archive tracker.
//!
//! Whenever the fallback resolver hands out a location inside a packaged
//! archive (a `jar:file:...!/entry` URL), the archive itself is remembered
//! here. When overlay resources change, archives whose file name matches the
//! touch pattern are touched so the host reloads them.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use dashmap::DashMap;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::TouchPattern;
use crate::location;
use crate::touch::{self, TouchOutcome};

/// Last known state of a packaged archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    /// Absolute path of the archive file.
    pub location: PathBuf,

    /// Modification time when first seen, or after the latest touch.
    pub modified: SystemTime,
}

/// Concurrent registry of archives seen through fallback resolution.
#[derive(Debug, Default)]
pub struct ArchiveTracker {
    archives: DashMap<PathBuf, ArchiveRecord>,
    pattern: Option<TouchPattern>,
}

impl ArchiveTracker {
    /// Create a tracker. Without a pattern, no archive is ever touched.
    pub fn new(pattern: Option<TouchPattern>) -> Self {
        Self {
            archives: DashMap::new(),
            pattern,
        }
    }

    /// Get the touch pattern.
    pub fn pattern(&self) -> Option<&TouchPattern> {
        self.pattern.as_ref()
    }

    /// Track the archive containing `url`, if any.
    ///
    /// Returns the archive path for archive-contained URLs.
    pub fn observe_url(&self, url: &Url) -> Option<PathBuf> {
        let path = location::archive_path(url)?;
        self.observe(&path);
        Some(path)
    }

    /// Track an archive. Returns `true` if it was not tracked before.
    pub fn observe(&self, path: &Path) -> bool {
        if self.archives.contains_key(path) {
            return false;
        }

        let mut created = false;
        self.archives.entry(path.to_path_buf()).or_insert_with(|| {
            created = true;
            ArchiveRecord {
                location: path.to_path_buf(),
                modified: std::fs::metadata(path)
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH),
            }
        });

        if created {
            if self.is_touchable(path) {
                info!(archive = %path.display(), "Tracking touchable archive");
            } else {
                debug!(archive = %path.display(), "Tracking archive");
            }
        }

        created
    }

    /// Check whether an archive's file name matches the touch pattern.
    pub fn is_touchable(&self, path: &Path) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.matches_path(path))
    }

    /// Paths of all tracked archives that are currently touchable, sorted.
    pub fn touchable(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .archives
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|path| self.is_touchable(path))
            .collect();
        paths.sort();
        paths
    }

    /// Touch every touchable archive.
    ///
    /// Failures are logged and skipped. Returns the number of archives whose
    /// timestamp was advanced.
    pub fn touch_touchable(&self) -> usize {
        let mut touched = 0;

        for path in self.touchable() {
            match touch::touch(&path) {
                Ok(TouchOutcome::Touched { now, .. }) => {
                    if let Some(mut record) = self.archives.get_mut(&path) {
                        record.modified = now;
                    }
                    debug!(archive = %path.display(), "Touched archive");
                    touched += 1;
                }
                Ok(TouchOutcome::AlreadyCurrent) => {}
                Err(e) => {
                    warn!(archive = %path.display(), error = %e, "Failed to touch archive");
                }
            }
        }

        touched
    }

    /// Get a copy of the record for an archive.
    pub fn get(&self, path: &Path) -> Option<ArchiveRecord> {
        self.archives.get(path).map(|r| r.value().clone())
    }

    /// Number of tracked archives.
    pub fn len(&self) -> usize {
        self.archives.len()
    }

    /// Check whether no archive is tracked.
    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }
}
