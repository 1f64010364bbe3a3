//! Found-resource cache.
//!
//! Remembers where each resource name last resolved and the modification time
//! seen at that moment. The cache never decides whether a resolution
//! succeeds; it only lets the resolver notice (and log) that a resource moved
//! to another root or that its content changed.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use dashmap::DashMap;

/// Last known location of a resolved resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Resource name as requested.
    pub name: String,

    /// Absolute path the name last resolved to.
    pub location: PathBuf,

    /// Newest modification time observed for the resource.
    pub modified: SystemTime,
}

/// What changed when a resolution was recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    /// No record existed for the name before.
    pub created: bool,

    /// Previous location, if the name now resolves elsewhere.
    pub moved_from: Option<PathBuf>,

    /// Previous modification time, if the resource is newer than recorded.
    pub previous_modified: Option<SystemTime>,
}

impl RecordUpdate {
    /// Check whether the record was left untouched.
    pub fn is_unchanged(&self) -> bool {
        !self.created && self.moved_from.is_none() && self.previous_modified.is_none()
    }
}

/// Concurrent map of resource name to [`ResourceRecord`].
///
/// Records live for the lifetime of the cache; there is no eviction.
#[derive(Debug, Default)]
pub struct FoundResourceCache {
    records: DashMap<String, ResourceRecord>,
}

impl FoundResourceCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `name` resolved to `location` with modification time `modified`.
    ///
    /// The stored location is replaced when it differs; the stored time only
    /// ever moves forward.
    pub fn record(&self, name: &str, location: &Path, modified: SystemTime) -> RecordUpdate {
        let mut update = RecordUpdate::default();

        let mut record = self
            .records
            .entry(name.to_string())
            .or_insert_with(|| {
                update.created = true;
                ResourceRecord {
                    name: name.to_string(),
                    location: location.to_path_buf(),
                    modified,
                }
            });

        if update.created {
            return update;
        }

        if record.location != location {
            update.moved_from = Some(std::mem::replace(
                &mut record.location,
                location.to_path_buf(),
            ));
        }

        if modified > record.modified {
            update.previous_modified = Some(std::mem::replace(&mut record.modified, modified));
        }

        update
    }

    /// Get a copy of the record for `name`.
    pub fn get(&self, name: &str) -> Option<ResourceRecord> {
        self.records.get(name).map(|r| r.value().clone())
    }

    /// Number of distinct names recorded.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copy all records, sorted by name.
    pub fn snapshot(&self) -> Vec<ResourceRecord> {
        let mut records: Vec<ResourceRecord> =
            self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }
}
