//! The overlay resolver.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

use tracing::{debug, info, warn};
use url::Url;

use crate::archive::ArchiveTracker;
use crate::config::DEFAULT_COMPILED_SUFFIX;
use crate::location;
use crate::roots::OverrideRoot;

use super::cache::{FoundResourceCache, RecordUpdate, ResourceRecord};
use super::fallback::{FallbackResolver, FallbackRoots};

/// Resolves resource names against override roots, then the host fallback.
///
/// Roots are searched in discovery order and the first readable match wins.
/// The resolver is safe to share between threads; every call checks the live
/// filesystem, the cache only records what was found.
pub struct OverlayResolver {
    roots: Arc<[OverrideRoot]>,
    compiled_suffixes: Vec<String>,
    fallback: Box<dyn FallbackResolver>,
    fallback_roots: Box<dyn FallbackRoots>,
    cache: Arc<FoundResourceCache>,
    archives: Arc<ArchiveTracker>,
    root_urls: OnceLock<Vec<Url>>,
}

impl OverlayResolver {
    /// Create a resolver over `roots` with the given host fallbacks.
    ///
    /// Names ending in `.class` are deferred to the fallback; use
    /// [`with_compiled_suffixes`](Self::with_compiled_suffixes) to change that.
    pub fn new(
        roots: impl Into<Arc<[OverrideRoot]>>,
        fallback: impl FallbackResolver + 'static,
        fallback_roots: impl FallbackRoots + 'static,
    ) -> Self {
        Self {
            roots: roots.into(),
            compiled_suffixes: vec![DEFAULT_COMPILED_SUFFIX.to_string()],
            fallback: Box::new(fallback),
            fallback_roots: Box::new(fallback_roots),
            cache: Arc::new(FoundResourceCache::new()),
            archives: Arc::new(ArchiveTracker::new(None)),
            root_urls: OnceLock::new(),
        }
    }

    /// Replace the compiled-artifact suffixes.
    pub fn with_compiled_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.compiled_suffixes = suffixes;
        self
    }

    /// Share an archive tracker (typically with the watcher).
    pub fn with_archive_tracker(mut self, archives: Arc<ArchiveTracker>) -> Self {
        self.archives = archives;
        self
    }

    /// Resolve a resource name to a location.
    ///
    /// Compiled artifacts go straight to the fallback. Otherwise the first
    /// override root holding a readable `root/name` wins; when none does the
    /// fallback's answer is returned, which may be `None`.
    pub fn resolve(&self, name: &str) -> Option<Url> {
        if self.is_compiled_artifact(name) {
            debug!(name, "Compiled artifact, deferring to fallback");
        } else if let Some(url) = self.resolve_override(name) {
            return Some(url);
        }

        self.resolve_fallback(name)
    }

    /// List all resource roots: override roots first, then the fallback's.
    ///
    /// Computed on first call and reused afterwards.
    pub fn list_roots(&self) -> &[Url] {
        self.root_urls.get_or_init(|| {
            let mut urls: Vec<Url> = self
                .roots
                .iter()
                .filter_map(|root| {
                    let url = location::dir_url(&root.path);
                    if url.is_none() {
                        warn!(root = %root.path.display(), "Override root is not a valid location");
                    }
                    url
                })
                .collect();
            urls.extend(self.fallback_roots.roots());
            urls
        })
    }

    /// Check whether `name` is a compiled artifact.
    pub fn is_compiled_artifact(&self, name: &str) -> bool {
        self.compiled_suffixes
            .iter()
            .any(|suffix| !suffix.is_empty() && name.ends_with(suffix.as_str()))
    }

    /// Get the override roots, in search order.
    pub fn roots(&self) -> &[OverrideRoot] {
        &self.roots
    }

    /// Get a shared handle to the override roots.
    pub fn shared_roots(&self) -> Arc<[OverrideRoot]> {
        Arc::clone(&self.roots)
    }

    /// Get the found-resource cache.
    pub fn cache(&self) -> &Arc<FoundResourceCache> {
        &self.cache
    }

    /// Get the archive tracker.
    pub fn archives(&self) -> &Arc<ArchiveTracker> {
        &self.archives
    }

    /// Copy of every resource record, sorted by name.
    pub fn records(&self) -> Vec<ResourceRecord> {
        self.cache.snapshot()
    }

    fn resolve_override(&self, name: &str) -> Option<Url> {
        for root in self.roots.iter() {
            let candidate = override_candidate(&root.path, name);

            let file = match File::open(&candidate) {
                Ok(f) => f,
                Err(_) => continue,
            };

            let metadata = file.metadata().ok();
            let is_dir = metadata.as_ref().is_some_and(|m| m.is_dir());

            // Directory locations end in a slash so relative joins stay inside.
            let url = if is_dir {
                location::dir_url(&candidate)
            } else {
                location::file_url(&candidate)
            };
            let Some(url) = url else {
                warn!(name, path = %candidate.display(), "Malformed resource location, skipping root");
                continue;
            };

            let modified = metadata
                .and_then(|m| m.modified().ok())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            let update = self.cache.record(name, &candidate, modified);
            log_update(name, &candidate, &update);

            return Some(url);
        }

        None
    }

    fn resolve_fallback(&self, name: &str) -> Option<Url> {
        let url = self.fallback.resolve(name)?;
        if let Some(archive) = self.archives.observe_url(&url) {
            debug!(name, archive = %archive.display(), "Resolved from packaged archive");
        }
        Some(url)
    }
}

impl std::fmt::Debug for OverlayResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayResolver")
            .field("roots", &self.roots)
            .field("compiled_suffixes", &self.compiled_suffixes)
            .field("records", &self.cache.len())
            .field("archives", &self.archives.len())
            .finish_non_exhaustive()
    }
}

/// Path a resource name maps to below an override root.
///
/// Leading slashes are dropped so the name is always joined, never replaces
/// the root.
pub fn override_candidate(root: &Path, name: &str) -> PathBuf {
    root.join(name.trim_start_matches('/'))
}

fn log_update(name: &str, path: &Path, update: &RecordUpdate) {
    if update.created {
        debug!(name, path = %path.display(), "Resolved from override root");
        return;
    }

    if let Some(previous) = &update.moved_from {
        info!(
            name,
            from = %previous.display(),
            to = %path.display(),
            "Resource path changed"
        );
    }

    if update.previous_modified.is_some() {
        info!(name, path = %path.display(), "Resource content changed");
    }
}
