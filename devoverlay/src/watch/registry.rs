//! Watch registry.
//!
//! Maps watch handles to the directories they observe. The registry owns the
//! notify watcher and is owned by exactly one task at a time: the caller at
//! startup, then the watch loop. It is never shared.
//!
//! Several paths can lead to the same directory through symbolic links. The
//! OS keeps one watch per directory, so only one of those paths (the owner)
//! is handed to the watcher. The others are tracked as aliases and dropping
//! one never unwatches the directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{OverlayError, Result};

/// Handle for one watched directory.
///
/// Handles are allocated monotonically and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(u64);

impl std::fmt::Display for WatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "watch#{}", self.0)
    }
}

/// Sender half of the event channel the watcher feeds.
pub type EventSender = mpsc::UnboundedSender<notify::Result<Event>>;

/// Receiver half of the event channel the watcher feeds.
pub type EventReceiver = mpsc::UnboundedReceiver<notify::Result<Event>>;

#[derive(Debug, Clone)]
struct WatchEntry {
    path: PathBuf,
    canonical: PathBuf,
}

/// Registry of watched directories.
pub struct WatchRegistry {
    watcher: RecommendedWatcher,
    entries: HashMap<WatchId, WatchEntry>,
    by_path: HashMap<PathBuf, WatchId>,
    /// Canonical directory to the path the watcher was given for it.
    owners: HashMap<PathBuf, PathBuf>,
    next_id: u64,
}

impl WatchRegistry {
    /// Create a registry whose watcher forwards every event to `events`.
    pub fn new(events: EventSender) -> Result<Self> {
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receiver gone means the loop stopped; nothing left to notify.
            let _ = events.send(res);
        })?;

        Ok(Self {
            watcher,
            entries: HashMap::new(),
            by_path: HashMap::new(),
            owners: HashMap::new(),
            next_id: 0,
        })
    }

    /// Create a registry along with the receiving end of its event channel.
    pub fn with_channel() -> Result<(Self, EventReceiver)> {
        let (tx, rx) = mpsc::unbounded_channel();
        Ok((Self::new(tx)?, rx))
    }

    /// Watch a single directory (non-recursively).
    ///
    /// Returns `Ok(false)` if the path is already watched. A new path to a
    /// directory that is already watched under another path is recorded as
    /// an alias without a second OS watch.
    pub fn register(&mut self, dir: &Path) -> Result<bool> {
        if self.by_path.contains_key(dir) {
            return Ok(false);
        }

        let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        match self.owners.get(&canonical) {
            Some(owner) => {
                debug!(dir = %dir.display(), owner = %owner.display(), "Directory already watched, recording alias");
            }
            None => {
                self.watch_path(dir)
                    .map_err(|source| OverlayError::WatchPath {
                        path: dir.to_path_buf(),
                        source,
                    })?;
                self.owners.insert(canonical.clone(), dir.to_path_buf());
            }
        }

        let id = WatchId(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            id,
            WatchEntry {
                path: dir.to_path_buf(),
                canonical,
            },
        );
        self.by_path.insert(dir.to_path_buf(), id);

        debug!(%id, dir = %dir.display(), "Watching directory");
        Ok(true)
    }

    fn watch_path(&mut self, dir: &Path) -> notify::Result<()> {
        self.watcher.watch(dir, RecursiveMode::NonRecursive)
    }

    /// Find the handle an event path was reported through.
    ///
    /// That is the watch on the path itself (events about a watched
    /// directory) or else the watch on its parent.
    pub fn handle_for(&self, path: &Path) -> Option<WatchId> {
        if let Some(id) = self.by_path.get(path) {
            return Some(*id);
        }
        path.parent().and_then(|parent| self.by_path.get(parent).copied())
    }

    /// Get the directory a handle watches.
    pub fn path(&self, id: WatchId) -> Option<&Path> {
        self.entries.get(&id).map(|entry| entry.path.as_path())
    }

    /// Check whether a directory is watched.
    pub fn contains(&self, dir: &Path) -> bool {
        self.by_path.contains_key(dir)
    }

    /// Drop a handle and every handle watching a directory below it.
    ///
    /// Returns the paths that were dropped. Unwatch failures are expected
    /// (the OS usually dropped the watch along with the directory) and only
    /// logged at debug. When a dropped path owned the OS watch of a directory
    /// that is still reachable through an alias, the watch moves to the alias.
    pub fn remove_tree(&mut self, id: WatchId) -> Vec<PathBuf> {
        let Some(top) = self.entries.get(&id).map(|entry| entry.path.clone()) else {
            return Vec::new();
        };

        let doomed: Vec<WatchId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.path.starts_with(&top))
            .map(|(id, _)| *id)
            .collect();

        let mut removed = Vec::with_capacity(doomed.len());
        let mut orphaned = Vec::new();
        for id in doomed {
            let Some(entry) = self.entries.remove(&id) else {
                continue;
            };
            self.by_path.remove(&entry.path);
            if self.owners.get(&entry.canonical) == Some(&entry.path) {
                orphaned.push(entry.canonical);
            }
            removed.push(entry.path);
        }

        for canonical in orphaned {
            self.release(canonical, &mut removed);
        }

        removed.sort();
        removed
    }

    /// Unwatch a directory whose owning path is gone, then hand the watch to
    /// the first alias that can still be watched. Aliases that cannot are
    /// dropped as well.
    fn release(&mut self, canonical: PathBuf, removed: &mut Vec<PathBuf>) {
        let Some(owner) = self.owners.remove(&canonical) else {
            return;
        };
        if let Err(e) = self.watcher.unwatch(&owner) {
            debug!(dir = %owner.display(), error = %e, "Unwatch failed");
        }

        let mut aliases: Vec<(WatchId, PathBuf)> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.canonical == canonical)
            .map(|(id, entry)| (*id, entry.path.clone()))
            .collect();
        aliases.sort();

        for (id, path) in aliases {
            match self.watch_path(&path) {
                Ok(()) => {
                    debug!(%id, from = %owner.display(), to = %path.display(), "Moved directory watch to alias");
                    self.owners.insert(canonical, path);
                    return;
                }
                Err(e) => {
                    debug!(%id, dir = %path.display(), error = %e, "Alias no longer watchable, dropping");
                    self.entries.remove(&id);
                    self.by_path.remove(&path);
                    removed.push(path);
                }
            }
        }
    }

    /// Watched directories, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.by_path.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Number of watched directories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether nothing is watched.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for WatchRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchRegistry")
            .field("entries", &self.entries.len())
            .field("os_watches", &self.owners.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry() -> WatchRegistry {
        WatchRegistry::with_channel().unwrap().0
    }

    /// A real directory `sub` and a symlink `alias` pointing at it.
    #[cfg(unix)]
    fn aliased_dir(temp: &TempDir) -> (PathBuf, PathBuf) {
        let base = temp.path().canonicalize().unwrap();
        let sub = base.join("sub");
        let alias = base.join("alias");
        std::fs::create_dir(&sub).unwrap();
        std::os::unix::fs::symlink(&sub, &alias).unwrap();
        (sub, alias)
    }

    #[cfg(unix)]
    async fn saw_event_for(rx: &mut EventReceiver, path: &Path) -> bool {
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while let Some(event) = rx.recv().await {
                if event.is_ok_and(|e| e.paths.iter().any(|p| p == path)) {
                    return true;
                }
            }
            false
        })
        .await
        .unwrap_or(false)
    }

    #[test]
    fn test_register_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry();

        assert!(registry.register(temp.path()).unwrap());
        assert!(!registry.register(temp.path()).unwrap());
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(temp.path()));
    }

    #[test]
    fn test_register_missing_directory_fails() {
        let mut registry = registry();
        let result = registry.register(Path::new("/nonexistent/devoverlay/dir"));

        assert!(matches!(result, Err(OverlayError::WatchPath { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_handles_are_not_reused() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        std::fs::create_dir(&a).unwrap();
        std::fs::create_dir(&b).unwrap();
        let mut registry = registry();

        registry.register(&a).unwrap();
        let first = registry.handle_for(&a).unwrap();
        registry.remove_tree(first);
        registry.register(&b).unwrap();
        let second = registry.handle_for(&b).unwrap();

        assert_ne!(first, second);
        assert!(registry.path(first).is_none());
        assert_eq!(registry.path(second), Some(b.as_path()));
    }

    #[test]
    fn test_handle_for_self_and_children() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry();
        registry.register(temp.path()).unwrap();
        let id = registry.handle_for(temp.path()).unwrap();

        assert_eq!(registry.handle_for(&temp.path().join("new.txt")), Some(id));
        assert_eq!(registry.handle_for(&temp.path().join("a/b.txt")), None);
    }

    #[test]
    fn test_remove_tree_drops_descendants_only() {
        let temp = TempDir::new().unwrap();
        let top = temp.path().join("top");
        let nested = top.join("nested");
        let sibling = temp.path().join("topaz");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::create_dir_all(&sibling).unwrap();

        let mut registry = registry();
        for dir in [&top, &nested, &sibling] {
            registry.register(dir).unwrap();
        }

        let id = registry.handle_for(&top).unwrap();
        let removed = registry.remove_tree(id);

        assert_eq!(removed, vec![top.clone(), nested.clone()]);
        assert_eq!(registry.paths(), vec![sibling]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_removing_alias_keeps_target_watched() {
        let temp = TempDir::new().unwrap();
        let (sub, alias) = aliased_dir(&temp);
        let (mut registry, mut rx) = WatchRegistry::with_channel().unwrap();

        assert!(registry.register(&sub).unwrap());
        assert!(registry.register(&alias).unwrap());
        assert_eq!(registry.len(), 2);

        std::fs::remove_file(&alias).unwrap();
        let id = registry.handle_for(&alias).unwrap();
        assert_eq!(registry.remove_tree(id), vec![alias.clone()]);
        assert_eq!(registry.paths(), vec![sub.clone()]);

        let created = sub.join("new.txt");
        std::fs::write(&created, "y").unwrap();
        assert!(saw_event_for(&mut rx, &created).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_removing_owning_alias_moves_watch_to_target() {
        let temp = TempDir::new().unwrap();
        let (sub, alias) = aliased_dir(&temp);
        let (mut registry, mut rx) = WatchRegistry::with_channel().unwrap();

        // The alias is seen first, so it owns the OS watch.
        assert!(registry.register(&alias).unwrap());
        assert!(registry.register(&sub).unwrap());

        std::fs::remove_file(&alias).unwrap();
        let id = registry.handle_for(&alias).unwrap();
        assert_eq!(registry.remove_tree(id), vec![alias.clone()]);
        assert!(registry.contains(&sub));

        let created = sub.join("new.txt");
        std::fs::write(&created, "y").unwrap();
        assert!(saw_event_for(&mut rx, &created).await);
        assert_eq!(registry.handle_for(&created), registry.handle_for(&sub));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_alias_dropped_with_target() {
        let temp = TempDir::new().unwrap();
        let (sub, alias) = aliased_dir(&temp);
        let mut registry = registry();
        registry.register(&sub).unwrap();
        registry.register(&alias).unwrap();

        std::fs::remove_dir(&sub).unwrap();
        let id = registry.handle_for(&sub).unwrap();
        let removed = registry.remove_tree(id);

        assert_eq!(removed, vec![alias, sub]);
        assert!(registry.is_empty());
    }
}
