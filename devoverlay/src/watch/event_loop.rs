//! The watch event loop.
//!
//! One background task receives notify events for every watched directory
//! and turns them into timestamp touches on the override roots and on
//! touchable archives. The task owns the [`WatchRegistry`] exclusively, so
//! directories created while running are registered without any locking.

use std::path::Path;
use std::sync::Arc;

use notify::Event;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::archive::ArchiveTracker;
use crate::error::Result;
use crate::roots::OverrideRoot;
use crate::touch::{self, TouchOutcome};

use super::events::{WatchEventKind, WatchInterest};
use super::registrar;
use super::registry::{EventReceiver, WatchId, WatchRegistry};
use super::stats::{WatchStats, WatchStatsSnapshot};

/// A watch loop that has registered its watches but is not running yet.
pub struct WatchLoop {
    roots: Arc<[OverrideRoot]>,
    registry: WatchRegistry,
    events: EventReceiver,
    archives: Arc<ArchiveTracker>,
    interest: WatchInterest,
    stats: Arc<WatchStats>,
}

impl WatchLoop {
    /// Create the watcher and register every directory below `roots`.
    ///
    /// Modification events are acted on only when the tracker has a touch
    /// pattern.
    pub fn new(roots: Arc<[OverrideRoot]>, archives: Arc<ArchiveTracker>) -> Result<Self> {
        let interest = WatchInterest::for_touch_pattern(archives.pattern().is_some());
        let (mut registry, events) = WatchRegistry::with_channel()?;
        registrar::register_all(&mut registry, &roots);

        let stats = Arc::new(WatchStats::new());
        stats.set_watched_dirs(registry.len());

        Ok(Self {
            roots,
            registry,
            events,
            archives,
            interest,
            stats,
        })
    }

    /// Get the loop's counters.
    pub fn stats(&self) -> Arc<WatchStats> {
        Arc::clone(&self.stats)
    }

    /// Number of directories currently watched.
    pub fn watched_dirs(&self) -> usize {
        self.registry.len()
    }

    /// Spawn the loop on `runtime`.
    pub fn spawn(self, runtime: &Handle) -> WatchLoopHandle {
        let shutdown = CancellationToken::new();
        let stats = self.stats();
        let task = runtime.spawn(self.run(shutdown.clone()));

        WatchLoopHandle {
            shutdown,
            stats,
            task: Some(task),
        }
    }

    /// Run until `shutdown` is cancelled or the event channel closes.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            roots = self.roots.len(),
            directories = self.registry.len(),
            "Watch loop starting"
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Watch loop interrupted, stopping");
                    break;
                }

                received = self.events.recv() => {
                    match received {
                        Some(Ok(event)) => self.handle_event(event),
                        Some(Err(e)) => warn!(error = %e, "Watcher reported an error"),
                        None => {
                            info!("Watch event channel closed, stopping");
                            break;
                        }
                    }
                }
            }
        }

        info!(stats = %self.stats.snapshot(), "Watch loop stopped");
    }

    fn handle_event(&mut self, event: Event) {
        self.stats.record_event();
        let kind = self.interest.classify(&event.kind);

        for path in &event.paths {
            let Some(handle) = self.registry.handle_for(path) else {
                debug!(path = %path.display(), kind = ?event.kind, "Event for untracked directory, ignoring");
                continue;
            };

            if let Some(kind) = kind {
                debug!(%handle, path = %path.display(), ?kind, "Overlay change");
                self.apply(path, kind);
            }

            self.rearm(handle);
        }
    }

    fn apply(&mut self, path: &Path, kind: WatchEventKind) {
        let Ok(metadata) = std::fs::metadata(path) else {
            // Gone again before we looked.
            return;
        };

        if metadata.is_file() {
            for root in self.ancestor_roots(path) {
                self.touch_root(&root);
            }
            let touched = self.archives.touch_touchable();
            if touched > 0 {
                info!(count = touched, "Touched archives");
                self.stats.record_archive_touches(touched);
            }
        } else if metadata.is_dir() && kind == WatchEventKind::Created {
            for root in self.ancestor_roots(path) {
                let registered = registrar::register_tree(&mut self.registry, path);
                self.stats.record_registrations(registered);
                self.stats.set_watched_dirs(self.registry.len());
                self.touch_root(&root);
            }
        }
    }

    fn ancestor_roots(&self, path: &Path) -> Vec<OverrideRoot> {
        self.roots
            .iter()
            .filter(|root| root.contains(path))
            .cloned()
            .collect()
    }

    fn touch_root(&self, root: &OverrideRoot) {
        match touch::touch(&root.path) {
            Ok(TouchOutcome::Touched { .. }) => {
                info!(root = %root, "Touched override root");
                self.stats.record_dir_touch();
            }
            Ok(TouchOutcome::AlreadyCurrent) => {}
            Err(e) => warn!(root = %root, error = %e, "Failed to touch override root"),
        }
    }

    /// Keep `handle` only while its directory still exists.
    fn rearm(&mut self, handle: WatchId) {
        let Some(dir) = self.registry.path(handle) else {
            return;
        };
        if dir.is_dir() {
            return;
        }

        let removed = self.registry.remove_tree(handle);
        if let Some(first) = removed.first() {
            info!(
                dir = %first.display(),
                dropped = removed.len(),
                "Watched directory disappeared, dropping watch"
            );
        }
        self.stats.record_removals(removed.len());
        self.stats.set_watched_dirs(self.registry.len());
    }
}

impl std::fmt::Debug for WatchLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchLoop")
            .field("roots", &self.roots.len())
            .field("registry", &self.registry)
            .field("interest", &self.interest)
            .finish_non_exhaustive()
    }
}

/// Control handle for a running watch loop.
///
/// Dropping the handle stops the loop.
#[derive(Debug)]
pub struct WatchLoopHandle {
    shutdown: CancellationToken,
    stats: Arc<WatchStats>,
    task: Option<JoinHandle<()>>,
}

impl WatchLoopHandle {
    /// Ask the loop to stop. Returns immediately.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Check whether a stop was requested.
    pub fn is_cancelled(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Check whether the loop task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Current counters.
    pub fn stats(&self) -> WatchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Stop the loop and wait for it to finish.
    pub async fn stop(mut self) -> WatchStatsSnapshot {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Watch loop task failed");
            }
        }
        self.stats.snapshot()
    }
}

impl Drop for WatchLoopHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
