//! The assembled resource overlay.
//!
//! [`ResourceOverlay`] wires root discovery, the resolver, the archive tracker
//! and the watcher together from one [`OverlayConfig`]. Hosts route their
//! resource lookups through [`ResourceOverlay::resolve`] and
//! [`ResourceOverlay::list_roots`].

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::info;
use url::Url;

use crate::archive::ArchiveTracker;
use crate::config::OverlayConfig;
use crate::error::Result;
use crate::resolver::{FallbackResolver, FallbackRoots, OverlayResolver, ResourceRecord};
use crate::roots::{OverrideRoot, RootDiscovery};
use crate::watch::{WatchLoop, WatchLoopHandle, WatchStatsSnapshot};

/// Resource overlay for one host.
#[derive(Debug)]
pub struct ResourceOverlay {
    config: OverlayConfig,
    resolver: OverlayResolver,
    watcher: Option<WatchLoopHandle>,
}

impl ResourceOverlay {
    /// Discover override roots and build the resolver.
    ///
    /// Fails only on an invalid touch pattern. No roots is not an error: the
    /// overlay then resolves purely through the fallback.
    pub fn new(
        config: OverlayConfig,
        fallback: impl FallbackResolver + 'static,
        fallback_roots: impl FallbackRoots + 'static,
    ) -> Result<Self> {
        let pattern = config.touch_pattern()?;
        let roots = RootDiscovery::new(&config.marker).discover(config.hints.as_slice());

        let archives = Arc::new(ArchiveTracker::new(pattern));
        let resolver = OverlayResolver::new(roots, fallback, fallback_roots)
            .with_compiled_suffixes(config.compiled_suffixes.clone())
            .with_archive_tracker(archives);

        Ok(Self {
            config,
            resolver,
            watcher: None,
        })
    }

    /// Start watching the override roots on `runtime`.
    ///
    /// Does nothing when there are no roots or the watcher already runs.
    pub fn start_watching(&mut self, runtime: &Handle) -> Result<()> {
        if self.watcher.is_some() {
            return Ok(());
        }
        if self.resolver.roots().is_empty() {
            info!("No override roots, not watching");
            return Ok(());
        }

        let watch_loop = WatchLoop::new(
            self.resolver.shared_roots(),
            Arc::clone(self.resolver.archives()),
        )?;
        self.watcher = Some(watch_loop.spawn(runtime));
        Ok(())
    }

    /// Resolve a resource name. See [`OverlayResolver::resolve`].
    pub fn resolve(&self, name: &str) -> Option<Url> {
        self.resolver.resolve(name)
    }

    /// Override roots followed by the fallback's roots.
    pub fn list_roots(&self) -> &[Url] {
        self.resolver.list_roots()
    }

    /// Override roots in search order.
    pub fn roots(&self) -> &[OverrideRoot] {
        self.resolver.roots()
    }

    /// Resources resolved from override roots so far.
    pub fn records(&self) -> Vec<ResourceRecord> {
        self.resolver.records()
    }

    /// The archive tracker.
    pub fn archives(&self) -> &Arc<ArchiveTracker> {
        self.resolver.archives()
    }

    /// The configuration this overlay was built from.
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Check whether the watcher is running.
    pub fn is_watching(&self) -> bool {
        self.watcher.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Watcher counters, if the watcher was started.
    pub fn stats(&self) -> Option<WatchStatsSnapshot> {
        self.watcher.as_ref().map(WatchLoopHandle::stats)
    }

    /// Stop the watcher and wait for it. Returns its final counters.
    pub async fn shutdown(&mut self) -> Option<WatchStatsSnapshot> {
        match self.watcher.take() {
            Some(watcher) => Some(watcher.stop().await),
            None => None,
        }
    }
}
