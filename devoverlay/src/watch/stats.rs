//! Watch loop counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters updated by the watch loop.
///
/// All counters are lock-free; readers take a [`WatchStatsSnapshot`].
#[derive(Debug, Default)]
pub struct WatchStats {
    watched_dirs: AtomicU64,
    events: AtomicU64,
    dir_touches: AtomicU64,
    archive_touches: AtomicU64,
    registrations: AtomicU64,
    removals: AtomicU64,
}

/// Point-in-time copy of [`WatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchStatsSnapshot {
    /// Directories currently watched.
    pub watched_dirs: u64,
    /// Filesystem events received.
    pub events: u64,
    /// Override root touches that advanced a timestamp.
    pub dir_touches: u64,
    /// Archive touches that advanced a timestamp.
    pub archive_touches: u64,
    /// Directories registered after startup.
    pub registrations: u64,
    /// Watch entries dropped because their directory disappeared.
    pub removals: u64,
}

impl WatchStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_watched_dirs(&self, count: usize) {
        self.watched_dirs.store(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_event(&self) {
        self.events.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dir_touch(&self) {
        self.dir_touches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_archive_touches(&self, count: usize) {
        self.archive_touches.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_registrations(&self, count: usize) {
        self.registrations.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_removals(&self, count: usize) {
        self.removals.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Take a snapshot of all counters.
    pub fn snapshot(&self) -> WatchStatsSnapshot {
        WatchStatsSnapshot {
            watched_dirs: self.watched_dirs.load(Ordering::Relaxed),
            events: self.events.load(Ordering::Relaxed),
            dir_touches: self.dir_touches.load(Ordering::Relaxed),
            archive_touches: self.archive_touches.load(Ordering::Relaxed),
            registrations: self.registrations.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Display for WatchStatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} dirs watched, {} events, {} root touches, {} archive touches, {} registered, {} removed",
            self.watched_dirs,
            self.events,
            self.dir_touches,
            self.archive_touches,
            self.registrations,
            self.removals
        )
    }
}
