//! Watch command - run the overlay watcher until Ctrl+C.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use super::common::{build_overlay, OverlayArgs};
use crate::error::CliError;

/// Interval between periodic stats lines.
const STATS_INTERVAL: Duration = Duration::from_secs(30);

/// Run the watch command.
pub fn run(args: &OverlayArgs) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("devoverlay-watch")
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let mut overlay = build_overlay(args)?;

    println!("devoverlay v{}", devoverlay::VERSION);
    println!("==================");
    println!();
    for root in overlay.roots() {
        println!("Watching: {}", root);
    }
    match overlay.archives().pattern() {
        Some(pattern) => println!("Touching archives matching: {}", pattern),
        None => println!("Archive touching disabled (no touch pattern)"),
    }
    println!();

    if overlay.roots().is_empty() {
        println!("No override roots found, nothing to watch.");
        return Ok(());
    }

    overlay.start_watching(runtime.handle())?;

    println!("Press Ctrl+C to stop");
    println!();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping watcher...");
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::Signal(e.to_string()))?;

    let mut last_stats = Instant::now();
    let mut last_events = 0;

    while !shutdown.load(Ordering::SeqCst) && overlay.is_watching() {
        std::thread::sleep(Duration::from_millis(100));

        if last_stats.elapsed() >= STATS_INTERVAL {
            if let Some(stats) = overlay.stats() {
                if stats.events != last_events {
                    info!(%stats, "Watcher activity");
                    last_events = stats.events;
                }
            }
            last_stats = Instant::now();
        }
    }

    if let Some(stats) = runtime.block_on(overlay.shutdown()) {
        println!();
        println!("Session Summary");
        println!("───────────────");
        println!("  Directories watched: {}", stats.watched_dirs);
        println!("  Events handled:      {}", stats.events);
        println!("  Root touches:        {}", stats.dir_touches);
        println!("  Archive touches:     {}", stats.archive_touches);
        println!(
            "  Watches added/dropped: {}/{}",
            stats.registrations, stats.removals
        );
    }

    Ok(())
}
