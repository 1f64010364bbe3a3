//! Roots command - list discovered override roots.

use super::common::{build_overlay, OverlayArgs};
use crate::error::CliError;

/// Run the roots command.
pub fn run(args: &OverlayArgs) -> Result<(), CliError> {
    let overlay = build_overlay(args)?;

    if overlay.roots().is_empty() {
        println!("No override roots found (marker: {}).", overlay.config().marker.display());
        println!("Resources resolve through the fallback only.");
    } else {
        println!("Override roots (search order):");
        for (i, root) in overlay.roots().iter().enumerate() {
            println!("  {}. {}", i + 1, root);
        }
    }

    println!();
    println!("Resource roots:");
    for url in overlay.list_roots() {
        println!("  {}", url);
    }

    Ok(())
}
