//! Resolve command - show where resource names resolve to.

use super::common::{build_overlay, OverlayArgs};
use crate::error::CliError;

/// Run the resolve command.
///
/// Every name is resolved once; misses are reported, not treated as errors.
pub fn run(args: &OverlayArgs, names: &[String]) -> Result<(), CliError> {
    let overlay = build_overlay(args)?;

    let width = names.iter().map(String::len).max().unwrap_or(0);
    for name in names {
        match overlay.resolve(name) {
            Some(url) => println!("{:width$}  {}", name, url, width = width),
            None => println!("{:width$}  (not found)", name, width = width),
        }
    }

    let tracked = overlay.archives().len();
    if tracked > 0 {
        println!();
        println!("Archives seen through the fallback: {}", tracked);
        for archive in overlay.archives().touchable() {
            println!("  touchable: {}", archive.display());
        }
    }

    Ok(())
}
