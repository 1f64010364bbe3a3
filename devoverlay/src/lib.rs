//! devoverlay - Serve resources straight from source directories
//!
//! This library lets a running application resolve resources (non-compiled
//! files) from the `src/main/resources` directories of the modules it was built
//! from, instead of from the packaged artifacts. Edits to those files become
//! visible without a rebuild, and a filesystem watcher nudges the timestamps
//! of override roots and packaged archives so that the host's own
//! timestamp-based reload detection kicks in.
//!
//! # Example
//!
//! ```ignore
//! use devoverlay::{NoFallback, OverlayConfig, ResourceOverlay};
//!
//! let config = OverlayConfig::from_env()?;
//! let mut overlay = ResourceOverlay::new(config, NoFallback, NoFallback)?;
//! overlay.start_watching(&tokio::runtime::Handle::current())?;
//!
//! if let Some(url) = overlay.resolve("templates/page.ftl") {
//!     println!("serving {}", url);
//! }
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod location;
pub mod logging;
pub mod overlay;
pub mod resolver;
pub mod roots;
pub mod touch;
pub mod watch;

pub use config::{OverlayConfig, TouchPattern};
pub use error::{OverlayError, Result};
pub use overlay::ResourceOverlay;
pub use resolver::{FallbackResolver, FallbackRoots, NoFallback, OverlayResolver};
pub use roots::{OverrideRoot, RootDiscovery};

/// Library version, as published in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
