//! Override root discovery.
//!
//! An override root is a directory standing in for a packaged resource root
//! during development. Roots are found next to and below the configured
//! directory hints:
//!
//! ```text
//! ~/project/                     # hint (or the hint's parent)
//! ├── core/
//! │   └── src/main/resources/    # override root
//! ├── webapp/
//! │   └── src/main/resources/    # override root
//! └── docs/                      # no marker, ignored
//! ```
//!
//! Discovery runs once; the resulting ordered list is immutable and shared by
//! the resolver and the watcher.

mod discovery;

pub use discovery::{OverrideRoot, RootDiscovery};
