//! Resource resolution with source-directory overrides.
//!
//! ```text
//! resolve(name)
//!   ├─ compiled artifact? ──────────────► fallback
//!   ├─ root[0]/name readable? ──────────► file:// location
//!   ├─ root[1]/name readable? ──────────► file:// location
//!   └─ otherwise ───────────────────────► fallback (archive tracked)
//! ```

mod cache;
mod fallback;
mod resolve;

pub use cache::{FoundResourceCache, RecordUpdate, ResourceRecord};
pub use fallback::{FallbackResolver, FallbackRoots, NoFallback, StaticRoots};
pub use resolve::{override_candidate, OverlayResolver};
