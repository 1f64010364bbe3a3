//! Filesystem watching for override roots.
//!
//! ```text
//! notify thread ──(mpsc)──► WatchLoop task
//!                             ├─ file event ──► touch ancestor roots
//!                             │                 touch touchable archives
//!                             ├─ new directory ► register tree, touch root
//!                             └─ directory gone ► drop its watches
//! ```
//!
//! The loop owns its [`WatchRegistry`]; nothing else reads or writes it once
//! the loop is running.

mod event_loop;
mod events;
mod registrar;
mod registry;
mod stats;

pub use event_loop::{WatchLoop, WatchLoopHandle};
pub use events::{WatchEventKind, WatchInterest};
pub use registrar::{register_all, register_tree};
pub use registry::{EventReceiver, EventSender, WatchId, WatchRegistry};
pub use stats::{WatchStats, WatchStatsSnapshot};
