//! The touch primitive.
//!
//! Touching forces a file or directory's modification time forward to "now",
//! which is what the host's timestamp-based reload detection watches for.

use std::path::Path;
use std::time::SystemTime;

use filetime::FileTime;

use crate::error::{OverlayError, Result};

/// Result of a touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchOutcome {
    /// The modification time was advanced.
    Touched {
        /// Modification time before the touch.
        previous: SystemTime,
        /// Modification time after the touch.
        now: SystemTime,
    },

    /// The modification time was already at or after "now".
    AlreadyCurrent,
}

impl TouchOutcome {
    /// Check whether the timestamp was changed.
    pub fn was_touched(&self) -> bool {
        matches!(self, TouchOutcome::Touched { .. })
    }
}

/// Advance the modification time of `path` to the current time.
pub fn touch(path: &Path) -> Result<TouchOutcome> {
    touch_at(path, SystemTime::now())
}

/// Advance the modification time of `path` to `now` unless it is already newer.
pub fn touch_at(path: &Path, now: SystemTime) -> Result<TouchOutcome> {
    let to_error = |source| OverlayError::Touch {
        path: path.to_path_buf(),
        source,
    };

    let previous = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(to_error)?;

    if previous >= now {
        return Ok(TouchOutcome::AlreadyCurrent);
    }

    filetime::set_file_mtime(path, FileTime::from_system_time(now)).map_err(to_error)?;

    Ok(TouchOutcome::Touched { previous, now })
}
