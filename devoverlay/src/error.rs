//! Error types for overlay setup and filesystem operations.
//!
//! Resolution itself never fails (misses degrade to "not found"); these errors
//! surface from configuration, watcher setup, and the touch primitive.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for overlay operations.
pub type Result<T> = std::result::Result<T, OverlayError>;

/// Errors that can occur while setting up or running the overlay.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Failed to read a file or directory.
    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    /// The configured touch pattern is not a valid regular expression.
    #[error("invalid touch pattern '{pattern}': {source}")]
    InvalidTouchPattern {
        pattern: String,
        source: regex::Error,
    },

    /// The filesystem watcher could not be created.
    #[error("filesystem watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// A directory could not be registered with the watcher.
    #[error("failed to watch {}: {source}", .path.display())]
    WatchPath {
        path: PathBuf,
        source: notify::Error,
    },

    /// Failed to advance a modification time.
    #[error("failed to touch {}: {source}", .path.display())]
    Touch { path: PathBuf, source: io::Error },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_error_display_includes_path() {
        let err = OverlayError::Touch {
            path: PathBuf::from("/proj/a/src/main/resources"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = err.to_string();
        assert!(message.contains("/proj/a/src/main/resources"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_invalid_pattern_display() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = OverlayError::InvalidTouchPattern {
            pattern: "(".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("invalid touch pattern '('"));
    }
}
