//! Configuration for the resource overlay.
//!
//! The overlay needs very little: where to look for module directories, which
//! nested directory marks an override root, which names are compiled artifacts
//! that never live in an overlay, and optionally which packaged archives may be
//! touched when resources change.
//!
//! Values come from the builder methods, from environment variables
//! ([`OverlayConfig::from_env`]) or from an INI file
//! ([`OverlayConfig::from_ini`]):
//!
//! ```ini
//! [overlay]
//! hints = /home/dev/project, /opt/app
//! marker = src/main/resources
//! touch_pattern = .*-SNAPSHOT\.jar
//! compiled_suffixes = .class
//! ```

use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};
use regex::Regex;

use crate::error::{OverlayError, Result};

/// Environment variable naming the installation home directory.
pub const ENV_HOME: &str = "DEVOVERLAY_HOME";

/// Environment variable naming the multi-module project root.
pub const ENV_PROJECT_ROOT: &str = "DEVOVERLAY_PROJECT_ROOT";

/// Environment variable holding the touch pattern.
pub const ENV_TOUCH_PATTERN: &str = "DEVOVERLAY_TOUCH_PATTERN";

/// Relative directory that marks a module as carrying overlay resources.
pub const DEFAULT_MARKER: &str = "src/main/resources";

/// Name suffix of compiled artifacts, which are never served from an overlay.
pub const DEFAULT_COMPILED_SUFFIX: &str = ".class";

/// INI section holding overlay settings.
const INI_SECTION: &str = "overlay";

/// A compiled touch pattern.
///
/// The pattern must match an archive's whole file name for the archive to be
/// touchable.
#[derive(Debug, Clone)]
pub struct TouchPattern {
    source: String,
    regex: Regex,
}

impl TouchPattern {
    /// Compile a touch pattern.
    ///
    /// Returns `Ok(None)` for an empty (or all-whitespace) pattern, which
    /// disables archive touching.
    pub fn compile(pattern: &str) -> Result<Option<Self>> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let regex = Regex::new(&format!("^(?:{})$", trimmed)).map_err(|source| {
            OverlayError::InvalidTouchPattern {
                pattern: trimmed.to_string(),
                source,
            }
        })?;

        Ok(Some(Self {
            source: trimmed.to_string(),
            regex,
        }))
    }

    /// Check whether an archive file name matches.
    pub fn matches_name(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }

    /// Check whether the file name of `path` matches.
    pub fn matches_path(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.matches_name(name))
    }

    /// The pattern as configured (without anchors).
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Display for TouchPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Configuration for the resource overlay.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Directory hints, in priority order.
    ///
    /// For every hint, the subdirectories of both the hint's parent and the
    /// hint itself are considered candidate module directories.
    pub hints: Vec<PathBuf>,

    /// Relative path that marks a module directory as an override base.
    pub marker: PathBuf,

    /// Name suffixes that are always deferred to the fallback resolver.
    pub compiled_suffixes: Vec<String>,

    /// Touch pattern source. Empty or absent disables archive touching.
    pub touch_pattern: Option<String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            hints: Vec::new(),
            marker: PathBuf::from(DEFAULT_MARKER),
            compiled_suffixes: vec![DEFAULT_COMPILED_SUFFIX.to_string()],
            touch_pattern: None,
        }
    }
}

impl OverlayConfig {
    /// Create a configuration with a single directory hint.
    pub fn new(hint: impl Into<PathBuf>) -> Self {
        Self::default().with_hint(hint)
    }

    /// Add a directory hint.
    pub fn with_hint(mut self, hint: impl Into<PathBuf>) -> Self {
        self.hints.push(hint.into());
        self
    }

    /// Set the layout marker.
    pub fn with_marker(mut self, marker: impl Into<PathBuf>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Set the touch pattern. An empty string disables archive touching.
    pub fn with_touch_pattern(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        self.touch_pattern = if pattern.trim().is_empty() {
            None
        } else {
            Some(pattern)
        };
        self
    }

    /// Add a compiled-artifact suffix.
    pub fn with_compiled_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.compiled_suffixes.push(suffix.into());
        self
    }

    /// Build a configuration from the process environment.
    ///
    /// Hints come from [`ENV_HOME`] and [`ENV_PROJECT_ROOT`]; when neither is
    /// set the current working directory is used.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = Self::default();
        for key in [ENV_HOME, ENV_PROJECT_ROOT] {
            if let Some(dir) = get(key) {
                config.hints.push(PathBuf::from(dir));
            }
        }

        if config.hints.is_empty() {
            let cwd = std::env::current_dir().map_err(|source| OverlayError::Io {
                path: PathBuf::from("."),
                source,
            })?;
            config.hints.push(cwd);
        }

        if let Some(pattern) = get(ENV_TOUCH_PATTERN) {
            config = config.with_touch_pattern(pattern);
        }

        // Fail early on a bad pattern rather than when the watcher starts.
        config.touch_pattern()?;

        Ok(config)
    }

    /// Load a configuration from the `[overlay]` section of an INI file.
    ///
    /// Keys not present keep their defaults.
    pub fn from_ini(path: &Path) -> Result<Self> {
        // Backslashes are kept verbatim so regular expressions survive.
        let options = ParseOption {
            enabled_escape: false,
            ..Default::default()
        };
        let ini = Ini::load_from_file_opt(path, options).map_err(|e| match e {
            ini::Error::Io(source) => OverlayError::Io {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(e) => {
                OverlayError::Config(format!("failed to parse {}: {}", path.display(), e))
            }
        })?;

        let mut config = Self::default();
        let Some(section) = ini.section(Some(INI_SECTION)) else {
            return Ok(config);
        };

        if let Some(hints) = section.get("hints") {
            config.hints = split_list(hints).map(PathBuf::from).collect();
        }
        if let Some(marker) = section.get("marker") {
            let marker = marker.trim();
            if marker.is_empty() {
                return Err(OverlayError::Config(
                    "overlay.marker must not be empty".to_string(),
                ));
            }
            config.marker = PathBuf::from(marker);
        }
        if let Some(suffixes) = section.get("compiled_suffixes") {
            config.compiled_suffixes = split_list(suffixes).map(str::to_string).collect();
        }
        if let Some(pattern) = section.get("touch_pattern") {
            config = config.with_touch_pattern(pattern);
        }

        config.touch_pattern()?;

        Ok(config)
    }

    /// Compile the configured touch pattern.
    pub fn touch_pattern(&self) -> Result<Option<TouchPattern>> {
        match &self.touch_pattern {
            Some(pattern) => TouchPattern::compile(pattern),
            None => Ok(None),
        }
    }
}

/// Default location of the INI configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("devoverlay").join("config.ini"))
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}
