//! Common types and utilities shared across CLI commands.

use std::path::{Path, PathBuf};

use clap::Args;
use devoverlay::config::default_config_path;
use devoverlay::location;
use devoverlay::resolver::override_candidate;
use devoverlay::{FallbackResolver, FallbackRoots, OverlayConfig, ResourceOverlay};
use url::Url;

use crate::error::CliError;

/// Overlay options accepted by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct OverlayArgs {
    /// Directory hint; its parent and itself are scanned for modules (repeatable)
    #[arg(long = "hint", value_name = "DIR", global = true)]
    pub hints: Vec<PathBuf>,

    /// Layout marker identifying a module's resource directory
    #[arg(long, value_name = "PATH", global = true)]
    pub marker: Option<PathBuf>,

    /// Regex matched against archive file names to touch (empty disables)
    #[arg(long, value_name = "REGEX", global = true)]
    pub touch_pattern: Option<String>,

    /// INI configuration file (default: the user config directory)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory standing in for the host's packaged resources
    #[arg(long, value_name = "DIR", global = true)]
    pub fallback_dir: Option<PathBuf>,
}

/// Build the effective configuration.
///
/// Base values come from the INI file when one is given or present at the
/// default location, otherwise from the environment. Command-line values
/// override either.
pub fn load_config(args: &OverlayArgs) -> Result<OverlayConfig, CliError> {
    let ini = args
        .config
        .clone()
        .or_else(|| default_config_path().filter(|p| p.is_file()));

    let mut config = match &ini {
        Some(path) => OverlayConfig::from_ini(path)?,
        None => OverlayConfig::from_env()?,
    };

    if config.hints.is_empty() && args.hints.is_empty() {
        config.hints = OverlayConfig::from_env()?.hints;
    }

    apply_overrides(config, args)
}

/// Apply command-line overrides on top of a base configuration.
pub fn apply_overrides(
    mut config: OverlayConfig,
    args: &OverlayArgs,
) -> Result<OverlayConfig, CliError> {
    if !args.hints.is_empty() {
        config.hints = args.hints.clone();
    }
    if let Some(marker) = &args.marker {
        if marker.as_os_str().is_empty() {
            return Err(CliError::Config("--marker must not be empty".to_string()));
        }
        config.marker = marker.clone();
    }
    if let Some(pattern) = &args.touch_pattern {
        config = config.with_touch_pattern(pattern.as_str());
    }

    config.touch_pattern()?;
    Ok(config)
}

/// Build the overlay for a command.
pub fn build_overlay(args: &OverlayArgs) -> Result<ResourceOverlay, CliError> {
    let config = load_config(args)?;
    let fallback = DirectoryFallback::new(args.fallback_dir.clone())?;
    Ok(ResourceOverlay::new(config, fallback.clone(), fallback)?)
}

/// Host fallback backed by a plain directory, or by nothing.
#[derive(Debug, Clone, Default)]
pub struct DirectoryFallback {
    dir: Option<PathBuf>,
}

impl DirectoryFallback {
    /// Create a fallback serving files below `dir`.
    pub fn new(dir: Option<PathBuf>) -> Result<Self, CliError> {
        let dir = match dir {
            Some(dir) => Some(dir.canonicalize().map_err(|e| {
                CliError::Config(format!("fallback directory {}: {}", dir.display(), e))
            })?),
            None => None,
        };
        Ok(Self { dir })
    }

    /// The fallback directory, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }
}

impl FallbackResolver for DirectoryFallback {
    fn resolve(&self, name: &str) -> Option<Url> {
        let candidate = override_candidate(self.dir.as_deref()?, name);
        if candidate.is_file() {
            location::file_url(&candidate)
        } else {
            None
        }
    }
}

impl FallbackRoots for DirectoryFallback {
    fn roots(&self) -> Vec<Url> {
        self.dir
            .as_deref()
            .and_then(location::dir_url)
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_overrides_replace_base_values() {
        let base = OverlayConfig::new("/from/env").with_touch_pattern(".*\\.jar");
        let args = OverlayArgs {
            hints: vec![PathBuf::from("/from/cli")],
            marker: Some(PathBuf::from("resources")),
            touch_pattern: Some(String::new()),
            ..Default::default()
        };

        let config = apply_overrides(base, &args).unwrap();

        assert_eq!(config.hints, vec![PathBuf::from("/from/cli")]);
        assert_eq!(config.marker, PathBuf::from("resources"));
        assert!(config.touch_pattern.is_none());
    }

    #[test]
    fn test_no_overrides_keep_base_values() {
        let base = OverlayConfig::new("/from/env").with_touch_pattern("app\\.jar");

        let config = apply_overrides(base, &OverlayArgs::default()).unwrap();

        assert_eq!(config.hints, vec![PathBuf::from("/from/env")]);
        assert_eq!(config.touch_pattern.as_deref(), Some("app\\.jar"));
    }

    #[test]
    fn test_invalid_pattern_override_is_rejected() {
        let args = OverlayArgs {
            touch_pattern: Some("[".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            apply_overrides(OverlayConfig::default(), &args),
            Err(CliError::Overlay(_))
        ));
    }

    #[test]
    fn test_explicit_ini_is_used() {
        let temp = TempDir::new().unwrap();
        let ini = temp.path().join("config.ini");
        std::fs::write(&ini, "[overlay]\nhints = /from/ini\nmarker = res\n").unwrap();
        let args = OverlayArgs {
            config: Some(ini),
            ..Default::default()
        };

        let config = load_config(&args).unwrap();

        assert_eq!(config.hints, vec![PathBuf::from("/from/ini")]);
        assert_eq!(config.marker, PathBuf::from("res"));
    }

    #[test]
    fn test_directory_fallback() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("packaged.txt"), "p").unwrap();
        let fallback = DirectoryFallback::new(Some(temp.path().to_path_buf())).unwrap();

        let url = fallback.resolve("/packaged.txt").unwrap();
        assert_eq!(
            url.to_file_path().unwrap(),
            temp.path().canonicalize().unwrap().join("packaged.txt")
        );
        assert!(fallback.resolve("missing.txt").is_none());
        assert_eq!(fallback.roots().len(), 1);
    }

    #[test]
    fn test_no_fallback_directory() {
        let fallback = DirectoryFallback::new(None).unwrap();
        assert!(fallback.dir().is_none());
        assert!(fallback.resolve("a.txt").is_none());
        assert!(fallback.roots().is_empty());
    }

    #[test]
    fn test_missing_fallback_directory_is_config_error() {
        let result = DirectoryFallback::new(Some(PathBuf::from("/nonexistent/devoverlay")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
