//! Config command - print the effective configuration.

use devoverlay::config::{default_config_path, ENV_HOME, ENV_PROJECT_ROOT, ENV_TOUCH_PATTERN};

use super::common::{load_config, OverlayArgs};
use crate::error::CliError;

/// Run the config command.
pub fn run(args: &OverlayArgs) -> Result<(), CliError> {
    let config = load_config(args)?;

    let ini = args.config.clone().or_else(default_config_path);
    match ini {
        Some(path) if path.is_file() => println!("Config file: {}", path.display()),
        Some(path) => println!("Config file: {} (not present)", path.display()),
        None => println!("Config file: (none)"),
    }
    println!();

    println!("[overlay]");
    let hints: Vec<String> = config
        .hints
        .iter()
        .map(|h| h.display().to_string())
        .collect();
    println!("hints = {}", hints.join(", "));
    println!("marker = {}", config.marker.display());
    println!("compiled_suffixes = {}", config.compiled_suffixes.join(", "));
    println!(
        "touch_pattern = {}",
        config.touch_pattern.as_deref().unwrap_or("")
    );
    println!();

    println!("Environment: {}, {}, {}", ENV_HOME, ENV_PROJECT_ROOT, ENV_TOUCH_PATTERN);
    if let Some(dir) = &args.fallback_dir {
        println!("Fallback directory: {}", dir.display());
    }

    Ok(())
}
