//! devoverlay CLI - Command-line interface
//!
//! Lists override roots, resolves resource names through the overlay, and
//! runs the watcher that bumps root and archive timestamps on change.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use devoverlay::logging::{init_logging, LoggingConfig};

use commands::common::OverlayArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "devoverlay")]
#[command(version = devoverlay::VERSION)]
#[command(about = "Serve resources straight from module source directories", long_about = None)]
struct Cli {
    #[command(flatten)]
    overlay: OverlayArgs,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List discovered override roots and all resource roots
    Roots,

    /// Resolve resource names through the overlay
    Resolve {
        /// Resource names, e.g. templates/page.ftl
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
    },

    /// Watch override roots and touch them on change until Ctrl+C
    Watch,

    /// Print the effective configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::new(cli.verbose);
    if let Some(path) = &cli.log_file {
        logging = logging.with_file(path);
    }
    let _guard = match init_logging(&logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Roots => commands::roots::run(&cli.overlay),
        Commands::Resolve { names } => commands::resolve::run(&cli.overlay, &names),
        Commands::Watch => commands::watch::run(&cli.overlay),
        Commands::Config => commands::config::run(&cli.overlay),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "devoverlay",
            "resolve",
            "a.txt",
            "b.txt",
            "--hint",
            "/proj",
            "--hint",
            "/other",
            "--touch-pattern",
            ".*\\.jar",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(
            cli.overlay.hints,
            vec![PathBuf::from("/proj"), PathBuf::from("/other")]
        );
        assert_eq!(cli.overlay.touch_pattern.as_deref(), Some(".*\\.jar"));
        match cli.command {
            Commands::Resolve { names } => assert_eq!(names, vec!["a.txt", "b.txt"]),
            other => panic!("expected resolve, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_requires_a_name() {
        assert!(Cli::try_parse_from(["devoverlay", "resolve"]).is_err());
    }
}
