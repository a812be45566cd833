// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tocsin - incident and maintenance notifications for Telegram.
//!
//! This is the binary entry point for the Tocsin bot.

mod serve;
mod state;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tocsin_config::{ConfigError, TocsinConfig};

/// Tocsin - incident and maintenance notifications for Telegram.
#[derive(Parser, Debug)]
#[command(name = "tocsin", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Connect to Telegram and run the bot (the default).
    Serve,
    /// Load and validate the configuration, then exit.
    CheckConfig,
    /// Discard every live alarm, maintenance window and pending reminder.
    ResetState {
        /// Confirm that the state file should be emptied.
        #[arg(long)]
        yes: bool,
    },
}

fn load(path: Option<&Path>) -> Result<TocsinConfig, Vec<ConfigError>> {
    match path {
        Some(path) => tocsin_config::load_and_validate_path(path),
        None => tocsin_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            tocsin_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(errors) = tocsin_config::validate_for_serve(&config) {
                tocsin_config::render_errors(&errors);
                std::process::exit(1);
            }
            serve::run_serve(config).await
        }
        Commands::CheckConfig => {
            match tocsin_config::validate_for_serve(&config) {
                Ok(()) => println!("tocsin: configuration is valid"),
                Err(errors) => {
                    tocsin_config::render_errors(&errors);
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Commands::ResetState { yes } => state::reset_state(&config, yes).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed)
        let config = tocsin_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.bot.name, "tocsin");
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::parse_from(["tocsin"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn reset_state_takes_confirmation_flag() {
        let cli = Cli::parse_from(["tocsin", "reset-state", "--yes", "--config", "/tmp/t.toml"]);
        assert_eq!(cli.command, Some(Commands::ResetState { yes: true }));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/t.toml")));
    }

    #[test]
    fn check_config_parses() {
        let cli = Cli::parse_from(["tocsin", "check-config"]);
        assert_eq!(cli.command, Some(Commands::CheckConfig));
    }
}
