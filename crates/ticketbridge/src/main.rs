// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticketbridge - a bridge between a Telegram group chat and a Jira project.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ticketbridge_config::{ConfigError, TicketbridgeConfig};

/// Ticketbridge - turn chat messages into Jira issues and mirror Jira back.
#[derive(Parser, Debug)]
#[command(name = "ticketbridge", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default lookup.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bridge: poll Telegram and reconcile with Jira.
    Serve,
    /// Validate the configuration and print it with secrets masked.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<TicketbridgeConfig, Vec<ConfigError>> {
    match path {
        Some(path) => ticketbridge_config::load_and_validate_path(path),
        None => ticketbridge_config::load_and_validate(),
    }
}

/// Effective configuration as TOML, secrets masked.
fn render_config(config: &TicketbridgeConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&config.redacted())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            ticketbridge_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(errors) = ticketbridge_config::validate_for_serve(&config) {
                ticketbridge_config::render_errors(&errors);
                std::process::exit(1);
            }
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("ticketbridge: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig) => match render_config(&config) {
            Ok(rendered) => {
                eprintln!("ticketbridge: config is valid");
                print!("{rendered}");
            }
            Err(e) => {
                eprintln!("ticketbridge: failed to render config: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("ticketbridge: use --help for available commands");
        }
    }
}
