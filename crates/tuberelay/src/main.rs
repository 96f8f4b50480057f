// SPDX-FileCopyrightText: 2026 Tuberelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tuberelay - a Telegram to YouTube bridging bot.
//!
//! This is the binary entry point for the bot.

mod commands;
mod reset;
mod serve;
mod shutdown;
mod status;

use clap::{Parser, Subcommand};

/// Tuberelay - a Telegram to YouTube bridging bot.
#[derive(Parser, Debug)]
#[command(name = "tuberelay", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot (default).
    Serve,
    /// Show the local deployment status.
    Status {
        /// Output structured JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Delete the stored YouTube credential.
    ResetAuth {
        /// Also delete the admin record.
        #[arg(long)]
        admin: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match tuberelay_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            tuberelay_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) | None => serve::run_serve(config).await,
        Some(Commands::Status { json }) => status::run_status(&config, json),
        Some(Commands::ResetAuth { admin }) => reset::run_reset_auth(&config, admin),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed).
        let config = tuberelay_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.bot.name, "tuberelay");
    }
}
