// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wren - an agent runtime with persistent conversations.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use wren::Runtime;
use wren::serve::run_serve;
use wren::shell::run_shell;
use wren_config::model::WrenConfig;
use wren_core::WrenError;

#[derive(Parser, Debug)]
#[command(name = "wren", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run all configured channels until interrupted.
    Serve,
    /// Start an interactive session in this terminal (the default).
    Shell,
    /// Send one message and print the reply.
    Send {
        /// Chat to send as; each chat keeps its own conversations.
        #[arg(long, default_value = "local")]
        chat: String,
        /// The message, or a `/command`.
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => wren_config::load_and_validate_path(path),
        None => wren_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            wren_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let command = cli.command.unwrap_or(Commands::Shell);
    // Log lines would interleave with the prompt.
    let level = match command {
        Commands::Shell => "warn".to_string(),
        _ => config.agent.log_level.clone(),
    };
    init_tracing(&level);

    let result = match command {
        Commands::Serve => run_serve(config).await,
        Commands::Shell => run_shell(config).await,
        Commands::Send { chat, message } => send(config, &chat, &message.join(" ")).await,
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

async fn send(config: WrenConfig, chat: &str, text: &str) -> Result<(), WrenError> {
    let runtime = Runtime::from_config(config).await?;
    let reply = runtime.send(chat, text).await;
    runtime.close().await?;
    println!("{}", reply?);
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wren={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_joins_message_words() {
        let cli = Cli::parse_from(["wren", "send", "--chat", "c1", "/label", "work"]);
        match cli.command {
            Some(Commands::Send { chat, message }) => {
                assert_eq!(chat, "c1");
                assert_eq!(message.join(" "), "/label work");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_shell() {
        let cli = Cli::parse_from(["wren"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
