//! Command-line interface definition and dispatch for chatwire.
//!
//! Uses [`clap`] derive macros. Chat history operations live in the
//! [`history`] submodule.

mod history;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::chat::{self, ChatOptions};
use crate::config::Config;
use crate::history::ExportFormat;
use crate::provider::{self, CompletionClient};

/// Top-level CLI structure for chatwire.
#[derive(Parser)]
#[command(
    name = "chatwire",
    version,
    about = "Chat with streamed LLM completions and approve tool calls"
)]
pub struct Cli {
    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by `chat` and `ask`.
#[derive(Args, Debug, Clone)]
pub struct TurnArgs {
    /// Model to use (overrides config)
    #[arg(short, long)]
    pub model: Option<String>,
    /// Conversation mode (standard, creative, technical, analytical, or a configured one)
    #[arg(long)]
    pub mode: Option<String>,
    /// Enable a tool for this run (repeatable)
    #[arg(short, long = "tool", value_name = "NAME")]
    pub tools: Vec<String>,
}

impl From<TurnArgs> for ChatOptions {
    fn from(args: TurnArgs) -> Self {
        ChatOptions {
            model: args.model,
            mode: args.mode,
            tools: args.tools,
        }
    }
}

/// Available subcommands. The `///` comments double as `--help` text.
#[derive(Subcommand)]
pub enum Commands {
    /// Ask a one-shot question (not saved to history)
    Ask {
        /// The question to ask
        prompt: Vec<String>,
        #[command(flatten)]
        turn: TurnArgs,
        /// Attach a JPEG, PNG or WebP image (repeatable)
        #[arg(short, long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
    },
    /// Start an interactive chat
    Chat {
        #[command(flatten)]
        turn: TurnArgs,
        /// Start with an empty conversation, discarding saved history
        #[arg(long)]
        fresh: bool,
    },
    /// List available models
    Models,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Inspect or manage saved chat history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

/// Subcommands for the `config` command.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the config path and resolved values
    Show,
}

/// Subcommands for the `history` command.
#[derive(Subcommand)]
pub enum HistoryAction {
    /// Print the saved conversation
    Show,
    /// Delete the saved conversation
    Clear,
    /// Export the saved conversation
    Export {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Output file (defaults to chat-export-<timestamp>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

/// Dispatches the parsed CLI command to its handler.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Ask {
            prompt,
            turn,
            images,
        } => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() && images.is_empty() {
                anyhow::bail!("No prompt provided. Usage: chatwire ask \"your question here\"");
            }
            let config = Config::load()?;
            return chat::run_ask(config, turn.into(), &prompt, &images).await;
        }
        Commands::Chat { turn, fresh } => {
            let config = Config::load()?;
            chat::run_chat(config, turn.into(), fresh).await?;
        }
        Commands::Models => {
            let config = Config::load()?;
            let client = CompletionClient::from_config(&config)?;
            provider::list_models(&client, &config.model).await?;
        }
        Commands::Config { action } => {
            let config = Config::load()?;
            match action {
                ConfigAction::Show => {
                    let path = Config::config_path()?;
                    println!("{} {}", "Config path:".bold(), path.display());
                    println!();
                    println!("{}", config.to_display_toml()?);
                }
            }
        }
        Commands::History { action } => history::handle_history(action)?,
    }
    Ok(ExitCode::SUCCESS)
}
