//! Interactive chat for chatwire.
//!
//! [`Orchestrator`] glues user input, the [`Transcript`], the completion
//! session and persistence together. [`run_chat`] drives it from a
//! [`rustyline`] REPL; [`run_ask`] runs a single unsaved turn. Both answer
//! tool approvals on the terminal through a [`ChannelGate`].

mod attach;
mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn};

use crate::approval::{serve_approvals, ApprovalGate, ChannelGate, TerminalGate};
use crate::config::Config;
use crate::error::ChatError;
use crate::format;
use crate::history::{ChatStore, JsonFileStore};
use crate::output::{Renderer, StdoutRenderer};
use crate::provider::CompletionClient;
use crate::session::{CompletionSession, TurnSummary};
use crate::tools::ToolRegistry;
use crate::transcript::{Submission, Transcript};

pub use attach::PendingImages;

/// Overrides given on the command line.
#[derive(Debug, Default, Clone)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub mode: Option<String>,
    pub tools: Vec<String>,
}

/// Conversation state for one chat: the transcript plus everything that
/// decides how the next turn is sent.
pub struct Orchestrator {
    config: Config,
    client: CompletionClient,
    model: String,
    mode: String,
    transcript: Transcript,
    tools: ToolRegistry,
    pending: PendingImages,
    store: Option<Box<dyn ChatStore>>,
}

impl Orchestrator {
    /// Builds an orchestrator with the configured and requested tools
    /// enabled and the requested mode's prompt as the system prompt.
    pub fn new(
        config: Config,
        client: CompletionClient,
        options: &ChatOptions,
        store: Option<Box<dyn ChatStore>>,
    ) -> Result<Self> {
        let mut tools = ToolRegistry::with_builtins();
        for name in config.tools.enabled.iter().chain(&options.tools) {
            if !tools.enable(name) {
                bail!("Unknown tool: {}", name);
            }
        }

        let model = config.resolve_model(options.model.as_deref());
        let mode = options.mode.clone().unwrap_or_else(|| config.mode.clone());
        let mut orchestrator = Self {
            config,
            client,
            model,
            mode: String::new(),
            transcript: Transcript::new(None),
            tools,
            pending: PendingImages::default(),
            store,
        };
        orchestrator.set_mode(&mode)?;
        Ok(orchestrator)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Switches the conversation mode. History is kept; only the system
    /// prompt sent ahead of it changes.
    pub fn set_mode(&mut self, mode: &str) -> Result<()> {
        let Some(prompt) = self.config.system_prompt_for(mode) else {
            bail!(
                "Unknown mode: {} (available: {})",
                mode,
                self.config.mode_names().join(", ")
            );
        };
        self.transcript.set_system_prompt(Some(prompt));
        self.mode = mode.to_string();
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &CompletionClient {
        &self.client
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut ToolRegistry {
        &mut self.tools
    }

    pub fn pending_images(&mut self) -> &mut PendingImages {
        &mut self.pending
    }

    pub fn store(&self) -> Option<&dyn ChatStore> {
        self.store.as_deref()
    }

    /// Replaces the transcript history with the stored conversation.
    pub fn restore(&mut self) -> Result<usize> {
        let Some(store) = self.store.as_deref() else {
            return Ok(0);
        };
        let messages = store.load_chat()?;
        self.transcript.clear();
        for msg in messages {
            self.transcript.push(msg)?;
        }
        Ok(self.transcript.len())
    }

    /// Clears the conversation and the stored copy.
    pub fn clear(&mut self) -> Result<()> {
        self.transcript.clear();
        if let Some(store) = self.store.as_deref() {
            store.clear_chat()?;
        }
        Ok(())
    }

    /// Submits user text with any queued images and runs the turn.
    ///
    /// Returns `Ok(None)` for an empty submission. After a completed turn
    /// the transcript is saved; a failed turn saves nothing.
    pub async fn submit(
        &mut self,
        text: &str,
        gate: &dyn ApprovalGate,
        renderer: &mut dyn Renderer,
    ) -> Result<Option<TurnSummary>, ChatError> {
        let submission = Submission::new(text).with_images(self.pending.take());
        if !self.transcript.submit(submission) {
            return Ok(None);
        }
        self.complete_turn(gate, renderer).await.map(Some)
    }

    /// Replaces the last answer with a fresh one for the same history.
    ///
    /// Returns `Ok(None)` when the conversation does not end in a plain
    /// answer. If the new turn fails the old answer is put back.
    pub async fn regenerate(
        &mut self,
        gate: &dyn ApprovalGate,
        renderer: &mut dyn Renderer,
    ) -> Result<Option<TurnSummary>, ChatError> {
        let Some(previous) = self.transcript.pop_final_answer() else {
            return Ok(None);
        };
        match self.complete_turn(gate, renderer).await {
            Ok(summary) => Ok(Some(summary)),
            Err(err) => {
                self.transcript.push_assistant(previous.text());
                Err(err)
            }
        }
    }

    /// Runs a turn on the current transcript and saves it on success.
    async fn complete_turn(
        &mut self,
        gate: &dyn ApprovalGate,
        renderer: &mut dyn Renderer,
    ) -> Result<TurnSummary, ChatError> {
        let mut session = CompletionSession::new(&self.client, self.model.as_str())
            .with_max_tool_rounds(self.config.max_tool_rounds);
        let summary = session
            .run_turn(&mut self.transcript, &self.tools, gate, renderer)
            .await?;
        debug!(
            tool_rounds = summary.tool_rounds,
            chars = summary.text.len(),
            "turn complete"
        );

        if let Some(store) = self.store.as_deref() {
            if let Err(err) = store.save_chat(self.transcript.messages()) {
                warn!(error = %err, "failed to save chat");
            }
        }
        Ok(summary)
    }
}

/// What a turn answers.
enum Prompt<'a> {
    Submit(&'a str),
    Regenerate,
}

/// Runs one turn while a separate loop asks `approver` about each tool call.
async fn answer_with(
    chat: &mut Orchestrator,
    prompt: Prompt<'_>,
    approver: &dyn ApprovalGate,
    renderer: &mut dyn Renderer,
) -> Result<Option<TurnSummary>, ChatError> {
    let (gate, mut approvals) = ChannelGate::new();
    let turn = async {
        let gate = gate;
        match prompt {
            Prompt::Submit(text) => chat.submit(text, &gate, renderer).await,
            Prompt::Regenerate => chat.regenerate(&gate, renderer).await,
        }
    };
    let (outcome, ()) = tokio::join!(turn, serve_approvals(&mut approvals, approver));
    outcome
}

/// Runs the interactive chat REPL.
///
/// # Readline behavior
///
/// - **Ctrl+C**: cancels current input, stays in REPL
/// - **Ctrl+D**: exits cleanly with "goodbye."
/// - Readline history is persisted to `~/.cache/chatwire/chat_history.txt`
pub async fn run_chat(config: Config, options: ChatOptions, fresh: bool) -> Result<()> {
    let client = CompletionClient::from_config(&config)?;
    let store: Box<dyn ChatStore> = Box::new(JsonFileStore::open_default()?);
    let mut chat = Orchestrator::new(config, client, &options, Some(store))?;

    if fresh {
        chat.clear()?;
    } else {
        let restored = chat.restore()?;
        for msg in chat.transcript().messages() {
            println!("{}", format::format_message(msg));
            println!();
        }
        if restored > 0 {
            println!("{}", format!("restored {} message(s)", restored).dimmed());
        }
    }

    println!(
        "{} [model: {}] [mode: {}] (/help for commands, Ctrl+D to exit)",
        "chatwire".bold().cyan(),
        chat.model().yellow(),
        chat.mode().yellow(),
    );
    println!();

    let mut rl = DefaultEditor::new()?;
    let history_path = Config::readline_history_path()?;
    if history_path.exists() {
        let _ = rl.load_history(&history_path);
    }

    loop {
        let prompt = if chat.pending_images().is_empty() {
            format!("{} ", ">".green().bold())
        } else {
            format!("{} {} ", format!("[{} img]", chat.pending_images().len()).dimmed(), ">".green().bold())
        };

        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if line.starts_with('/') {
                    match commands::handle_slash_command(&line, &mut chat).await {
                        Ok(commands::CommandAction::Continue) => {}
                        Ok(commands::CommandAction::Regenerate) => {
                            println!();
                            let mut renderer = StdoutRenderer::new();
                            match answer_with(&mut chat, Prompt::Regenerate, &TerminalGate, &mut renderer).await {
                                Ok(Some(_)) | Err(_) => println!(),
                                Ok(None) => println!("{}", "Nothing to regenerate.".dimmed()),
                            }
                        }
                        Ok(commands::CommandAction::Unknown(cmd)) => {
                            println!("{} Unknown command: {}", "?".yellow(), cmd);
                        }
                        Err(e) => eprintln!("{} {}", "error:".red().bold(), e),
                    }
                    continue;
                }

                println!();
                let mut renderer = StdoutRenderer::new();
                // The renderer already showed the error in place of the answer.
                let _ = answer_with(&mut chat, Prompt::Submit(&line), &TerminalGate, &mut renderer).await;
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "goodbye.".dimmed());
                break;
            }
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                break;
            }
        }
    }

    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = rl.save_history(&history_path);

    Ok(())
}

/// Sends one prompt, prints the streamed answer, and exits. Nothing is saved.
///
/// A failed turn has already been printed in place of the answer, so it
/// only turns into a failing exit code.
pub async fn run_ask(
    config: Config,
    options: ChatOptions,
    prompt: &str,
    images: &[PathBuf],
) -> Result<ExitCode> {
    let client = CompletionClient::from_config(&config)?;
    let mut chat = Orchestrator::new(config, client, &options, None)?;
    for path in images {
        chat.pending_images().add(path)?;
    }

    let mut renderer = StdoutRenderer::new();
    let outcome = answer_with(&mut chat, Prompt::Submit(prompt), &TerminalGate, &mut renderer).await;
    match outcome {
        Ok(Some(_)) => Ok(ExitCode::SUCCESS),
        Ok(None) => bail!("Nothing to send: the prompt is empty"),
        Err(err) => {
            debug!(error = %err, "ask failed");
            Ok(ExitCode::FAILURE)
        }
    }
}
