//! Slash command handlers for the chat REPL.
//!
//! Returns a [`CommandAction`] so the REPL loop can decide how to proceed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use crate::format;
use crate::history::{self, ChatRecord, ExportFormat};
use crate::provider;

use super::Orchestrator;

/// Action returned by slash command handling.
pub(crate) enum CommandAction {
    /// Command was handled; continue the REPL loop.
    Continue,
    /// Ask again for the last answer.
    Regenerate,
    /// Unknown command was entered.
    Unknown(String),
}

/// Dispatch and handle a slash command.
pub(crate) async fn handle_slash_command(
    command: &str,
    chat: &mut Orchestrator,
) -> Result<CommandAction> {
    let mut words = command.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    match (name, args.as_slice()) {
        ("/help", _) => print_help(),
        ("/history", _) => {
            if chat.transcript().is_empty() {
                println!("{}", "No messages yet.".dimmed());
            }
            for msg in chat.transcript().messages() {
                println!("{}", format::format_message(msg));
                println!();
            }
        }
        ("/retry" | "/regenerate", []) => return Ok(CommandAction::Regenerate),
        ("/clear", _) => {
            chat.clear()?;
            println!("{}", "History cleared.".dimmed());
        }
        ("/mode", []) => {
            for mode in chat.config().mode_names() {
                let marker = if mode == chat.mode() { "*" } else { " " };
                println!("  {} {}", marker.green(), mode);
            }
        }
        ("/mode", [mode]) => {
            chat.set_mode(mode)?;
            println!("{} {}", "mode:".dimmed(), mode.yellow());
            if let Some(prompt) = chat.transcript().system_prompt() {
                println!("{}", prompt.dimmed());
            }
        }
        ("/model", []) => println!("{} {}", "model:".dimmed(), chat.model().yellow()),
        ("/model", [model]) => {
            chat.set_model(*model);
            println!("{} {}", "model:".dimmed(), model.yellow());
        }
        ("/models", _) => provider::list_models(chat.client(), chat.model()).await?,
        ("/tools", _) => {
            for tool in chat.tools().names() {
                let status = if chat.tools().is_enabled(tool) {
                    "on".green()
                } else {
                    "off".dimmed()
                };
                println!("  {:<16} {}", tool, status);
            }
        }
        ("/tool", [tool, state @ ("on" | "off")]) => {
            let known = if *state == "on" {
                chat.tools_mut().enable(tool)
            } else {
                chat.tools_mut().disable(tool)
            };
            if known {
                println!("{} {} {}", "tool".dimmed(), tool.bold(), state);
            } else {
                println!("{} Unknown tool: {}", "?".yellow(), tool);
            }
        }
        ("/image", [path]) => {
            chat.pending_images().add(Path::new(path))?;
            println!(
                "{}",
                format!("{} image(s) queued for the next message", chat.pending_images().len())
                    .dimmed()
            );
        }
        ("/images", ["clear"]) => {
            chat.pending_images().clear();
            println!("{}", "Pending images cleared.".dimmed());
        }
        ("/export", rest) => {
            let format = match rest.first().copied() {
                None | Some("json") => ExportFormat::Json,
                Some("markdown") | Some("md") => ExportFormat::Markdown,
                Some(other) => {
                    return Ok(CommandAction::Unknown(format!("/export {}", other)));
                }
            };
            let path = rest
                .get(1)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(format.default_filename()));
            export_transcript(chat, format, &path)?;
            println!("{} {}", "exported to".dimmed(), path.display());
        }
        _ => return Ok(CommandAction::Unknown(command.to_string())),
    }
    Ok(CommandAction::Continue)
}

/// Writes the stored chat, or the live transcript when nothing is stored.
fn export_transcript(chat: &Orchestrator, format: ExportFormat, path: &Path) -> Result<()> {
    let records = match chat.store() {
        Some(store) => store.load_records()?,
        None => Vec::new(),
    };
    let records = if records.is_empty() {
        let now = chrono::Utc::now().to_rfc3339();
        chat.transcript()
            .messages()
            .iter()
            .filter_map(|m| ChatRecord::from_message(m, &now))
            .collect()
    } else {
        records
    };
    let content = history::export(&records, format)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

fn print_help() {
    println!("{}", "Commands:".bold());
    let rows = [
        ("/history", "show conversation history"),
        ("/retry", "replace the last answer with a new one"),
        ("/clear", "clear conversation and saved history"),
        ("/mode [NAME]", "list modes or switch mode"),
        ("/model [ID]", "show or switch the model"),
        ("/models", "list models offered by the service"),
        ("/tools", "list tools and whether they are enabled"),
        ("/tool NAME on|off", "enable or disable a tool"),
        ("/image PATH", "attach a JPEG, PNG or WebP image to the next message"),
        ("/images clear", "drop pending images"),
        ("/export [json|markdown] [PATH]", "export the chat"),
        ("/help", "show this help"),
    ];
    for (cmd, desc) in rows {
        println!("  {} - {}", cmd.cyan(), desc);
    }
    println!("  {} - exit", "Ctrl+D".cyan());
}
