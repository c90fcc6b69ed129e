//! Saved chat operations for the `chatwire history` subcommand family.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::format;
use crate::history::{self, ChatStore, ExportFormat, JsonFileStore};

use super::HistoryAction;

/// Dispatches a history subcommand to its handler.
pub(crate) fn handle_history(action: HistoryAction) -> Result<()> {
    let store = JsonFileStore::open_default()?;
    match action {
        HistoryAction::Show => history_show(&store),
        HistoryAction::Clear => {
            store.clear_chat()?;
            println!("{} {}", "Chat history cleared:".dimmed(), store.path().display());
            Ok(())
        }
        HistoryAction::Export { format, output } => {
            let path = output.unwrap_or_else(|| format.default_filename().into());
            history_export(&store, format, &path)?;
            println!("{} {}", "Exported to".green(), path.display());
            Ok(())
        }
    }
}

fn history_show(store: &JsonFileStore) -> Result<()> {
    let records = store.load_records()?;
    if records.is_empty() {
        println!("{}", "No saved chat.".dimmed());
        return Ok(());
    }
    for record in &records {
        println!("{}", record.timestamp.dimmed());
        println!("{}", format::format_message(&record.to_message()));
        println!();
    }
    Ok(())
}

fn history_export(store: &impl ChatStore, format: ExportFormat, path: &Path) -> Result<()> {
    let records = store.load_records()?;
    anyhow::ensure!(!records.is_empty(), "No saved chat to export");
    let content = history::export(&records, format)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Content, Message};

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("chat.json"));
        store
            .save_chat(&[Message::user(Content::Text("hi".into())), Message::assistant("hello")])
            .unwrap();

        let out = dir.path().join("out.md");
        history_export(&store, ExportFormat::Markdown, &out).unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        assert!(text.contains("## USER - "));
        assert!(text.contains("hello"));
    }

    #[test]
    fn test_export_of_empty_history_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("chat.json"));
        assert!(history_export(&store, ExportFormat::Json, &dir.path().join("x.json")).is_err());
    }
}
