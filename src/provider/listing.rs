//! Model listing and display.
//!
//! Isolates display concerns from the provider core.

use anyhow::Result;
use colored::Colorize;

use super::client::{CompletionClient, ModelInfo};

/// Formats one model as `id (N tokens)`.
pub fn format_model(info: &ModelInfo) -> String {
    match info.context_length {
        Some(n) => format!("{} ({} tokens)", info.id, n),
        None => info.id.clone(),
    }
}

/// List all models offered by the service, marking the current one.
pub async fn list_models(client: &CompletionClient, current: &str) -> Result<()> {
    let models = client.list_models().await?;
    if models.is_empty() {
        println!("{}", "(the service listed no models)".dimmed());
        return Ok(());
    }

    println!("Available models:\n");
    for info in &models {
        if info.id == current {
            println!("  {} {}", format_model(info), "(current)".green());
        } else {
            println!("  {}", format_model(info));
        }
    }
    Ok(())
}
