//! Local chat persistence for chatwire.
//!
//! The conversation is stored as a JSON array of records under
//! `~/.local/share/chatwire/chat.json`. Each record carries a `type`
//! (`user`, `llm` or `tool`), the message content and an RFC 3339 timestamp.
//! `assistant` becomes `llm` only in this file format. Tool call metadata is
//! kept so a reloaded transcript still pairs every tool result with its call.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::message::{Content, Message, Role, ToolCallRequest};
use crate::transcript::Transcript;

/// Who produced a stored message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    User,
    Llm,
    Tool,
}

/// One persisted message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRecord {
    #[serde(rename = "type")]
    pub kind: RecordType,
    pub content: Option<Content>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ChatRecord {
    /// Converts a transcript message. System messages are never stored.
    pub fn from_message(msg: &Message, timestamp: &str) -> Option<Self> {
        let kind = match msg.role {
            Role::User => RecordType::User,
            Role::Assistant => RecordType::Llm,
            Role::Tool => RecordType::Tool,
            Role::System => return None,
        };
        Some(Self {
            kind,
            content: msg.content.clone(),
            timestamp: timestamp.to_string(),
            tool_call_id: msg.tool_call_id.clone(),
            name: msg.tool_name.clone(),
            tool_calls: msg.tool_calls.clone(),
        })
    }

    pub fn into_message(self) -> Message {
        let role = match self.kind {
            RecordType::User => Role::User,
            RecordType::Llm => Role::Assistant,
            RecordType::Tool => Role::Tool,
        };
        Message {
            role,
            content: self.content,
            tool_calls: self.tool_calls,
            tool_call_id: self.tool_call_id,
            tool_name: self.name,
        }
    }

    /// The message converted back, for display.
    pub fn to_message(&self) -> Message {
        self.clone().into_message()
    }
}

/// Storage for the conversation between runs.
pub trait ChatStore {
    /// Replaces the stored conversation with `messages`.
    fn save_chat(&self, messages: &[Message]) -> Result<()>;

    /// Returns the stored records, skipping any that cannot be read.
    fn load_records(&self) -> Result<Vec<ChatRecord>>;

    /// Deletes the stored conversation.
    fn clear_chat(&self) -> Result<()>;

    /// Returns the stored conversation as messages that satisfy the
    /// transcript's pairing rule. Orphaned tool results are dropped.
    fn load_chat(&self) -> Result<Vec<Message>> {
        let mut transcript = Transcript::new(None);
        for record in self.load_records()? {
            if let Err(err) = transcript.push(record.into_message()) {
                warn!(error = %err, "dropping stored message");
            }
        }
        Ok(transcript.messages().to_vec())
    }
}

/// [`ChatStore`] backed by a single JSON file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store at `~/.local/share/chatwire/chat.json`.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Config::chat_store_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChatStore for JsonFileStore {
    fn save_chat(&self, messages: &[Message]) -> Result<()> {
        let timestamp = Utc::now().to_rfc3339();
        let records: Vec<ChatRecord> = messages
            .iter()
            .filter_map(|m| ChatRecord::from_message(m, &timestamp))
            .collect();

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create data directory")?;
        }
        let json = serde_json::to_string(&records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write chat to {:?}", tmp))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace chat file {:?}", self.path))?;
        debug!(records = records.len(), path = %self.path.display(), "chat saved");
        Ok(())
    }

    fn load_records(&self) -> Result<Vec<ChatRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read chat file {:?}", self.path))?;
        let raw: Vec<Value> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse chat file {:?}", self.path))?;

        let mut records = Vec::with_capacity(raw.len());
        for value in raw {
            match serde_json::from_value::<ChatRecord>(value) {
                Ok(record) => records.push(record),
                Err(err) => warn!(error = %err, "skipping unreadable chat record"),
            }
        }
        Ok(records)
    }

    fn clear_chat(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to delete chat file {:?}", self.path))?;
        }
        Ok(())
    }
}

/// Output format of `history export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
        }
    }

    /// Default export filename, e.g. `chat-export-20260101T120000Z.md`.
    pub fn default_filename(self) -> String {
        format!(
            "chat-export-{}.{}",
            Utc::now().format("%Y%m%dT%H%M%SZ"),
            self.extension()
        )
    }
}

/// Renders stored records in the requested format.
pub fn export(records: &[ChatRecord], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        ExportFormat::Markdown => Ok(records
            .iter()
            .map(|r| {
                format!(
                    "## {} - {}\n\n{}\n\n---\n",
                    record_label(r.kind),
                    r.timestamp,
                    record_body(r)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

fn record_label(kind: RecordType) -> &'static str {
    match kind {
        RecordType::User => "USER",
        RecordType::Llm => "LLM",
        RecordType::Tool => "TOOL",
    }
}

fn record_body(record: &ChatRecord) -> String {
    let msg = record.to_message();
    let mut body = msg.text();
    for call in &msg.tool_calls {
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(&format!("Tool call `{}`: `{}`", call.function_name, call.arguments_text));
    }
    let images = msg.image_count();
    if images > 0 {
        body.push_str(&format!("\n\n_[{} image(s) attached]_", images));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Submission;
    use serde_json::json;

    fn call() -> ToolCallRequest {
        ToolCallRequest {
            id: "call_1".into(),
            function_name: "math_solver".into(),
            arguments_text: r#"{"expression":"2+2"}"#.into(),
        }
    }

    fn sample_transcript() -> Transcript {
        let mut t = Transcript::new(Some("system prompts are not stored".into()));
        t.submit(Submission::new("what is 2+2?"));
        t.record_tool_exchange(call(), "4").unwrap();
        t.push_assistant("4");
        t
    }

    #[test]
    fn test_save_then_load_keeps_tool_pairing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data").join("chat.json"));
        let t = sample_transcript();
        store.save_chat(t.messages()).unwrap();

        let loaded = store.load_chat().unwrap();
        assert_eq!(loaded, t.messages());
    }

    #[test]
    fn test_stored_shape_uses_llm_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("chat.json"));
        store.save_chat(sample_transcript().messages()).unwrap();

        let raw: Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        let records = raw.as_array().unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0]["type"], json!("user"));
        assert_eq!(records[1]["type"], json!("llm"));
        assert_eq!(records[1]["content"], Value::Null);
        assert_eq!(records[1]["tool_calls"][0]["id"], json!("call_1"));
        assert_eq!(records[2]["type"], json!("tool"));
        assert_eq!(records[2]["name"], json!("math_solver"));
        assert!(records[3].get("tool_call_id").is_none());
        assert!(chrono::DateTime::parse_from_rfc3339(records[0]["timestamp"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_load_drops_orphans_and_bad_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.json");
        fs::write(
            &path,
            json!([
                {"type": "user", "content": "hi", "timestamp": "2024-01-01T00:00:00Z"},
                {"type": "tool", "content": "4", "timestamp": "2024-01-01T00:00:00Z", "tool_call_id": "ghost"},
                {"type": "narrator", "content": "?", "timestamp": "2024-01-01T00:00:00Z"},
                {"type": "llm", "content": "hello", "timestamp": "2024-01-01T00:00:01Z"}
            ])
            .to_string(),
        )
        .unwrap();

        let store = JsonFileStore::new(&path);
        assert_eq!(store.load_records().unwrap().len(), 3);
        let messages = store.load_chat().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].text(), "hello");
    }

    #[test]
    fn test_missing_file_loads_empty_and_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("chat.json"));
        assert!(store.load_chat().unwrap().is_empty());
        store.clear_chat().unwrap();

        store.save_chat(sample_transcript().messages()).unwrap();
        store.clear_chat().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_markdown_export() {
        let records: Vec<ChatRecord> = sample_transcript()
            .messages()
            .iter()
            .filter_map(|m| ChatRecord::from_message(m, "2024-05-01T10:00:00+00:00"))
            .collect();
        let md = export(&records, ExportFormat::Markdown).unwrap();
        assert!(md.starts_with("## USER - 2024-05-01T10:00:00+00:00\n\nwhat is 2+2?\n\n---\n"));
        assert!(md.contains("## LLM - 2024-05-01T10:00:00+00:00\n\nTool call `math_solver`"));
        assert!(md.contains("## TOOL - "));
        assert_eq!(md.matches("---\n").count(), 4);
    }

    #[test]
    fn test_json_export_is_pretty() {
        let records = vec![ChatRecord::from_message(&Message::assistant("ok"), "t").unwrap()];
        let out = export(&records, ExportFormat::Json).unwrap();
        assert!(out.contains("\n  {"));
        assert!(out.contains("\"type\": \"llm\""));
        assert_eq!(ExportFormat::Markdown.extension(), "md");
    }
}
