//! Typed errors for the completion protocol, tools, and transcript.
//!
//! Only [`ChatError`] is fatal to a turn. [`ToolError`] values are folded
//! into tool-result text before they reach the service, and
//! [`TranscriptError`] guards the transcript's pairing invariant.

use thiserror::Error;

/// Transport-level failure that ends a turn.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The service answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The request never produced a response.
    #[error("{0}")]
    Connection(#[source] reqwest::Error),

    /// The response body broke off while streaming.
    #[error("stream interrupted: {0}")]
    Stream(#[source] reqwest::Error),

    /// The model kept requesting tools past the configured limit.
    #[error("tool round-trip limit of {0} reached without a final answer")]
    ToolRoundsExceeded(usize),

    /// A tool exchange could not be recorded in the transcript.
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

impl ChatError {
    /// The text shown to the user in place of the failed message.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Connection(err) => format!("request failed: {}", err),
            other => other.to_string(),
        }
    }
}

/// Failure while looking up, parsing arguments for, or running a tool.
#[derive(Debug, Error, PartialEq)]
pub enum ToolError {
    #[error("Tool {0} not found")]
    UnknownTool(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Execution(String),
}

/// Violation of the transcript's tool pairing invariant.
#[derive(Debug, Error, PartialEq)]
pub enum TranscriptError {
    #[error("tool result {0} has no matching assistant tool call")]
    OrphanedToolResult(String),
}
