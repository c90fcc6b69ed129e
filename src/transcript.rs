//! The ordered, append-only conversation state.
//!
//! A [`Transcript`] holds the active system prompt separately from the turns
//! so a conversation mode can be switched without rewriting history. Every
//! append goes through [`Transcript::push`], which refuses tool results that
//! do not answer a preceding assistant tool call.

use crate::constants::IMAGES_PLACEHOLDER;
use crate::error::TranscriptError;
use crate::message::{Content, ContentPart, Message, Role, ToolCallRequest};

/// Raw user input: typed text plus any attached image URLs.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    text: String,
    images: Vec<String>,
}

impl Submission {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            images: Vec::new(),
        }
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// Builds the user message body, or `None` for an empty submission.
    ///
    /// Image-only submissions get a placeholder text part so the service
    /// always receives text alongside the images.
    pub fn into_content(self) -> Option<Content> {
        let text = self.text.trim();
        if text.is_empty() && self.images.is_empty() {
            return None;
        }
        if self.images.is_empty() {
            return Some(Content::Text(text.to_string()));
        }

        let text = if text.is_empty() {
            IMAGES_PLACEHOLDER
        } else {
            text
        };
        let mut parts = Vec::with_capacity(self.images.len() + 1);
        parts.push(ContentPart::Text {
            text: text.to_string(),
        });
        parts.extend(self.images.into_iter().map(ContentPart::image));
        Some(Content::Parts(parts))
    }
}

/// Conversation history plus the system prompt sent ahead of it.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    system_prompt: Option<String>,
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(system_prompt: Option<String>) -> Self {
        Self {
            system_prompt,
            messages: Vec::new(),
        }
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn set_system_prompt(&mut self, prompt: Option<String>) {
        self.system_prompt = prompt;
    }

    /// Messages of the conversation, without the system prompt.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends a message, enforcing that tool results answer a pending call.
    pub fn push(&mut self, msg: Message) -> Result<(), TranscriptError> {
        if msg.role == Role::Tool {
            let id = msg.tool_call_id.clone().unwrap_or_default();
            if !self.has_pending_call(&id) {
                return Err(TranscriptError::OrphanedToolResult(id));
            }
        }
        self.messages.push(msg);
        Ok(())
    }

    /// Whether `id` names a call from the nearest assistant tool-call message
    /// that no tool message after it has answered yet.
    fn has_pending_call(&self, id: &str) -> bool {
        let mut answered = Vec::new();
        for msg in self.messages.iter().rev() {
            match msg.role {
                Role::Tool => answered.extend(msg.tool_call_id.as_deref()),
                Role::Assistant if !msg.tool_calls.is_empty() => {
                    return msg.tool_calls.iter().any(|c| c.id == id) && !answered.contains(&id);
                }
                _ => return false,
            }
        }
        false
    }

    /// Appends the user's submission. Returns `false` for an empty one.
    pub fn submit(&mut self, submission: Submission) -> bool {
        match submission.into_content() {
            Some(content) => {
                self.messages.push(Message::user(content));
                true
            }
            None => false,
        }
    }

    /// Appends the assistant tool call and its result as one pair.
    pub fn record_tool_exchange(
        &mut self,
        call: ToolCallRequest,
        result: impl Into<String>,
    ) -> Result<(), TranscriptError> {
        let result_msg = Message::tool_result(&call, result);
        self.messages.push(Message::assistant_tool_call(call));
        if let Err(err) = self.push(result_msg) {
            self.messages.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Appends the final assistant answer of a turn.
    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(Message::assistant(text));
    }

    /// Removes the trailing final answer so the turn can be asked again.
    ///
    /// Only a plain assistant answer is taken. Tool exchanges and user
    /// messages stay, so the transcript is still a valid request.
    pub fn pop_final_answer(&mut self) -> Option<Message> {
        match self.messages.last() {
            Some(msg) if msg.role == Role::Assistant && msg.tool_calls.is_empty() => {
                self.messages.pop()
            }
            _ => None,
        }
    }

    /// The full message list for a request: system prompt, then history.
    pub fn request_messages(&self) -> Vec<Message> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        if let Some(ref sp) = self.system_prompt {
            out.push(Message::system(sp.clone()));
        }
        out.extend(self.messages.iter().cloned());
        out
    }

    /// Drops all turns, keeping the system prompt.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
