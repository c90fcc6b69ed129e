//! Message types for chatwire's conversation history.
//!
//! [`Message`] serializes directly to the OpenAI-compatible wire shape used
//! in `/chat/completions` request bodies, so the transcript can be sent as-is.
//! [`ToolCallRequest`] is the finalized form of a streamed tool call; the
//! in-progress form lives in [`crate::stream::accumulator`].

use serde::{Deserialize, Serialize};

/// A tool invocation requested by the model, fully assembled.
///
/// `arguments_text` is the raw JSON text exactly as the service streamed it.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    /// Identifier assigned by the service, used to key the tool result.
    pub id: String,
    /// Name of the tool to invoke.
    pub function_name: String,
    /// Concatenated argument fragments.
    pub arguments_text: String,
}

/// Wire shape of a tool call attached to an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct WireFunction {
    name: String,
    arguments: String,
}

impl Serialize for ToolCallRequest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireToolCall {
            id: self.id.clone(),
            kind: "function".to_string(),
            function: WireFunction {
                name: self.function_name.clone(),
                arguments: self.arguments_text.clone(),
            },
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ToolCallRequest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireToolCall::deserialize(deserializer)?;
        Ok(Self {
            id: wire.id,
            function_name: wire.function.name,
            arguments_text: wire.function.arguments,
        })
    }
}

/// The role of a message sender in the conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Reference to an image, usually a base64 `data:` URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

/// One part of a multimodal message body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn image(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

/// Message body: plain text or an ordered list of parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A single message in a conversation.
///
/// `content` is `None` only on assistant messages that carry tool calls; it
/// serializes as an explicit `null` because that is what the service expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Function name of the call a tool message answers.
    #[serde(default, rename = "name", skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Message {
    fn with_content(role: Role, content: Content) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::with_content(Role::System, Content::Text(text.into()))
    }

    pub fn user(content: Content) -> Self {
        Self::with_content(Role::User, content)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::with_content(Role::Assistant, Content::Text(text.into()))
    }

    /// An assistant message that only carries a tool invocation.
    pub fn assistant_tool_call(call: ToolCallRequest) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_calls: vec![call],
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Creates a tool result message answering `call`.
    pub fn tool_result(call: &ToolCallRequest, result: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(Content::Text(result.into())),
            tool_calls: Vec::new(),
            tool_call_id: Some(call.id.clone()),
            tool_name: Some(call.function_name.clone()),
        }
    }

    /// Returns the text of the message, joining text parts and skipping images.
    pub fn text(&self) -> String {
        match &self.content {
            None => String::new(),
            Some(Content::Text(s)) => s.clone(),
            Some(Content::Parts(parts)) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Number of image parts in the message body.
    pub fn image_count(&self) -> usize {
        match &self.content {
            Some(Content::Parts(parts)) => parts
                .iter()
                .filter(|p| matches!(p, ContentPart::ImageUrl { .. }))
                .count(),
            _ => 0,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "you"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_call() -> ToolCallRequest {
        ToolCallRequest {
            id: "call_1".into(),
            function_name: "math_solver".into(),
            arguments_text: r#"{"expression":"2+2"}"#.into(),
        }
    }

    #[test]
    fn test_tool_call_message_serializes_null_content() {
        let value = serde_json::to_value(Message::assistant_tool_call(sample_call())).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "math_solver", "arguments": "{\"expression\":\"2+2\"}"}
                }]
            })
        );
    }

    #[test]
    fn test_tool_result_carries_id_and_name() {
        let value = serde_json::to_value(Message::tool_result(&sample_call(), "4")).unwrap();
        assert_eq!(
            value,
            json!({"role": "tool", "content": "4", "tool_call_id": "call_1", "name": "math_solver"})
        );
    }

    #[test]
    fn test_multimodal_user_content() {
        let msg = Message::user(Content::Parts(vec![
            ContentPart::Text { text: "look".into() },
            ContentPart::image("data:image/png;base64,AAAA"),
        ]));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["content"][0], json!({"type": "text", "text": "look"}));
        assert_eq!(
            value["content"][1],
            json!({"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}})
        );
        assert_eq!(msg.text(), "look");
        assert_eq!(msg.image_count(), 1);
    }
}
