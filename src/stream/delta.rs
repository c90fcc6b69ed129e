//! Decoding of one streamed completion chunk.

use serde::Deserialize;

use crate::constants::{FINISH_STOP, FINISH_TOOL_CALLS};

#[derive(Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCallDelta>>,
}

#[derive(Deserialize)]
struct WireToolCallDelta {
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<WireFunctionDelta>,
}

#[derive(Deserialize)]
struct WireFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Why the service stopped streaming the current response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    ToolCalls,
    /// Any other reason (`length`, `content_filter`, ...), ending the turn.
    Other(String),
}

impl FinishReason {
    fn from_wire(s: String) -> Self {
        match s.as_str() {
            FINISH_STOP => FinishReason::Stop,
            FINISH_TOOL_CALLS => FinishReason::ToolCalls,
            _ => FinishReason::Other(s),
        }
    }
}

/// One partial piece of a tool call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallFragment {
    pub index: Option<u32>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// Incremental information carried by one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamDelta {
    pub text: Option<String>,
    pub tool_call: Option<ToolCallFragment>,
    pub finish_reason: Option<FinishReason>,
}

impl StreamDelta {
    /// Decodes a data payload. Returns `None` when it is not valid JSON of
    /// the expected shape.
    ///
    /// Only the first choice and its first tool-call entry are read.
    pub fn parse(payload: &str) -> Option<Self> {
        let chunk: ChunkPayload = serde_json::from_str(payload).ok()?;
        let Some(choice) = chunk.choices.into_iter().next() else {
            return Some(Self::default());
        };

        let (text, tool_call) = match choice.delta {
            Some(delta) => {
                let text = delta.content.filter(|t| !t.is_empty());
                let tool_call = delta
                    .tool_calls
                    .and_then(|calls| calls.into_iter().next())
                    .map(|tc| {
                        let (name, arguments) = match tc.function {
                            Some(f) => (f.name, f.arguments),
                            None => (None, None),
                        };
                        ToolCallFragment {
                            index: tc.index,
                            id: tc.id,
                            name,
                            arguments,
                        }
                    });
                (text, tool_call)
            }
            None => (None, None),
        };

        Some(Self {
            text,
            tool_call,
            finish_reason: choice.finish_reason.map(FinishReason::from_wire),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_delta() {
        let d = StreamDelta::parse(r#"{"choices":[{"delta":{"content":"Hel"},"finish_reason":null}]}"#)
            .unwrap();
        assert_eq!(d.text.as_deref(), Some("Hel"));
        assert!(d.tool_call.is_none());
        assert!(d.finish_reason.is_none());
    }

    #[test]
    fn test_tool_call_delta() {
        let d = StreamDelta::parse(
            r#"{"choices":[{"delta":{"content":null,"tool_calls":[{"index":0,"id":"call_1","type":"function","function":{"name":"math_solver","arguments":""}}]}}]}"#,
        )
        .unwrap();
        assert!(d.text.is_none());
        let tc = d.tool_call.unwrap();
        assert_eq!(tc.index, Some(0));
        assert_eq!(tc.id.as_deref(), Some("call_1"));
        assert_eq!(tc.name.as_deref(), Some("math_solver"));
        assert_eq!(tc.arguments.as_deref(), Some(""));
    }

    #[test]
    fn test_finish_reasons() {
        let stop = StreamDelta::parse(r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#).unwrap();
        assert_eq!(stop.finish_reason, Some(FinishReason::Stop));
        let tools =
            StreamDelta::parse(r#"{"choices":[{"delta":{},"finish_reason":"tool_calls"}]}"#).unwrap();
        assert_eq!(tools.finish_reason, Some(FinishReason::ToolCalls));
        let length = StreamDelta::parse(r#"{"choices":[{"finish_reason":"length"}]}"#).unwrap();
        assert_eq!(length.finish_reason, Some(FinishReason::Other("length".into())));
    }

    #[test]
    fn test_malformed_payload_is_none() {
        assert!(StreamDelta::parse("{not json").is_none());
        assert!(StreamDelta::parse(r#"{"choices":"nope"}"#).is_none());
    }

    #[test]
    fn test_no_choices_is_empty_delta() {
        assert_eq!(StreamDelta::parse(r#"{"id":"x"}"#), Some(StreamDelta::default()));
    }
}
