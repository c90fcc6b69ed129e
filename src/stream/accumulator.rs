//! Build-up-then-finalize state for the response being streamed.
//!
//! Only one tool call is assembled per response. Fragments that belong to a
//! second call are dropped rather than concatenated into the first.

use tracing::warn;

use super::delta::ToolCallFragment;
use crate::message::ToolCallRequest;

/// A tool call whose fragments are still arriving.
///
/// `arguments_text` is usually not valid JSON yet, so this type offers no
/// way to parse it; call [`PartialToolCall::finish`] first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialToolCall {
    index: Option<u32>,
    id: String,
    function_name: String,
    arguments_text: String,
}

impl PartialToolCall {
    fn from_fragment(fragment: ToolCallFragment) -> Self {
        Self {
            index: fragment.index,
            id: fragment.id.unwrap_or_default(),
            function_name: fragment.name.unwrap_or_default(),
            arguments_text: fragment.arguments.unwrap_or_default(),
        }
    }

    /// Whether `fragment` continues this call rather than starting another.
    fn continues_with(&self, fragment: &ToolCallFragment) -> bool {
        if let (Some(mine), Some(theirs)) = (self.index, fragment.index) {
            if mine != theirs {
                return false;
            }
        }
        match fragment.id.as_deref() {
            Some(id) if !id.is_empty() && !self.id.is_empty() => id == self.id,
            _ => true,
        }
    }

    fn merge(&mut self, fragment: ToolCallFragment) {
        if self.id.is_empty() {
            if let Some(id) = fragment.id {
                self.id = id;
            }
        }
        if self.index.is_none() {
            self.index = fragment.index;
        }
        if let Some(name) = fragment.name {
            self.function_name.push_str(&name);
        }
        if let Some(args) = fragment.arguments {
            self.arguments_text.push_str(&args);
        }
    }

    /// Finalizes the call once the stream has signalled completion.
    pub fn finish(self) -> ToolCallRequest {
        ToolCallRequest {
            id: self.id,
            function_name: self.function_name,
            arguments_text: self.arguments_text,
        }
    }
}

/// Text buffer and tool-call slot of one streamed response.
#[derive(Debug, Default)]
pub struct TurnAccumulator {
    text: String,
    tool_call: Option<PartialToolCall>,
}

impl TurnAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    /// Merges a tool-call fragment. Returns `false` if it was dropped because
    /// it belongs to a call other than the one being assembled.
    pub fn push_tool_fragment(&mut self, fragment: ToolCallFragment) -> bool {
        match self.tool_call {
            None => {
                self.tool_call = Some(PartialToolCall::from_fragment(fragment));
                true
            }
            Some(ref mut call) if call.continues_with(&fragment) => {
                call.merge(fragment);
                true
            }
            Some(ref call) => {
                warn!(
                    tracked = %call.id,
                    dropped = ?fragment.id,
                    "dropping fragment of an additional tool call"
                );
                false
            }
        }
    }

    #[cfg(test)]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[cfg(test)]
    pub fn pending_tool_call(&self) -> Option<&PartialToolCall> {
        self.tool_call.as_ref()
    }

    /// Removes and finalizes the assembled tool call, if any.
    pub fn take_tool_call(&mut self) -> Option<ToolCallRequest> {
        self.tool_call.take().map(PartialToolCall::finish)
    }

    /// Removes the accumulated text.
    pub fn take_text(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    /// Clears both the text buffer and the tool-call slot.
    pub fn reset(&mut self) {
        self.text.clear();
        self.tool_call = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(index: Option<u32>, id: Option<&str>, name: Option<&str>, args: Option<&str>) -> ToolCallFragment {
        ToolCallFragment {
            index,
            id: id.map(String::from),
            name: name.map(String::from),
            arguments: args.map(String::from),
        }
    }

    #[test]
    fn test_split_fragments_match_single_delivery() {
        let args = r#"{"expression":"2+2"}"#;

        let mut whole = TurnAccumulator::new();
        whole.push_tool_fragment(frag(Some(0), Some("c1"), Some("math_solver"), Some(args)));

        let mut split = TurnAccumulator::new();
        split.push_tool_fragment(frag(Some(0), Some("c1"), Some("math_"), Some("")));
        split.push_tool_fragment(frag(Some(0), None, Some("solver"), Some(r#"{"expr"#)));
        split.push_tool_fragment(frag(Some(0), None, None, Some(r#"ession":"#)));
        split.push_tool_fragment(frag(None, None, None, Some(r#""2+2"}"#)));

        assert_eq!(whole.take_tool_call(), split.take_tool_call());
    }

    #[test]
    fn test_second_tool_call_is_dropped() {
        let mut acc = TurnAccumulator::new();
        assert!(acc.push_tool_fragment(frag(Some(0), Some("c1"), Some("math_solver"), Some("{}"))));
        assert!(!acc.push_tool_fragment(frag(Some(1), Some("c2"), Some("other"), Some("{}"))));
        assert!(!acc.push_tool_fragment(frag(None, Some("c3"), Some("other"), None)));
        let call = acc.take_tool_call().unwrap();
        assert_eq!(call.id, "c1");
        assert_eq!(call.function_name, "math_solver");
        assert_eq!(call.arguments_text, "{}");
    }

    #[test]
    fn test_late_id_fills_empty_slot() {
        let mut acc = TurnAccumulator::new();
        acc.push_tool_fragment(frag(None, None, Some("math_solver"), None));
        acc.push_tool_fragment(frag(None, Some("c9"), None, Some("{}")));
        assert_eq!(acc.pending_tool_call().unwrap().id, "c9");
    }

    #[test]
    fn test_reset_clears_state() {
        let mut acc = TurnAccumulator::new();
        acc.push_text("partial");
        acc.push_tool_fragment(frag(Some(0), Some("c1"), Some("x"), None));
        acc.reset();
        assert_eq!(acc.text(), "");
        assert!(acc.pending_tool_call().is_none());
    }
}
