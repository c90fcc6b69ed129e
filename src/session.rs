//! The streaming completion session: one turn of the protocol.
//!
//! [`CompletionSession::run_turn`] sends the transcript, consumes the event
//! stream, and loops through tool round-trips until the service finishes
//! without requesting another tool:
//!
//! ```text
//! Requesting -> Streaming -> AwaitingToolApproval -> ToolExecuting -> Requesting ...
//!                   |
//!                   +-> Complete | Failed
//! ```
//!
//! Only transport failures end a turn early. Malformed events are skipped,
//! and tool failures or denials travel back to the model as tool results.

use std::pin::pin;

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::approval::{ApprovalGate, Decision};
use crate::constants::{DEFAULT_MAX_TOOL_ROUNDS, TOOL_DENIED};
use crate::error::ChatError;
use crate::message::ToolCallRequest;
use crate::output::Renderer;
use crate::provider::{ChatRequest, CompletionClient};
use crate::stream::{FinishReason, LineDecoder, SseRecord, StreamDelta, TurnAccumulator};
use crate::tools::{ToolAdvertisement, ToolRegistry};
use crate::transcript::Transcript;

/// Where the session is in its protocol loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Requesting,
    Streaming,
    AwaitingToolApproval,
    ToolExecuting,
    Complete,
    Failed,
}

/// Result of a completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnSummary {
    /// Final assistant text, as appended to the transcript.
    pub text: String,
    /// Number of tool round-trips the turn took.
    pub tool_rounds: usize,
}

/// How one streamed response ended.
#[derive(Debug)]
enum StreamEnd {
    Finished,
    ToolCall(ToolCallRequest),
}

/// Drives turns against a completion service for one model.
pub struct CompletionSession<'a> {
    client: &'a CompletionClient,
    model: String,
    max_tool_rounds: usize,
    state: SessionState,
}

impl<'a> CompletionSession<'a> {
    pub fn new(client: &'a CompletionClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            state: SessionState::Idle,
        }
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }

    /// Runs one turn for the transcript, whose last message is the user's.
    ///
    /// The enabled tool set is read once, so toggles made while the turn is
    /// suspended only affect the next turn. On failure the in-progress
    /// message is replaced with the error text and nothing is appended.
    pub async fn run_turn(
        &mut self,
        transcript: &mut Transcript,
        tools: &ToolRegistry,
        gate: &dyn ApprovalGate,
        renderer: &mut dyn Renderer,
    ) -> Result<TurnSummary, ChatError> {
        let advertised = tools.describe_enabled();
        renderer.begin_message();

        match self.drive(transcript, tools, &advertised, gate, renderer).await {
            Ok(summary) => {
                self.transition(SessionState::Complete);
                renderer.render_done();
                Ok(summary)
            }
            Err(err) => {
                self.transition(SessionState::Failed);
                renderer.replace_message(&format!("Error: {}", err.user_message()));
                Err(err)
            }
        }
    }

    async fn drive(
        &mut self,
        transcript: &mut Transcript,
        tools: &ToolRegistry,
        advertised: &[ToolAdvertisement],
        gate: &dyn ApprovalGate,
        renderer: &mut dyn Renderer,
    ) -> Result<TurnSummary, ChatError> {
        let mut acc = TurnAccumulator::new();
        let mut tool_rounds = 0;

        loop {
            match self.stream_response(transcript, advertised, &mut acc, renderer).await? {
                StreamEnd::Finished => {
                    let text = acc.take_text();
                    if !text.is_empty() {
                        transcript.push_assistant(text.clone());
                    }
                    return Ok(TurnSummary { text, tool_rounds });
                }
                StreamEnd::ToolCall(call) => {
                    if tool_rounds >= self.max_tool_rounds {
                        return Err(ChatError::ToolRoundsExceeded(self.max_tool_rounds));
                    }
                    tool_rounds += 1;
                    let result = self.resolve_tool_call(&call, tools, gate, renderer).await;
                    transcript.record_tool_exchange(call, result)?;
                    acc.reset();
                    renderer.begin_message();
                }
            }
        }
    }

    /// Issues one request and reads its body until the response ends.
    async fn stream_response(
        &mut self,
        transcript: &Transcript,
        advertised: &[ToolAdvertisement],
        acc: &mut TurnAccumulator,
        renderer: &mut dyn Renderer,
    ) -> Result<StreamEnd, ChatError> {
        self.transition(SessionState::Requesting);
        let messages = transcript.request_messages();
        let request = ChatRequest::new(&self.model, &messages, advertised);
        let response = self.client.stream_chat(&request).await?;

        self.transition(SessionState::Streaming);
        let mut body = pin!(response.bytes_stream());
        let mut lines = LineDecoder::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(ChatError::Stream)?;
            for line in lines.push(&chunk) {
                if let Some(end) = apply_line(&line, acc, renderer) {
                    return Ok(end);
                }
            }
        }
        if let Some(line) = lines.finish() {
            if let Some(end) = apply_line(&line, acc, renderer) {
                return Ok(end);
            }
        }

        debug!("response body ended without [DONE]");
        Ok(end_of_stream(acc))
    }

    /// Waits for the gate, then runs or refuses the call.
    async fn resolve_tool_call(
        &mut self,
        call: &ToolCallRequest,
        tools: &ToolRegistry,
        gate: &dyn ApprovalGate,
        renderer: &mut dyn Renderer,
    ) -> String {
        self.transition(SessionState::AwaitingToolApproval);
        renderer.tool_request(call);

        let result = match gate.request_approval(call).await {
            Decision::Approved => {
                self.transition(SessionState::ToolExecuting);
                info!(tool = %call.function_name, id = %call.id, "executing approved tool call");
                tools.run(call).await
            }
            Decision::Denied => {
                info!(tool = %call.function_name, id = %call.id, "tool call denied");
                TOOL_DENIED.to_string()
            }
        };

        renderer.tool_result(call, &result);
        result
    }
}

/// Applies one event-stream line. Returns how the response ended, if it did.
fn apply_line(
    line: &str,
    acc: &mut TurnAccumulator,
    renderer: &mut dyn Renderer,
) -> Option<StreamEnd> {
    let payload = match SseRecord::parse(line) {
        SseRecord::Blank | SseRecord::KeepAlive | SseRecord::Ignored => return None,
        SseRecord::Done => return Some(end_of_stream(acc)),
        SseRecord::Data(payload) => payload,
    };

    let Some(delta) = StreamDelta::parse(payload) else {
        debug!(payload, "skipping malformed stream event");
        return None;
    };

    if let Some(text) = delta.text {
        acc.push_text(&text);
        renderer.render_token(&text);
    }
    if let Some(fragment) = delta.tool_call {
        acc.push_tool_fragment(fragment);
    }

    match delta.finish_reason? {
        FinishReason::ToolCalls => match acc.take_tool_call() {
            Some(call) => Some(StreamEnd::ToolCall(call)),
            None => {
                warn!("finish reason tool_calls without an assembled tool call");
                None
            }
        },
        FinishReason::Stop => {
            drop_pending_call(acc, "stop");
            Some(StreamEnd::Finished)
        }
        FinishReason::Other(reason) => {
            info!(reason = %reason, "response finished early");
            drop_pending_call(acc, &reason);
            Some(StreamEnd::Finished)
        }
    }
}

/// A response that ended without a finish reason still hands over any tool
/// call it assembled.
fn end_of_stream(acc: &mut TurnAccumulator) -> StreamEnd {
    match acc.take_tool_call() {
        Some(call) => StreamEnd::ToolCall(call),
        None => StreamEnd::Finished,
    }
}

fn drop_pending_call(acc: &mut TurnAccumulator, reason: &str) {
    if let Some(call) = acc.take_tool_call() {
        warn!(tool = %call.function_name, reason, "discarding tool call at end of turn");
    }
}
