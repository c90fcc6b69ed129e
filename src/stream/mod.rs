//! Incremental parsing of streamed chat completions.
//!
//! The pipeline is split in three layers:
//! - [`sse`] reassembles raw body chunks into lines and classifies them.
//! - [`delta`] decodes one JSON data payload into a [`StreamDelta`].
//! - [`accumulator`] merges deltas into the text buffer and tool-call slot
//!   of the response currently being streamed.

pub mod accumulator;
pub mod delta;
pub mod sse;

pub use accumulator::TurnAccumulator;
pub use delta::{FinishReason, StreamDelta};
pub use sse::{LineDecoder, SseRecord};
