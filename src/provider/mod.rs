//! Completion service access for chatwire.
//!
//! Wraps a [`reqwest`] client behind [`CompletionClient`], keeping HTTP
//! details out of the session and CLI layers.

mod client;
mod listing;

pub use client::{ChatRequest, CompletionClient};
pub use listing::list_models;
