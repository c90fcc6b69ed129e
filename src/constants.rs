//! Centralized constants for chatwire.
//!
//! All magic numbers, default strings, and fixed protocol literals live here
//! so they can be changed in one place.

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "chatwire";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "amazon/nova-pro-v1";

/// Default base URL of the OpenAI-compatible completion service.
pub const DEFAULT_API_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Conversation mode selected when none is configured.
pub const DEFAULT_MODE: &str = "standard";

/// Built-in conversation modes and their system prompts.
pub const BUILTIN_MODES: &[(&str, &str)] = &[
    ("standard", "You are a helpful assistant."),
    (
        "creative",
        "You are a creative assistant focused on innovative and imaginative solutions.",
    ),
    (
        "technical",
        "You are a technical assistant focused on precise, detailed technical explanations.",
    ),
    (
        "analytical",
        "You are an analytical assistant focused on data-driven insights. \
You analyse any text and image and provide advanced insights.",
    ),
];

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Per-project configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = "chatwire.toml";

/// Readline history filename.
pub const HISTORY_FILENAME: &str = "chat_history.txt";

/// Persisted chat transcript filename.
pub const CHAT_STORE_FILENAME: &str = "chat.json";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: &[&str] = &["CHATWIRE_API_KEY", "OPENROUTER_API_KEY"];

/// Environment variable that relocates every chatwire directory.
pub const HOME_ENV: &str = "CHATWIRE_HOME";

/// Environment variable holding the log filter.
pub const LOG_ENV_VAR: &str = "CHATWIRE_LOG";

// --- Provider attribution ---

/// Default `HTTP-Referer` attribution header.
pub const DEFAULT_REFERER: &str = "https://github.com/chatwire";

/// Default `X-Title` attribution header.
pub const DEFAULT_TITLE: &str = "AI Chat Interface";

// --- Streaming protocol ---

/// Prefix of an SSE data record.
pub const SSE_DATA_PREFIX: &str = "data:";

/// Payload that marks the end of one streamed response.
pub const SSE_DONE: &str = "[DONE]";

/// Keep-alive payload OpenRouter sends while a model is warming up.
pub const KEEP_ALIVE_PAYLOAD: &str = "OPENROUTER PROCESSING";

/// Finish reason for a natural end of turn.
pub const FINISH_STOP: &str = "stop";

/// Finish reason signalling a tool call must be run.
pub const FINISH_TOOL_CALLS: &str = "tool_calls";

/// Upper bound on tool round-trips within one turn.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 16;

// --- Fixed user-facing strings ---

/// Tool result sent back when the user denies a tool call.
pub const TOOL_DENIED: &str = "Tool execution denied by user";

/// Text part substituted when a submission only carries images.
pub const IMAGES_PLACEHOLDER: &str = "Here are some images:";

/// Message used when a failed request has no structured error body.
pub const GENERIC_API_ERROR: &str = "API request failed";

// --- Image attachments ---

/// MIME types accepted for image attachments.
pub const SUPPORTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Maximum image size (bytes) accepted for attachment.
pub const MAX_IMAGE_SIZE: u64 = 20 * 1024 * 1024;
