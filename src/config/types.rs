//! Struct definitions and serde defaults for chatwire configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for chatwire, deserialized from `config.toml`.
///
/// Every field has a serde default so chatwire runs without a config file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Model identifier sent with each request (e.g. `"amazon/nova-pro-v1"`).
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of the OpenAI-compatible completion service.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// API key. Environment variables take precedence over this value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Conversation mode whose prompt becomes the system prompt.
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Upper bound on tool round-trips in a single turn.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
    /// Extra modes, or overrides of the built-in prompts, keyed by name.
    #[serde(default)]
    pub modes: BTreeMap<String, String>,
    /// Tool settings.
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Attribution headers sent with every request.
    #[serde(default)]
    pub attribution: AttributionConfig,
}

/// Which registered tools are advertised at startup.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolsConfig {
    #[serde(default)]
    pub enabled: Vec<String>,
}

/// Values for the `HTTP-Referer` and `X-Title` headers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AttributionConfig {
    #[serde(default = "default_referer")]
    pub referer: String,
    #[serde(default = "default_title")]
    pub title: String,
}

/// Project-level overrides read from `chatwire.toml`.
///
/// Only fields present in the file replace the global values.
#[derive(Debug, Default, Deserialize, Clone)]
pub(super) struct ProjectConfig {
    pub model: Option<String>,
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
    pub mode: Option<String>,
    #[serde(default)]
    pub modes: BTreeMap<String, String>,
    pub tools: Option<ToolsConfig>,
    pub max_tool_rounds: Option<usize>,
    pub attribution: Option<AttributionConfig>,
}

pub(super) fn default_model() -> String {
    crate::constants::DEFAULT_MODEL.to_string()
}

fn default_api_base_url() -> String {
    crate::constants::DEFAULT_API_BASE_URL.to_string()
}

fn default_mode() -> String {
    crate::constants::DEFAULT_MODE.to_string()
}

fn default_max_tool_rounds() -> usize {
    crate::constants::DEFAULT_MAX_TOOL_ROUNDS
}

fn default_referer() -> String {
    crate::constants::DEFAULT_REFERER.to_string()
}

fn default_title() -> String {
    crate::constants::DEFAULT_TITLE.to_string()
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            referer: default_referer(),
            title: default_title(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base_url: default_api_base_url(),
            api_key: None,
            mode: default_mode(),
            modes: BTreeMap::new(),
            tools: ToolsConfig::default(),
            max_tool_rounds: default_max_tool_rounds(),
            attribution: AttributionConfig::default(),
        }
    }
}
