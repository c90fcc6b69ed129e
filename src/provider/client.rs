//! HTTP client for the OpenAI-compatible completion service.
//!
//! Contains the [`CompletionClient`] which issues streamed
//! `/chat/completions` requests and `/models` listings, and maps failed
//! responses to [`ChatError`] values carrying a user-facing message.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::constants::GENERIC_API_ERROR;
use crate::error::ChatError;
use crate::message::Message;
use crate::tools::ToolAdvertisement;

/// Body of a streamed completion request.
///
/// `tools` is omitted entirely when no tool is enabled; some services
/// reject an empty list.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<&'a [ToolAdvertisement]>,
}

impl<'a> ChatRequest<'a> {
    pub fn new(model: &'a str, messages: &'a [Message], tools: &'a [ToolAdvertisement]) -> Self {
        Self {
            model,
            messages,
            stream: true,
            tools: (!tools.is_empty()).then_some(tools),
        }
    }
}

/// One entry of the `/models` listing.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub context_length: Option<u64>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// A configured connection to the completion service.
pub struct CompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    referer: String,
    title: String,
}

impl CompletionClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            referer: crate::constants::DEFAULT_REFERER.to_string(),
            title: crate::constants::DEFAULT_TITLE.to_string(),
        }
    }

    /// Sets the `HTTP-Referer` and `X-Title` attribution headers.
    pub fn with_attribution(mut self, referer: impl Into<String>, title: impl Into<String>) -> Self {
        self.referer = referer.into();
        self.title = title.into();
        self
    }

    /// Creates a client from the loaded application config.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is found in the environment or config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .resolve_api_key()
            .context("No API key found. Set CHATWIRE_API_KEY or OPENROUTER_API_KEY, or configure api_key in config.toml")?;
        Ok(Self::new(&config.api_base_url, api_key)
            .with_attribution(&config.attribution.referer, &config.attribution.title))
    }

    /// Attaches the bearer key and attribution headers.
    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
    }

    /// Sends a streamed completion request and returns the response once its
    /// status is known to be successful. The body has not been read yet.
    pub async fn stream_chat(&self, request: &ChatRequest<'_>) -> Result<reqwest::Response, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(
            model = request.model,
            messages = request.messages.len(),
            tools = request.tools.map_or(0, |t| t.len()),
            "sending completion request"
        );

        let response = self
            .authorized(self.http.post(&url))
            .json(request)
            .send()
            .await
            .map_err(ChatError::Connection)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status,
                message: error_message(&body),
            });
        }
        Ok(response)
    }

    /// Fetches the models offered by the service.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .authorized(self.http.get(&url))
            .send()
            .await
            .context("Failed to fetch models")?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to fetch models (HTTP {}): {}", status, error_message(&body));
        }
        let list: ModelList = response.json().await.context("Failed to parse model list")?;
        Ok(list.data)
    }
}

/// Extracts `error.message` from a structured error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| GENERIC_API_ERROR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Content;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_request_without_tools_omits_field() {
        let messages = vec![Message::user(Content::Text("hi".into()))];
        let value = serde_json::to_value(ChatRequest::new("m", &messages, &[])).unwrap();
        assert_eq!(value["stream"], json!(true));
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"error":{"message":"No credits","code":402}}"#),
            "No credits"
        );
        assert_eq!(error_message("<html>bad gateway</html>"), GENERIC_API_ERROR);
        assert_eq!(error_message(r#"{"error":{}}"#), GENERIC_API_ERROR);
    }

    #[tokio::test]
    async fn test_status_failure_maps_to_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string(
                r#"{"error":{"message":"Invalid API key"}}"#,
            ))
            .mount(&server)
            .await;

        let client = CompletionClient::new(server.uri(), "bad-key");
        let messages = vec![Message::user(Content::Text("hi".into()))];
        let err = client
            .stream_chat(&ChatRequest::new("m", &messages, &[]))
            .await
            .unwrap_err();
        match err {
            ChatError::Status { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_models_sends_auth_and_parses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("authorization", "Bearer test-key"))
            .and(header("x-title", "AI Chat Interface"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": "amazon/nova-pro-v1", "context_length": 300000},
                    {"id": "no/context"}
                ]
            })))
            .mount(&server)
            .await;

        let client = CompletionClient::new(format!("{}/", server.uri()), "test-key");
        let models = client.list_models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].id, "amazon/nova-pro-v1");
        assert_eq!(models[0].context_length, Some(300000));
        assert_eq!(models[1].context_length, None);
    }
}
