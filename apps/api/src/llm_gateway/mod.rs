//! LLM Gateway — the single point of entry for all chat-completion calls.
//!
//! ARCHITECTURAL RULE: no other module may call a provider API directly.
//! All LLM interactions MUST go through the `LlmGateway` trait. The backend
//! (Azure OpenAI or Google Gemini) is selected exactly once at startup via
//! `build_gateway`; call sites never branch on the provider.
//!
//! Each call is a single attempt with a per-call timeout. Failures are
//! surfaced to the caller — retry policy belongs to the stages, and the
//! funnel deliberately has none.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::config::{Config, LlmProvider};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Provider-neutral role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// The capability every stage depends on: send an ordered message list to
/// the configured completion provider and get the assistant's raw text back.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn send(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        want_json: bool,
    ) -> Result<String, GatewayError>;
}

/// Constructs the gateway variant matching the configured provider.
pub fn build_gateway(config: &Config) -> Arc<dyn LlmGateway> {
    match config.provider {
        LlmProvider::AzureOpenAi => Arc::new(AzureOpenAiGateway::new(config)),
        LlmProvider::GoogleGemini => Arc::new(GeminiGateway::new(config)),
    }
}

/// Sends the messages with structured-JSON output requested and parses the
/// reply, stripping any markdown code fences the model wrapped it in.
pub async fn send_json<T: DeserializeOwned>(
    gateway: &dyn LlmGateway,
    messages: &[ChatMessage],
    temperature: f32,
) -> Result<T, GatewayError> {
    let text = gateway.send(messages, temperature, true).await?;
    let text = strip_json_fences(&text);
    if text.is_empty() {
        return Err(GatewayError::EmptyContent);
    }
    serde_json::from_str(text).map_err(GatewayError::Parse)
}

fn http_client() -> Client {
    Client::builder()
        .timeout(CALL_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client")
}

// ────────────────────────────────────────────────────────────────────────────
// Azure OpenAI
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AzureMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AzureRequest<'a> {
    model: &'a str,
    messages: Vec<AzureMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct AzureResponse {
    choices: Vec<AzureChoice>,
}

#[derive(Debug, Deserialize)]
struct AzureChoice {
    message: AzureChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct AzureChoiceMessage {
    content: Option<String>,
}

pub struct AzureOpenAiGateway {
    client: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
    deployment: String,
}

impl AzureOpenAiGateway {
    pub fn new(config: &Config) -> Self {
        Self {
            client: http_client(),
            endpoint: config.azure_endpoint.clone(),
            api_key: config.azure_api_key.clone(),
            api_version: config.azure_api_version.clone(),
            deployment: config.azure_deployment.clone(),
        }
    }
}

fn openai_role(role: ChatRole) -> &'static str {
    match role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

#[async_trait]
impl LlmGateway for AzureOpenAiGateway {
    async fn send(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        want_json: bool,
    ) -> Result<String, GatewayError> {
        let url = format!(
            "{}openai/deployments/{}/chat/completions",
            self.endpoint, self.deployment
        );
        let body = AzureRequest {
            model: &self.deployment,
            messages: messages
                .iter()
                .map(|m| AzureMessage {
                    role: openai_role(m.role),
                    content: &m.content,
                })
                .collect(),
            temperature,
            response_format: want_json.then(|| json!({"type": "json_object"})),
        };

        let response = self
            .client
            .post(&url)
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: AzureResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or(GatewayError::EmptyContent)?;

        debug!("LLM call succeeded (azure_openai, temperature={temperature})");
        Ok(content)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Google Gemini
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiReplyContent,
}

#[derive(Debug, Deserialize)]
struct GeminiReplyContent {
    #[serde(default)]
    parts: Vec<GeminiReplyPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiReplyPart {
    text: Option<String>,
}

pub struct GeminiGateway {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiGateway {
    pub fn new(config: &Config) -> Self {
        Self {
            client: http_client(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
        }
    }

    /// Maps the provider-neutral message list onto Gemini's wire shape:
    /// system messages fold into `system_instruction`, assistant turns
    /// become role "model".
    fn build_request(messages: &[ChatMessage], temperature: f32, want_json: bool) -> GeminiRequest {
        let system_text = messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let contents = messages
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .map(|m| GeminiContent {
                role: Some(match m.role {
                    ChatRole::Assistant => "model",
                    _ => "user",
                }),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        GeminiRequest {
            system_instruction: (!system_text.is_empty()).then(|| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: system_text }],
            }),
            contents,
            generation_config: GeminiGenerationConfig {
                temperature,
                response_mime_type: want_json.then_some("application/json"),
            },
        }
    }
}

#[async_trait]
impl LlmGateway for GeminiGateway {
    async fn send(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        want_json: bool,
    ) -> Result<String, GatewayError> {
        let url = format!("{}/{}:generateContent", GEMINI_API_URL, self.model);
        let body = Self::build_request(messages, temperature, want_json);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GeminiResponse = response.json().await?;
        let content = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().find_map(|p| p.text))
            .filter(|c| !c.is_empty())
            .ok_or(GatewayError::EmptyContent)?;

        debug!("LLM call succeeded (google_gemini, temperature={temperature})");
        Ok(content)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Test support
// ────────────────────────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_gemini_request_folds_system_into_instruction() {
        let messages = [
            ChatMessage::system("You are an analyst."),
            ChatMessage::user("Analyze this."),
        ];
        let request = GeminiGateway::build_request(&messages, 0.1, true);

        let instruction = request.system_instruction.expect("system instruction set");
        assert_eq!(instruction.parts[0].text, "You are an analyst.");
        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.contents[0].role, Some("user"));
        assert_eq!(
            request.generation_config.response_mime_type,
            Some("application/json")
        );
    }

    #[test]
    fn test_gemini_request_maps_assistant_to_model_role() {
        let messages = [
            ChatMessage::user("hello"),
            ChatMessage {
                role: ChatRole::Assistant,
                content: "hi".to_string(),
            },
        ];
        let request = GeminiGateway::build_request(&messages, 0.0, false);

        assert!(request.system_instruction.is_none());
        assert_eq!(request.contents[1].role, Some("model"));
        assert!(request.generation_config.response_mime_type.is_none());
    }

    #[tokio::test]
    async fn test_send_json_strips_fences_and_parses() {
        #[derive(Deserialize)]
        struct Reply {
            key: String,
        }

        let gateway = testing::ScriptedGateway::replying(&["```json\n{\"key\": \"value\"}\n```"]);
        let reply: Reply = send_json(&gateway, &[ChatMessage::user("q")], 0.0)
            .await
            .unwrap();
        assert_eq!(reply.key, "value");
    }

    #[tokio::test]
    async fn test_send_json_rejects_non_json_reply() {
        let gateway = testing::ScriptedGateway::replying(&["sorry, I cannot do that"]);
        let result: Result<serde_json::Value, _> =
            send_json(&gateway, &[ChatMessage::user("q")], 0.0).await;
        assert!(matches!(result, Err(GatewayError::Parse(_))));
    }
}
