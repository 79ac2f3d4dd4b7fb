use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

/// Which chat-completion backend serves all LLM calls for this process.
/// Selected once at startup; call sites only ever see the gateway trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    AzureOpenAi,
    GoogleGemini,
}

impl LlmProvider {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "azure_openai" => Some(Self::AzureOpenAi),
            "google_gemini" => Some(Self::GoogleGemini),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AzureOpenAi => "azure_openai",
            Self::GoogleGemini => "google_gemini",
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if the selected provider's credentials are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: LlmProvider,
    pub azure_endpoint: String,
    pub azure_api_key: String,
    pub azure_api_version: String,
    pub azure_deployment: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub data_dir: PathBuf,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let provider_raw =
            std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "azure_openai".to_string());
        let provider = LlmProvider::parse(&provider_raw.to_lowercase()).unwrap_or_else(|| {
            warn!(
                "Invalid LLM_PROVIDER '{provider_raw}'. Valid options: azure_openai, \
                 google_gemini. Defaulting to azure_openai."
            );
            LlmProvider::AzureOpenAi
        });

        // Only the selected provider's credentials are required.
        let (azure_endpoint, azure_api_key) = match provider {
            LlmProvider::AzureOpenAi => (
                require_env("AZURE_OPENAI_ENDPOINT")?,
                require_env("AZURE_OPENAI_API_KEY")?,
            ),
            LlmProvider::GoogleGemini => (
                std::env::var("AZURE_OPENAI_ENDPOINT").unwrap_or_default(),
                std::env::var("AZURE_OPENAI_API_KEY").unwrap_or_default(),
            ),
        };
        let gemini_api_key = match provider {
            LlmProvider::GoogleGemini => require_env("GOOGLE_GEMINI_API_KEY")?,
            LlmProvider::AzureOpenAi => {
                std::env::var("GOOGLE_GEMINI_API_KEY").unwrap_or_default()
            }
        };

        Ok(Config {
            provider,
            azure_endpoint,
            azure_api_key,
            azure_api_version: std::env::var("AZURE_OPENAI_API_VERSION")
                .unwrap_or_else(|_| "2024-10-21".to_string()),
            azure_deployment: std::env::var("AZURE_OPENAI_DEPLOYMENT")
                .unwrap_or_else(|_| "gpt-4o".to_string()),
            gemini_api_key,
            gemini_model: std::env::var("GOOGLE_GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-pro".to_string()),
            data_dir: PathBuf::from(
                std::env::var("DATA_DIR").unwrap_or_else(|_| "mock-data".to_string()),
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
