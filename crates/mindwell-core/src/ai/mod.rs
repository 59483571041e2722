pub mod openai;
pub mod retry;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::Config;
use crate::error::CompletionError;
use crate::prompt::PromptMessage;

pub use openai::OpenAIClient;
pub use retry::{CompletionClient, RetryPolicy};

/// Sampling settings sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
}

impl GenerationParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            presence_penalty: Some(config.presence_penalty),
            frequency_penalty: Some(config.frequency_penalty),
        }
    }

    /// Tiny budget for the credential check.
    pub fn probe() -> Self {
        Self {
            max_tokens: 10,
            temperature: 0.7,
            presence_penalty: None,
            frequency_penalty: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<PromptMessage>,
    pub params: GenerationParams,
}

/// One attempt at a chat completion. Retrying is layered on top by
/// [`CompletionClient`].
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, CompletionError>;
}
