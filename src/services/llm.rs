use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use anyhow::{Context, Result};
use async_trait::async_trait;

/// Something that turns a prompt into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, credential: &str) -> Result<String, ProviderError>;
}

pub struct LLMClient {
    client: reqwest::Client,
    api_url: String,
    model: String,
    temperature: f64,
}

impl LLMClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build HTTP client")?;

        Ok(LLMClient {
            client,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl TextGenerator for LLMClient {
    async fn generate(&self, prompt: &str, credential: &str) -> Result<String, ProviderError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", credential))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }

        // Decode from text so a malformed body is reported as a decode error
        // rather than a transport one.
        let response_text = response.text().await?;
        let completion: ChatCompletionResponse = serde_json::from_str(&response_text)?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ProviderError::NoChoices)
    }
}
