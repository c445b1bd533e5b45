use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Trait for LLM providers used by the extractor and planner.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "ollama", "openrouter").
    fn name(&self) -> &str;

    /// Send a completion request and return the response text.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the provider to constrain output to a JSON object.
    pub json_mode: bool,
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}

/// Model selection and sampling defaults shared by the extractor and planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmPolicy {
    /// Model to request from the provider
    pub model: String,
    /// Maximum tokens for completion
    pub max_tokens: u32,
    /// Temperature for generation
    pub temperature: f32,
}

impl Default for LlmPolicy {
    fn default() -> Self {
        Self {
            model: "mistral".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
        }
    }
}

impl LlmPolicy {
    /// Build a request using this policy's model.
    pub fn request(
        &self,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> LlmRequest {
        LlmRequest {
            model: self.model.clone(),
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            json_mode: false,
        }
    }
}

impl LlmRequest {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}
