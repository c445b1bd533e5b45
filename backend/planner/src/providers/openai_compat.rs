use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tripforge_core::{LlmProvider, LlmRequest, LlmResponse};

pub const MISTRAL_URL: &str = "https://api.mistral.ai/v1";
pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Provider for any OpenAI-style `/chat/completions` API
/// (Mistral, OpenRouter, OpenAI).
pub struct OpenAiCompatProvider {
    client: Client,
    name: String,
    api_key: String,
    base_url: String,
}

impl OpenAiCompatProvider {
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            name: name.into(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn mistral(api_key: impl Into<String>) -> Self {
        Self::new("mistral", api_key, MISTRAL_URL)
    }

    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new("openrouter", api_key, OPENROUTER_URL)
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", api_key, OPENAI_URL)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .with_context(|| format!("Failed to build {} HTTP client", self.name))?;
        Ok(self)
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

fn build_body(request: &LlmRequest) -> ChatRequest {
    let system = (!request.system_prompt.is_empty()).then(|| ChatMessage {
        role: "system".into(),
        content: request.system_prompt.clone(),
    });
    let user = ChatMessage {
        role: "user".into(),
        content: request.user_prompt.clone(),
    };

    ChatRequest {
        model: request.model.clone(),
        messages: system.into_iter().chain([user]).collect(),
        max_tokens: Some(request.max_tokens),
        temperature: Some(request.temperature),
        response_format: request
            .json_mode
            .then_some(ResponseFormat { kind: "json_object" }),
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let started = Instant::now();
        let url = format!("{}/chat/completions", self.base_url);
        debug!(provider = %self.name, url = %url, model = %request.model, json = request.json_mode, "Chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&build_body(request))
            .send()
            .await
            .with_context(|| format!("Could not reach {} at {}", self.name, self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("{} returned {status}: {}", self.name, detail.trim());
        }

        let reply: ChatResponse = response
            .json()
            .await
            .with_context(|| format!("{} sent a body that is not a chat completion", self.name))?;

        let Some(content) = reply.choices.into_iter().next().map(|c| c.message.content) else {
            bail!("{} returned no choices", self.name);
        };

        Ok(LlmResponse {
            content,
            provider: self.name.clone(),
            model: request.model.clone(),
            tokens_used: reply.usage.and_then(|u| u.total_tokens).unwrap_or(0),
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }
}
