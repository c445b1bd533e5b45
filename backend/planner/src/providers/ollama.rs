use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tripforge_core::{LlmProvider, LlmRequest, LlmResponse};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama local LLM provider, speaking the native `/api/chat` endpoint.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
        }
    }

    /// Accepts either the server root or its OpenAI-compatible `/v1` mount.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        let url = url.trim_end_matches('/');
        self.base_url = url.strip_suffix("/v1").unwrap_or(url).to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Ollama HTTP client")?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize, Deserialize)]
struct OllamaChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
    eval_count: Option<u64>,
    prompt_eval_count: Option<u64>,
}

impl OllamaChatRequest {
    fn from_request(request: &LlmRequest) -> Self {
        let system = (!request.system_prompt.is_empty()).then(|| OllamaChatMessage {
            role: "system".into(),
            content: request.system_prompt.clone(),
        });
        let user = OllamaChatMessage {
            role: "user".into(),
            content: request.user_prompt.clone(),
        };
        Self {
            model: request.model.clone(),
            messages: system.into_iter().chain([user]).collect(),
            stream: false,
            format: request.json_mode.then_some("json"),
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let started = Instant::now();
        let url = format!("{}/api/chat", self.base_url);
        debug!(url = %url, model = %request.model, json = request.json_mode, "Ollama chat request");

        let response = self
            .client
            .post(&url)
            .json(&OllamaChatRequest::from_request(request))
            .send()
            .await
            .with_context(|| format!("Could not reach Ollama at {}", self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("Ollama returned {status}: {}", detail.trim());
        }

        let reply: OllamaChatResponse = response
            .json()
            .await
            .context("Ollama sent a body that is not a chat response")?;
        if reply.message.content.trim().is_empty() {
            bail!("Ollama returned an empty message for model {}", request.model);
        }

        Ok(LlmResponse {
            content: reply.message.content,
            provider: self.name().to_string(),
            model: request.model.clone(),
            tokens_used: reply.prompt_eval_count.unwrap_or(0) + reply.eval_count.unwrap_or(0),
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripforge_core::LlmPolicy;

    #[test]
    fn test_base_url_strips_openai_mount() {
        let provider = OllamaProvider::new().with_base_url("http://gpu-box:11434/v1/");
        assert_eq!(provider.base_url(), "http://gpu-box:11434");
    }

    #[test]
    fn test_request_body() {
        let request = LlmPolicy::default().request("", "plan a trip").json();
        let value = serde_json::to_value(OllamaChatRequest::from_request(&request)).unwrap();
        assert_eq!(value["format"], "json");
        assert_eq!(value["stream"], false);
        assert_eq!(value["options"]["num_predict"], 2000);
        // No system message when the prompt is empty.
        assert_eq!(value["messages"].as_array().unwrap().len(), 1);
        assert_eq!(value["messages"][0]["role"], "user");

        let plain = LlmPolicy::default().request("be brief", "hi");
        let value = serde_json::to_value(OllamaChatRequest::from_request(&plain)).unwrap();
        assert!(value.get("format").is_none());
        assert_eq!(value["messages"][0]["content"], "be brief");
    }
}
