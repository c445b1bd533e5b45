//! LLM provider selection from config.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};

use tripforge_config::{LlmConfig, ProviderKind};
use tripforge_core::{LlmPolicy, LlmProvider};
use tripforge_planner::providers::{DemoProvider, OllamaProvider, OpenAiCompatProvider};

/// Build the configured provider.
pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let timeout = config.timeout_secs.map(Duration::from_secs);

    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderKind::Mock => Arc::new(DemoProvider::new()),
        ProviderKind::Ollama => {
            let mut provider = OllamaProvider::new().with_base_url(config.effective_base_url());
            if let Some(timeout) = timeout {
                provider = provider.with_timeout(timeout)?;
            }
            Arc::new(provider)
        }
        kind @ (ProviderKind::Mistral | ProviderKind::OpenRouter | ProviderKind::OpenAi) => {
            let Some(api_key) = config.api_key.as_deref() else {
                bail!("LLM_API_KEY is required for the {kind} provider");
            };
            let mut provider = match kind {
                ProviderKind::Mistral => OpenAiCompatProvider::mistral(api_key),
                ProviderKind::OpenRouter => OpenAiCompatProvider::openrouter(api_key),
                _ => OpenAiCompatProvider::openai(api_key),
            };
            if let Some(base_url) = config.base_url.as_deref() {
                provider = provider.with_base_url(base_url);
            }
            if let Some(timeout) = timeout {
                provider = provider.with_timeout(timeout)?;
            }
            Arc::new(provider)
        }
    };
    Ok(provider)
}

/// Model and sampling settings shared by the extractor and planner.
pub fn build_policy(config: &LlmConfig) -> LlmPolicy {
    LlmPolicy {
        model: config.effective_model().to_string(),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    }
}
