//! Typed configuration schema.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Root config object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TripForgeConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

// ─── Server ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Evict sessions idle for longer than this. `None` keeps them forever.
    pub session_idle_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::DEFAULT_BIND.to_string(),
            port: defaults::DEFAULT_PORT,
            session_idle_secs: None,
        }
    }
}

impl ServerConfig {
    /// `host:port`, with IPv6 hosts bracketed.
    pub fn addr(&self) -> String {
        if self.bind.contains(':') && !self.bind.starts_with('[') {
            format!("[{}]:{}", self.bind, self.port)
        } else {
            format!("{}:{}", self.bind, self.port)
        }
    }
}

// ─── LLM ─────────────────────────────────────────────────────────────────────

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    Mistral,
    OpenRouter,
    OpenAi,
    /// Offline demo: keyword extraction and template itineraries.
    Mock,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Ollama,
        ProviderKind::Mistral,
        ProviderKind::OpenRouter,
        ProviderKind::OpenAi,
        ProviderKind::Mock,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::Mistral => "mistral",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Mock => "mock",
        }
    }

    /// Hosted providers refuse requests without a key.
    pub fn requires_api_key(self) -> bool {
        !matches!(self, ProviderKind::Ollama | ProviderKind::Mock)
    }

    /// Whether requests leave the process at all.
    pub fn is_remote(self) -> bool {
        self != ProviderKind::Mock
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::Ollama => defaults::OLLAMA_BASE_URL,
            ProviderKind::Mistral => defaults::MISTRAL_BASE_URL,
            ProviderKind::OpenRouter => defaults::OPENROUTER_BASE_URL,
            ProviderKind::OpenAi => defaults::OPENAI_BASE_URL,
            ProviderKind::Mock => "",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Ollama => defaults::OLLAMA_MODEL,
            ProviderKind::Mistral => defaults::MISTRAL_MODEL,
            ProviderKind::OpenRouter => defaults::OPENROUTER_MODEL,
            ProviderKind::OpenAi => defaults::OPENAI_MODEL,
            ProviderKind::Mock => defaults::MOCK_MODEL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown provider '{}'; use one of: {}",
                    s.trim(),
                    Self::ALL.map(|p| p.as_str()).join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    /// Overrides the provider's default endpoint.
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Overrides the provider's default model.
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// HTTP timeout for model calls. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: None,
            api_key: None,
            model: None,
            temperature: defaults::DEFAULT_TEMPERATURE,
            max_tokens: defaults::DEFAULT_MAX_TOKENS,
            timeout_secs: None,
        }
    }
}

impl LlmConfig {
    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

// ─── Logging ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `tripforge_agent=debug`.
    pub level: String,
    /// Directory for daily-rolling JSON logs. Console only when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::DEFAULT_LOG_LEVEL.to_string(),
            dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_parse_case_insensitively() {
        assert_eq!("OpenRouter".parse::<ProviderKind>(), Ok(ProviderKind::OpenRouter));
        assert_eq!(" ollama ".parse::<ProviderKind>(), Ok(ProviderKind::Ollama));
        let err = "gemini".parse::<ProviderKind>().unwrap_err();
        assert!(err.contains("gemini"));
        assert!(err.contains("mistral"));
    }

    #[test]
    fn mock_provider_is_local_and_keyless() {
        let mock = "mock".parse::<ProviderKind>().unwrap();
        assert_eq!(mock, ProviderKind::Mock);
        assert!(!mock.requires_api_key());
        assert!(!mock.is_remote());
        assert_eq!(mock.default_model(), defaults::MOCK_MODEL);
    }

    #[test]
    fn effective_values_fall_back_to_provider_defaults() {
        let mut llm = LlmConfig {
            provider: ProviderKind::Mistral,
            ..Default::default()
        };
        assert_eq!(llm.effective_base_url(), defaults::MISTRAL_BASE_URL);
        assert_eq!(llm.effective_model(), defaults::MISTRAL_MODEL);

        llm.model = Some("mistral-large-latest".into());
        assert_eq!(llm.effective_model(), "mistral-large-latest");
    }

    #[test]
    fn default_server_address() {
        assert_eq!(ServerConfig::default().addr(), "127.0.0.1:8000");
        let v6 = ServerConfig {
            bind: "::".into(),
            ..ServerConfig::default()
        };
        assert_eq!(v6.addr(), "[::]:8000");
    }
}
