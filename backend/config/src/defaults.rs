//! Default values used when an environment variable is unset.

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Sampling temperature for itinerary generation.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub const OLLAMA_MODEL: &str = "mistral";
pub const MOCK_MODEL: &str = "mock-demo";
pub const MISTRAL_MODEL: &str = "mistral-small-latest";
pub const OPENROUTER_MODEL: &str = "mistralai/mistral-7b-instruct";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";

/// Sessions idle for less than this are probably a misconfiguration.
pub const MIN_SENSIBLE_IDLE_SECS: u64 = 60;
