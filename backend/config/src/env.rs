//! Build a [`TripForgeConfig`] from environment variables.
//!
//! Every variable is optional. Values that are present but unparseable are
//! collected into an [`EnvError`] instead of silently falling back to defaults.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::schema::TripForgeConfig;

pub const BIND: &str = "TRIPFORGE_BIND";
pub const PORT: &str = "TRIPFORGE_PORT";
pub const LOG_LEVEL: &str = "TRIPFORGE_LOG_LEVEL";
pub const RUST_LOG: &str = "RUST_LOG";
pub const LOG_DIR: &str = "TRIPFORGE_LOG_DIR";
pub const SESSION_IDLE_SECS: &str = "TRIPFORGE_SESSION_IDLE_SECS";
pub const LLM_PROVIDER: &str = "LLM_PROVIDER";
pub const LLM_BASE_URL: &str = "LLM_BASE_URL";
pub const LLM_API_KEY: &str = "LLM_API_KEY";
pub const LLM_MODEL: &str = "LLM_MODEL";
pub const LLM_TEMPERATURE: &str = "LLM_TEMPERATURE";
pub const LLM_MAX_TOKENS: &str = "LLM_MAX_TOKENS";
pub const LLM_TIMEOUT_SECS: &str = "LLM_TIMEOUT_SECS";

/// One variable that could not be used.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvProblem {
    pub var_name: String,
    pub message: String,
}

/// All problems found while reading the environment.
#[derive(Debug, thiserror::Error)]
#[error("invalid environment: {}", describe(.problems))]
pub struct EnvError {
    pub problems: Vec<EnvProblem>,
}

fn describe(problems: &[EnvProblem]) -> String {
    problems
        .iter()
        .map(|p| format!("{}: {}", p.var_name, p.message))
        .collect::<Vec<_>>()
        .join("; ")
}

struct Reader<F> {
    lookup: F,
    problems: Vec<EnvProblem>,
}

impl<F> Reader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed, non-empty value of `name`.
    fn text(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parsed<T>(&mut self, name: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.text(name)?;
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(e) => {
                self.problems.push(EnvProblem {
                    var_name: name.to_string(),
                    message: format!("cannot parse '{raw}': {e}"),
                });
                None
            }
        }
    }
}

impl TripForgeConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, EnvError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read from a map, mostly for tests.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, EnvError> {
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    /// Read through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EnvError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut reader = Reader {
            lookup,
            problems: Vec::new(),
        };
        let mut config = TripForgeConfig::default();

        if let Some(bind) = reader.text(BIND) {
            config.server.bind = bind;
        }
        if let Some(port) = reader.parsed(PORT) {
            config.server.port = port;
        }
        config.server.session_idle_secs = reader.parsed(SESSION_IDLE_SECS);

        if let Some(level) = reader.text(LOG_LEVEL).or_else(|| reader.text(RUST_LOG)) {
            config.logging.level = level;
        }
        config.logging.dir = reader.text(LOG_DIR).map(PathBuf::from);

        if let Some(provider) = reader.parsed(LLM_PROVIDER) {
            config.llm.provider = provider;
        }
        config.llm.base_url = reader.text(LLM_BASE_URL);
        config.llm.api_key = reader.text(LLM_API_KEY);
        config.llm.model = reader.text(LLM_MODEL);
        if let Some(temperature) = reader.parsed(LLM_TEMPERATURE) {
            config.llm.temperature = temperature;
        }
        if let Some(max_tokens) = reader.parsed(LLM_MAX_TOKENS) {
            config.llm.max_tokens = max_tokens;
        }
        config.llm.timeout_secs = reader.parsed(LLM_TIMEOUT_SECS);

        if reader.problems.is_empty() {
            Ok(config)
        } else {
            Err(EnvError {
                problems: reader.problems,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ProviderKind;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = TripForgeConfig::from_map(&HashMap::new()).unwrap();
        assert_eq!(config, TripForgeConfig::default());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.provider, ProviderKind::Ollama);
    }

    #[test]
    fn reads_every_variable() {
        let config = TripForgeConfig::from_map(&env(&[
            (BIND, "0.0.0.0"),
            (PORT, "9000"),
            (LOG_LEVEL, "debug"),
            (LOG_DIR, "/var/log/tripforge"),
            (SESSION_IDLE_SECS, "3600"),
            (LLM_PROVIDER, "openrouter"),
            (LLM_BASE_URL, "http://proxy/v1"),
            (LLM_API_KEY, "sk-test"),
            (LLM_MODEL, "some/model"),
            (LLM_TEMPERATURE, "0.3"),
            (LLM_MAX_TOKENS, "4000"),
            (LLM_TIMEOUT_SECS, "45"),
        ]))
        .unwrap();

        assert_eq!(config.server.addr(), "0.0.0.0:9000");
        assert_eq!(config.server.session_idle_secs, Some(3600));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.dir, Some(PathBuf::from("/var/log/tripforge")));
        assert_eq!(config.llm.provider, ProviderKind::OpenRouter);
        assert_eq!(config.llm.effective_base_url(), "http://proxy/v1");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.effective_model(), "some/model");
        assert_eq!(config.llm.temperature, 0.3);
        assert_eq!(config.llm.max_tokens, 4000);
        assert_eq!(config.llm.timeout_secs, Some(45));
    }

    #[test]
    fn mock_provider_from_environment() {
        let config = TripForgeConfig::from_map(&env(&[(LLM_PROVIDER, "mock")])).unwrap();
        assert_eq!(config.llm.provider, ProviderKind::Mock);
        assert_eq!(config.llm.effective_model(), "mock-demo");
        assert_eq!(config.llm.api_key, None);
    }

    #[test]
    fn rust_log_is_a_fallback_for_level() {
        let config = TripForgeConfig::from_map(&env(&[(RUST_LOG, "warn")])).unwrap();
        assert_eq!(config.logging.level, "warn");

        let config =
            TripForgeConfig::from_map(&env(&[(RUST_LOG, "warn"), (LOG_LEVEL, "trace")])).unwrap();
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn blank_values_are_treated_as_unset() {
        let config = TripForgeConfig::from_map(&env(&[(LLM_API_KEY, "   "), (PORT, "")])).unwrap();
        assert_eq!(config.llm.api_key, None);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn bad_values_are_all_reported() {
        let err = TripForgeConfig::from_map(&env(&[
            (PORT, "eighty"),
            (LLM_PROVIDER, "gemini"),
            (LLM_TEMPERATURE, "hot"),
        ]))
        .unwrap_err();

        let vars: Vec<&str> = err.problems.iter().map(|p| p.var_name.as_str()).collect();
        assert_eq!(vars, vec![PORT, LLM_PROVIDER, LLM_TEMPERATURE]);
        assert!(err.to_string().contains("gemini"));
    }
}
