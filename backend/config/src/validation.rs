//! Config validation: semantic checks with user-friendly error messages.

use thiserror::Error;

use crate::defaults::MIN_SENSIBLE_IDLE_SECS;
use crate::env;
use crate::schema::TripForgeConfig;

/// A config validation error with the offending variable and a message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Emit every finding through `tracing`.
    pub fn log(&self) {
        for warning in &self.warnings {
            tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
        }
        for error in &self.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &TripForgeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_llm(config, &mut report);
    report
}

fn validate_server(config: &TripForgeConfig, report: &mut ValidationReport) {
    let server = &config.server;
    if server.bind.trim().is_empty() {
        report.error(env::BIND, "bind address cannot be empty");
    }
    if server.port == 0 {
        report.error(env::PORT, "port must be between 1 and 65535");
    } else if server.port < 1024 && server.port != 80 && server.port != 443 {
        report.warn(
            env::PORT,
            format!(
                "Port {} requires elevated privileges; consider using a port >= 1024",
                server.port
            ),
        );
    }
    if server.bind == "0.0.0.0" || server.bind == "::" {
        report.warn(
            env::BIND,
            "listening on all interfaces; the API has no authentication",
        );
    }
    match server.session_idle_secs {
        Some(0) => report.error(env::SESSION_IDLE_SECS, "idle timeout must be > 0"),
        Some(secs) if secs < MIN_SENSIBLE_IDLE_SECS => report.warn(
            env::SESSION_IDLE_SECS,
            format!("sessions idle for {secs}s will be evicted mid-conversation"),
        ),
        _ => {}
    }
}

fn validate_llm(config: &TripForgeConfig, report: &mut ValidationReport) {
    let llm = &config.llm;

    if llm.provider.requires_api_key() && llm.api_key.is_none() {
        report.error(
            env::LLM_API_KEY,
            format!("an API key is required for provider '{}'", llm.provider),
        );
    }

    let base_url = llm.effective_base_url();
    if llm.provider.is_remote()
        && !(base_url.starts_with("http://") || base_url.starts_with("https://"))
    {
        report.error(
            env::LLM_BASE_URL,
            format!("'{base_url}' must start with http:// or https://"),
        );
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        report.error(env::LLM_TEMPERATURE, "temperature must be between 0.0 and 2.0");
    }
    if llm.max_tokens == 0 {
        report.error(env::LLM_MAX_TOKENS, "max tokens must be >= 1");
    }
    if llm.timeout_secs == Some(0) {
        report.error(env::LLM_TIMEOUT_SECS, "timeout must be > 0");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{LlmConfig, ProviderKind};

    #[test]
    fn default_config_is_valid() {
        let report = validate(&TripForgeConfig::default());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn hosted_provider_without_key_is_error() {
        let mut cfg = TripForgeConfig::default();
        cfg.llm = LlmConfig {
            provider: ProviderKind::OpenRouter,
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, env::LLM_API_KEY);

        cfg.llm.api_key = Some("sk-or-key".into());
        assert!(validate(&cfg).is_valid());
    }

    #[test]
    fn mock_provider_needs_no_key_or_url() {
        let mut cfg = TripForgeConfig::default();
        cfg.llm.provider = ProviderKind::Mock;
        let report = validate(&cfg);
        assert!(report.is_valid(), "errors: {:?}", report.errors);
    }

    #[test]
    fn bad_ranges_are_errors() {
        let mut cfg = TripForgeConfig::default();
        cfg.llm.temperature = 3.5;
        cfg.llm.max_tokens = 0;
        cfg.llm.base_url = Some("localhost:11434".into());
        cfg.server.port = 0;
        let paths: Vec<String> = validate(&cfg).errors.into_iter().map(|e| e.path).collect();
        assert!(paths.contains(&env::LLM_TEMPERATURE.to_string()));
        assert!(paths.contains(&env::LLM_MAX_TOKENS.to_string()));
        assert!(paths.contains(&env::LLM_BASE_URL.to_string()));
        assert!(paths.contains(&env::PORT.to_string()));
    }

    #[test]
    fn exposed_bind_is_a_warning() {
        let mut cfg = TripForgeConfig::default();
        cfg.server.bind = "0.0.0.0".into();
        cfg.server.session_idle_secs = Some(5);
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
    }
}
