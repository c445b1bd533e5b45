//! TripForge runtime configuration.
//!
//! Provides:
//! - Typed config schema (server, LLM provider, logging)
//! - Environment loading with per-variable error reporting
//! - Default values per provider
//! - Validation with errors and warnings
//! - Config redaction for safe logging/display

pub mod defaults;
pub mod env;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::{EnvError, EnvProblem};
pub use redact::{collect_redacted_paths, redact};
pub use schema::{LlmConfig, LoggingConfig, ProviderKind, ServerConfig, TripForgeConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};
