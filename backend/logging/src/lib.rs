//! Telemetry and structured logging for TripForge.
//!
//! Handles log redaction, console and rolling NDJSON output, and structured trip events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, EventLogger, TripEvent};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
