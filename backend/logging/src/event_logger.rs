//! Trip Event Logger
//!
//! Structured session lifecycle events written through `tracing` under the
//! `trip_events` target, so the JSON file layer turns them into NDJSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TripEvent {
    SessionCreated,
    FormUpdated {
        fields: Vec<String>,
        filled: usize,
        required: usize,
    },
    FormLocked,
    ExtractionFailed {
        error_msg: String,
    },
    ItineraryGenerated {
        version: u32,
        days: usize,
        activities: usize,
    },
    GenerationFailed {
        error_msg: String,
    },
    QualityReport {
        version: u32,
        report: Value,
    },
}

impl TripEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            TripEvent::SessionCreated => "session_created",
            TripEvent::FormUpdated { .. } => "form_updated",
            TripEvent::FormLocked => "form_locked",
            TripEvent::ExtractionFailed { .. } => "extraction_failed",
            TripEvent::ItineraryGenerated { .. } => "itinerary_generated",
            TripEvent::GenerationFailed { .. } => "generation_failed",
            TripEvent::QualityReport { .. } => "quality_report",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: TripEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Build a redacted log entry without emitting it.
    pub fn entry(session_id: &str, mut event: TripEvent) -> EventLogEntry {
        match &mut event {
            TripEvent::ExtractionFailed { error_msg } | TripEvent::GenerationFailed { error_msg } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            _ => {}
        }

        EventLogEntry {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }

    /// Log a trip event for `session_id`, redacting error text first.
    pub fn log_event(session_id: &str, event: TripEvent) {
        let kind = event.kind();
        let entry = Self::entry(session_id, event);
        let payload = serde_json::to_string(&entry).unwrap_or_default();
        info!(target: "trip_events", session_id, kind, event = %payload, "Trip event");
    }
}
