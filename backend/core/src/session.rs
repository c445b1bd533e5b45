use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TripError;
use crate::form::{FieldError, FormField, FormState, FormUpdate};
use crate::itinerary::Itinerary;

pub type SessionId = String;

/// Where a session sits in the collect → lock → plan lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    /// Form incomplete or not yet locked.
    Collecting,
    /// Form locked, nothing generated yet.
    LockedNoItinerary,
    /// At least one itinerary version exists.
    HasItinerary,
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowState::Collecting => write!(f, "collecting"),
            FlowState::LockedNoItinerary => write!(f, "locked_no_itinerary"),
            FlowState::HasItinerary => write!(f, "has_itinerary"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A single message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-user conversation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub form: FormState,
    /// Free-text wishes that do not map onto a form field.
    pub soft_preferences: Vec<String>,
    pub transcript: Vec<ChatMessage>,
    /// Every itinerary version, oldest first.
    pub itineraries: Vec<Itinerary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<SessionId>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            form: FormState::new(),
            soft_preferences: Vec::new(),
            transcript: Vec::new(),
            itineraries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn flow_state(&self) -> FlowState {
        if !self.itineraries.is_empty() {
            FlowState::HasItinerary
        } else if self.form.is_locked() && self.form.is_complete() {
            FlowState::LockedNoItinerary
        } else {
            FlowState::Collecting
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        self.transcript.push(ChatMessage {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
        self.touch();
    }

    /// Record a soft preference, ignoring case-insensitive duplicates.
    pub fn add_soft_preference(&mut self, preference: &str) -> bool {
        let preference = preference.trim();
        if preference.is_empty()
            || self
                .soft_preferences
                .iter()
                .any(|p| p.eq_ignore_ascii_case(preference))
        {
            return false;
        }
        self.soft_preferences.push(preference.to_string());
        self.touch();
        true
    }

    pub fn update_form(&mut self, update: &FormUpdate) -> Result<Vec<FormField>, TripError> {
        let written = self.form.update(update)?;
        self.touch();
        Ok(written)
    }

    pub fn lock_form(&mut self) -> Result<(), TripError> {
        self.form.lock()?;
        self.touch();
        Ok(())
    }

    pub fn lock_errors(&self) -> Vec<FieldError> {
        self.form.lock_errors()
    }

    pub fn current_itinerary(&self) -> Option<&Itinerary> {
        self.itineraries.last()
    }

    pub fn itinerary_version(&self, version: u32) -> Option<&Itinerary> {
        self.itineraries.iter().find(|it| it.version == version)
    }

    pub fn next_version(&self) -> u32 {
        self.current_itinerary().map_or(1, |it| it.version + 1)
    }

    /// Append a new version. History is never rewritten.
    pub fn push_itinerary(&mut self, itinerary: Itinerary) -> Result<&Itinerary, TripError> {
        let expected = self.next_version();
        if itinerary.version != expected {
            return Err(TripError::VersionConflict {
                expected,
                got: itinerary.version,
            });
        }
        self.itineraries.push(itinerary);
        self.touch();
        Ok(&self.itineraries[self.itineraries.len() - 1])
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
