//! Conversation flow.
//!
//! Routes every chat turn by the session's [`FlowState`]: while the form is
//! being collected, messages go to the extractor; once the form is locked,
//! they go to the planner. Session changes are committed only when a turn
//! succeeds.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use tripforge_core::{
    ChatMessage, FlowState, FormField, FormStatus, FormUpdate, Itinerary, LlmPolicy, LlmProvider,
    Role, Session, SessionId, TripError, VersionSummary,
};
use tripforge_logging::{EventLogger, TripEvent};
use tripforge_planner::{InformationExtractor, ItineraryPlanner};

use crate::replies;
use crate::report::ItineraryReport;
use crate::session_store::SessionStore;

/// Explicit action a client may attach to a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    Message,
    Generate,
    Ask,
}

/// One chat turn, after the action has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Message(String),
    Generate,
    Ask(String),
}

impl ChatCommand {
    /// Text that text-only clients send to request generation.
    pub const GENERATE_SENTINEL: &'static str = "generate itinerary";

    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().eq_ignore_ascii_case(Self::GENERATE_SENTINEL) {
            ChatCommand::Generate
        } else {
            ChatCommand::Message(text)
        }
    }

    /// An explicit action wins over the sentinel check.
    pub fn resolve(action: Option<ChatAction>, text: impl Into<String>) -> Self {
        match action {
            None => Self::from_text(text),
            Some(ChatAction::Message) => ChatCommand::Message(text.into()),
            Some(ChatAction::Generate) => ChatCommand::Generate,
            Some(ChatAction::Ask) => ChatCommand::Ask(text.into()),
        }
    }

    fn transcript_text(&self) -> &str {
        match self {
            ChatCommand::Message(text) | ChatCommand::Ask(text) => text,
            ChatCommand::Generate => Self::GENERATE_SENTINEL,
        }
    }
}

/// Result of one chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub reply: String,
    pub state: FlowState,
    pub form_status: FormStatus,
    /// Present when this turn produced a new itinerary version.
    pub itinerary: Option<Itinerary>,
}

/// What a routed turn produced, before it is recorded.
struct Turn {
    reply: String,
    itinerary: Option<Itinerary>,
    /// Soft failures are answered but leave the transcript alone.
    record: bool,
}

impl Turn {
    fn reply(reply: String) -> Self {
        Self {
            reply,
            itinerary: None,
            record: true,
        }
    }

    fn planned(itinerary: Itinerary) -> Self {
        Self {
            reply: replies::itinerary_reply(&itinerary),
            itinerary: Some(itinerary),
            record: true,
        }
    }
}

/// Drives sessions through collect → lock → plan.
pub struct FlowController {
    store: Arc<dyn SessionStore>,
    extractor: InformationExtractor,
    planner: ItineraryPlanner,
}

impl FlowController {
    pub fn new(
        store: Arc<dyn SessionStore>,
        extractor: InformationExtractor,
        planner: ItineraryPlanner,
    ) -> Self {
        Self {
            store,
            extractor,
            planner,
        }
    }

    /// Use one provider for both extraction and planning.
    pub fn with_provider(
        store: Arc<dyn SessionStore>,
        provider: Arc<dyn LlmProvider>,
        policy: LlmPolicy,
    ) -> Self {
        Self::new(
            store,
            InformationExtractor::new(Arc::clone(&provider), policy.clone()),
            ItineraryPlanner::new(provider, policy),
        )
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn provider_name(&self) -> &str {
        self.planner.provider_name()
    }

    /// Start a session. Returns its id and the welcome message.
    pub async fn create_session(&self) -> (SessionId, String) {
        let id = self.store.create().await;
        EventLogger::log_event(&id, TripEvent::SessionCreated);
        (id, replies::WELCOME.to_string())
    }

    #[instrument(skip(self, command))]
    pub async fn chat(
        &self,
        session_id: &str,
        command: ChatCommand,
    ) -> Result<ChatOutcome, TripError> {
        let handle = self.store.get(session_id).await?;
        let mut session = handle.lock().await;
        let state = session.flow_state();
        info!(state = %state, "Chat turn");

        let turn = match (state, &command) {
            (FlowState::Collecting, ChatCommand::Message(text) | ChatCommand::Ask(text)) => {
                self.collect(&mut session, text).await?
            }
            (FlowState::Collecting, ChatCommand::Generate) => {
                if !session.lock_errors().is_empty() {
                    Turn::reply(replies::not_ready_reply(session.form.form()))
                } else {
                    let mut draft = session.clone();
                    draft.lock_form()?;
                    let itinerary = self.generate(&mut draft).await?;
                    EventLogger::log_event(session_id, TripEvent::FormLocked);
                    *session = draft;
                    Turn::planned(itinerary)
                }
            }
            (FlowState::LockedNoItinerary, _)
            | (FlowState::HasItinerary, ChatCommand::Generate) => {
                Turn::planned(self.generate(&mut session).await?)
            }
            (FlowState::HasItinerary, ChatCommand::Message(instruction)) => {
                Turn::planned(self.modify(&mut session, instruction).await?)
            }
            (FlowState::HasItinerary, ChatCommand::Ask(question)) => {
                let current = session.current_itinerary().ok_or(TripError::NoItinerary)?;
                let answer = self
                    .planner
                    .answer_question(current, session.form.form(), question)
                    .await?;
                Turn::reply(answer)
            }
        };

        if turn.record {
            session.add_message(Role::User, command.transcript_text());
            session.add_message(Role::Assistant, turn.reply.clone());
        }

        Ok(ChatOutcome {
            reply: turn.reply,
            state: session.flow_state(),
            form_status: session.form.status(),
            itinerary: turn.itinerary,
        })
    }

    async fn collect(&self, session: &mut Session, text: &str) -> Result<Turn, TripError> {
        let extraction = self.extractor.extract(text, session.form.form()).await;

        if let Some(reason) = &extraction.failure {
            EventLogger::log_event(
                &session.id,
                TripEvent::ExtractionFailed {
                    error_msg: reason.clone(),
                },
            );
            return Ok(Turn {
                reply: extraction.acknowledgement(),
                itinerary: None,
                record: false,
            });
        }

        let written = session.update_form(&extraction.update)?;
        for preference in &extraction.soft_preferences {
            session.add_soft_preference(preference);
        }

        if !written.is_empty() {
            EventLogger::log_event(
                &session.id,
                TripEvent::FormUpdated {
                    fields: written.iter().map(|f| f.name().to_string()).collect(),
                    filled: session.form.form().filled_required(),
                    required: FormField::REQUIRED_COUNT,
                },
            );
        }

        Ok(Turn::reply(replies::collecting_reply(
            &extraction,
            session.form.form(),
        )))
    }

    async fn generate(&self, session: &mut Session) -> Result<Itinerary, TripError> {
        let version = session.next_version();
        let result = self
            .planner
            .generate(&session.form, &session.soft_preferences, version)
            .await;
        self.commit(session, result)
    }

    async fn modify(&self, session: &mut Session, instruction: &str) -> Result<Itinerary, TripError> {
        let current = session.current_itinerary().ok_or(TripError::NoItinerary)?;
        let result = self
            .planner
            .modify(current, &session.form, instruction, &session.soft_preferences)
            .await;
        self.commit(session, result)
    }

    /// Append a successful version and log its quality report.
    fn commit(
        &self,
        session: &mut Session,
        result: Result<Itinerary, TripError>,
    ) -> Result<Itinerary, TripError> {
        let itinerary = match result {
            Ok(itinerary) => itinerary,
            Err(e) => {
                warn!(error = %e, "Itinerary generation failed");
                EventLogger::log_event(
                    &session.id,
                    TripEvent::GenerationFailed {
                        error_msg: e.to_string(),
                    },
                );
                return Err(e);
            }
        };

        let report = ItineraryReport::build(&itinerary, session.form.form());
        session.push_itinerary(itinerary.clone())?;

        EventLogger::log_event(
            &session.id,
            TripEvent::ItineraryGenerated {
                version: itinerary.version,
                days: itinerary.days.len(),
                activities: itinerary.activity_count(),
            },
        );
        EventLogger::log_event(
            &session.id,
            TripEvent::QualityReport {
                version: itinerary.version,
                report: serde_json::to_value(&report).unwrap_or(Value::Null),
            },
        );
        Ok(itinerary)
    }

    // ─── Form operations ─────────────────────────────────────────────────────

    /// Validate, merge and lock in one step. Nothing changes unless all of it succeeds.
    pub async fn submit_form(&self, session_id: &str, raw: &Value) -> Result<FormStatus, TripError> {
        let handle = self.store.get(session_id).await?;
        let mut session = handle.lock().await;
        if session.form.is_locked() {
            return Err(TripError::FormLocked);
        }

        let (update, mut errors) = FormUpdate::from_json(raw);
        let mut form = session.form.clone();
        form.update(&update)?;
        for error in form.lock_errors() {
            if !errors.iter().any(|e| e.field == error.field) {
                errors.push(error);
            }
        }
        if !errors.is_empty() {
            return Err(TripError::InvalidForm(errors));
        }
        form.lock()?;

        session.form = form;
        session.touch();
        EventLogger::log_event(session_id, TripEvent::FormLocked);
        Ok(session.form.status())
    }

    /// Merge a partial update without locking. Rejected as a whole if any field is invalid.
    pub async fn update_form(&self, session_id: &str, raw: &Value) -> Result<FormStatus, TripError> {
        let handle = self.store.get(session_id).await?;
        let mut session = handle.lock().await;
        if session.form.is_locked() {
            return Err(TripError::FormLocked);
        }

        let (update, errors) = FormUpdate::from_json(raw);
        if !errors.is_empty() {
            return Err(TripError::InvalidForm(errors));
        }
        let written = session.update_form(&update)?;
        if !written.is_empty() {
            EventLogger::log_event(
                session_id,
                TripEvent::FormUpdated {
                    fields: written.iter().map(|f| f.name().to_string()).collect(),
                    filled: session.form.form().filled_required(),
                    required: FormField::REQUIRED_COUNT,
                },
            );
        }
        Ok(session.form.status())
    }

    pub async fn form_status(&self, session_id: &str) -> Result<FormStatus, TripError> {
        let handle = self.store.get(session_id).await?;
        let session = handle.lock().await;
        Ok(session.form.status())
    }

    // ─── Read-only views ─────────────────────────────────────────────────────

    pub async fn flow_state(&self, session_id: &str) -> Result<FlowState, TripError> {
        let handle = self.store.get(session_id).await?;
        let session = handle.lock().await;
        Ok(session.flow_state())
    }

    pub async fn current_itinerary(&self, session_id: &str) -> Result<Itinerary, TripError> {
        let handle = self.store.get(session_id).await?;
        let session = handle.lock().await;
        session
            .current_itinerary()
            .cloned()
            .ok_or(TripError::NoItinerary)
    }

    pub async fn versions(&self, session_id: &str) -> Result<Vec<VersionSummary>, TripError> {
        let handle = self.store.get(session_id).await?;
        let session = handle.lock().await;
        Ok(session
            .itineraries
            .iter()
            .map(Itinerary::summary_entry)
            .collect())
    }

    pub async fn itinerary_version(
        &self,
        session_id: &str,
        version: u32,
    ) -> Result<Itinerary, TripError> {
        let handle = self.store.get(session_id).await?;
        let session = handle.lock().await;
        session
            .itinerary_version(version)
            .cloned()
            .ok_or(TripError::VersionNotFound(version))
    }

    pub async fn report(&self, session_id: &str) -> Result<ItineraryReport, TripError> {
        let handle = self.store.get(session_id).await?;
        let session = handle.lock().await;
        let current = session.current_itinerary().ok_or(TripError::NoItinerary)?;
        Ok(ItineraryReport::build(current, session.form.form()))
    }

    pub async fn messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, TripError> {
        let handle = self.store.get(session_id).await?;
        let session = handle.lock().await;
        Ok(session.transcript.clone())
    }
}
