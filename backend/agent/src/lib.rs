//! TripForge conversation flow
//!
//! Session storage, the collect → lock → plan state machine, assistant replies,
//! and itinerary quality reports.

pub mod flow_controller;
pub mod replies;
pub mod report;
pub mod session_store;

pub use flow_controller::{ChatAction, ChatCommand, ChatOutcome, FlowController};
pub use report::ItineraryReport;
pub use session_store::{spawn_reaper, InMemorySessionStore, SessionHandle, SessionStore};
