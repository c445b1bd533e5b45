pub mod error;
pub mod form;
pub mod itinerary;
pub mod session;
pub mod traits;

pub use error::TripError;
pub use form::{
    BudgetLevel, FieldError, FormField, FormState, FormStatus, FormUpdate, GroupType,
    SightseeingPace, TravelForm, TravelMode, WeatherPreference,
};
pub use itinerary::{
    Activity, ActivityType, DayPlan, HotelRecommendation, Itinerary, VersionSummary,
};
pub use session::{ChatMessage, FlowState, Role, Session, SessionId};
pub use traits::{LlmPolicy, LlmProvider, LlmRequest, LlmResponse};
