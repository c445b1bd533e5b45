use std::sync::Arc;

use serde_json::{json, Value};

use tripforge_agent::{FlowController, InMemorySessionStore};
use tripforge_core::LlmPolicy;
use tripforge_planner::providers::MockProvider;

use crate::server::GatewayState;

pub fn state() -> (GatewayState, Arc<MockProvider>) {
    let provider = Arc::new(MockProvider::new("mock"));
    let controller = FlowController::with_provider(
        Arc::new(InMemorySessionStore::new()),
        provider.clone(),
        LlmPolicy::default(),
    );
    (GatewayState::new(Arc::new(controller)), provider)
}

pub fn complete_form() -> Value {
    json!({
        "trip_duration_days": 2,
        "trip_duration_nights": 1,
        "traveler_count": 2,
        "group_type": "friends",
        "destinations": ["Goa"],
        "start_date": "2025-06-01",
        "end_date": "2025-06-02",
        "daily_start_time": "09:00",
        "daily_end_time": "18:00",
        "weather_preference": "sunny",
        "max_travel_distance_km": 40,
        "sightseeing_pace": "relaxed",
        "cab_pickup_required": false,
        "hotel_checkin_time": "14:00",
        "hotel_checkout_time": "11:00",
        "traffic_consideration": true,
        "travel_mode": "driving",
        "budget": "standard"
    })
}

/// Two relaxed days, three activities each.
pub fn plan() -> String {
    let days: Vec<Value> = (1..=2)
        .map(|n| {
            json!({
                "day_number": n,
                "activities": [
                    {"time_slot": "09:00 - 11:00", "type": "sightseeing",
                     "location": "Fort Aguada", "description": "Views"},
                    {"time_slot": "12:00 - 13:00", "type": "meal",
                     "location": "Shack", "description": "Lunch"},
                    {"time_slot": "15:00 - 17:00", "type": "adventure",
                     "location": "Calangute", "description": "Swim"}
                ]
            })
        })
        .collect();
    json!({"summary": "Two days in Goa", "days": days}).to_string()
}
