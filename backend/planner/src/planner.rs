use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, info, warn};

use tripforge_core::{
    Activity, ActivityType, DayPlan, FormState, HotelRecommendation, Itinerary, LlmPolicy,
    LlmProvider, LlmRequest, TravelForm, TripError,
};

use crate::json_response::parse_json_object;
use crate::prompts::{
    assistant_system_prompt, generation_user_prompt, modification_user_prompt,
    question_user_prompt, PLANNER_SYSTEM_PROMPT,
};

/// Full itineraries run long; answers stay short.
const PLAN_MAX_TOKENS: u32 = 3000;
const ANSWER_MAX_TOKENS: u32 = 300;

/// Generates and modifies itineraries from a locked travel form.
pub struct ItineraryPlanner {
    provider: Arc<dyn LlmProvider>,
    policy: LlmPolicy,
}

impl ItineraryPlanner {
    pub fn new(provider: Arc<dyn LlmProvider>, policy: LlmPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Produce a fresh itinerary with the given version number.
    pub async fn generate(
        &self,
        form: &FormState,
        preferences: &[String],
        version: u32,
    ) -> Result<Itinerary, TripError> {
        ensure_ready(form)?;
        let prompt = generation_user_prompt(form.form(), preferences);
        let request = self.plan_request(prompt);

        let raw = self.call(&request).await?;
        let itinerary = normalize(raw, form.form(), version, None)?;

        info!(
            version,
            days = itinerary.days.len(),
            activities = itinerary.activity_count(),
            "Itinerary generated"
        );
        Ok(itinerary)
    }

    /// Apply a free-text change to `current`, producing the next version.
    pub async fn modify(
        &self,
        current: &Itinerary,
        form: &FormState,
        instruction: &str,
        preferences: &[String],
    ) -> Result<Itinerary, TripError> {
        ensure_ready(form)?;
        let prompt = modification_user_prompt(form.form(), current, instruction, preferences);
        let request = self.plan_request(prompt);

        let raw = self.call(&request).await?;
        let itinerary = normalize(raw, form.form(), current.version + 1, Some(current))?;

        info!(
            from_version = current.version,
            version = itinerary.version,
            changed_days = ?itinerary.changed_days(current),
            "Itinerary modified"
        );
        Ok(itinerary)
    }

    /// Answer a question about the current itinerary. Never creates a version.
    pub async fn answer_question(
        &self,
        itinerary: &Itinerary,
        form: &TravelForm,
        question: &str,
    ) -> Result<String, TripError> {
        let destination = form.destinations_label();
        let request = self
            .policy
            .request(
                assistant_system_prompt(&destination),
                question_user_prompt(itinerary, question, &destination),
            )
            .with_max_tokens(ANSWER_MAX_TOKENS);

        let response = self
            .provider
            .complete(&request)
            .await
            .map_err(|e| TripError::LlmError {
                provider: self.provider.name().to_string(),
                message: e.to_string(),
            })?;

        let answer = response.content.trim();
        if answer.is_empty() {
            return Err(TripError::LlmError {
                provider: response.provider,
                message: "empty answer".to_string(),
            });
        }
        Ok(answer.to_string())
    }

    fn plan_request(&self, prompt: String) -> LlmRequest {
        self.policy
            .request(PLANNER_SYSTEM_PROMPT, prompt)
            .with_max_tokens(self.policy.max_tokens.max(PLAN_MAX_TOKENS))
            .json()
    }

    async fn call(&self, request: &LlmRequest) -> Result<Value, TripError> {
        let start = Instant::now();
        let response = self.provider.complete(request).await.map_err(|e| {
            warn!(provider = %self.provider.name(), error = %e, "Planner call failed");
            TripError::GenerationFailed(format!("{}: {}", self.provider.name(), e))
        })?;

        debug!(
            provider = %response.provider,
            tokens = response.tokens_used,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Planner responded"
        );

        parse_json_object(&response.content).ok_or_else(|| {
            warn!(provider = %response.provider, "Planner returned no JSON object");
            TripError::GenerationFailed("model output was not a JSON object".to_string())
        })
    }
}

fn ensure_ready(form: &FormState) -> Result<(), TripError> {
    let errors = form.lock_errors();
    if !errors.is_empty() {
        return Err(TripError::InvalidForm(errors));
    }
    if !form.is_locked() {
        return Err(TripError::GenerationFailed(
            "the form must be locked before planning".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DraftItinerary {
    #[serde(deserialize_with = "lenient_text")]
    summary: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    days: Vec<DraftDay>,
    #[serde(deserialize_with = "lenient_list")]
    hotel_recommendations: Vec<Value>,
    #[serde(deserialize_with = "lenient_list")]
    suggestions: Vec<Value>,
    #[serde(deserialize_with = "lenient_list")]
    pro_tips: Vec<Value>,
    #[serde(deserialize_with = "lenient_list")]
    soft_preferences_applied: Vec<Value>,
    #[serde(deserialize_with = "lenient_list")]
    soft_preferences_ignored: Vec<Value>,
    #[serde(deserialize_with = "lenient_list")]
    changes_made: Vec<Value>,
    #[serde(deserialize_with = "lenient_text")]
    change_summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DraftDay {
    #[serde(alias = "day", deserialize_with = "lenient_day_number")]
    day_number: Option<u32>,
    #[serde(deserialize_with = "lenient_text")]
    theme: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    weather: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    activities: Vec<DraftActivity>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DraftActivity {
    #[serde(alias = "time", deserialize_with = "lenient_text")]
    time_slot: Option<String>,
    #[serde(alias = "type", deserialize_with = "lenient_text")]
    activity_type: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    location: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    duration_minutes: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    travel_distance_km: Option<f64>,
    #[serde(deserialize_with = "lenient_text")]
    notes: Option<String>,
}

// Models quote numbers, send `null` for empty lists and a bare object where a
// list belongs. None of that should sink an otherwise usable draft.

/// A number, or a string holding one. Anything else reads as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite()))
}

fn lenient_day_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?
        .filter(|n| *n >= 1.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// `null` is an empty list and a lone item is a list of one.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    };
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(serde::de::Error::custom))
        .collect()
}

impl DraftActivity {
    fn into_activity(self) -> Option<Activity> {
        let location = non_blank(self.location);
        let description = non_blank(self.description);
        if location.is_none() && description.is_none() {
            return None;
        }
        let activity_type = self
            .activity_type
            .and_then(|t| serde_json::from_value(Value::String(t.trim().to_lowercase())).ok())
            .unwrap_or(ActivityType::Other);

        Some(Activity {
            time_slot: non_blank(self.time_slot).unwrap_or_default(),
            activity_type,
            location: location.unwrap_or_default(),
            description: description.unwrap_or_default(),
            duration_minutes: self
                .duration_minutes
                .filter(|m| *m > 0.0)
                .map(|m| m.round() as u32),
            travel_distance_km: self.travel_distance_km.filter(|d| *d > 0.0).unwrap_or(0.0),
            notes: non_blank(self.notes),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Flatten a string-or-object entry into display text.
fn entry_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_blank(Some(s.clone())),
        Value::Object(map) => {
            let name = map.get("name").and_then(Value::as_str).map(str::trim);
            let detail = map
                .get("description")
                .or_else(|| map.get("reason"))
                .and_then(Value::as_str)
                .map(str::trim);
            match (name, detail) {
                (Some(n), Some(d)) if !n.is_empty() && !d.is_empty() => Some(format!("{n}: {d}")),
                (Some(n), _) if !n.is_empty() => Some(n.to_string()),
                (_, Some(d)) if !d.is_empty() => Some(d.to_string()),
                _ => None,
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn entries(values: &[Value]) -> Vec<String> {
    values.iter().filter_map(entry_text).collect()
}

fn field_text(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => non_blank(Some(s.clone())),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn hotel(value: &Value) -> Option<HotelRecommendation> {
    let map = value.as_object()?;
    Some(HotelRecommendation {
        name: field_text(map, "name")?,
        location: field_text(map, "location").unwrap_or_default(),
        description: field_text(map, "description").unwrap_or_default(),
        price_range: field_text(map, "price_range"),
        rating: field_text(map, "rating"),
    })
}

/// Validate a model draft against the form and turn it into an [`Itinerary`].
fn normalize(
    raw: Value,
    form: &TravelForm,
    version: u32,
    previous: Option<&Itinerary>,
) -> Result<Itinerary, TripError> {
    let draft: DraftItinerary = serde_json::from_value(raw)
        .map_err(|e| TripError::GenerationFailed(format!("malformed itinerary: {e}")))?;

    let expected = form.trip_duration_days.ok_or_else(|| {
        TripError::GenerationFailed("trip duration is not set".to_string())
    })?;
    if draft.days.len() != expected as usize {
        return Err(TripError::GenerationFailed(format!(
            "expected {expected} days, model returned {}",
            draft.days.len()
        )));
    }

    let mut numbered: Vec<(u32, DraftDay)> = draft
        .days
        .into_iter()
        .enumerate()
        .map(|(i, day)| (day.day_number.unwrap_or(i as u32 + 1), day))
        .collect();
    numbered.sort_by_key(|(n, _)| *n);

    let mut days = Vec::with_capacity(numbered.len());
    for (position, (day_number, draft_day)) in numbered.into_iter().enumerate() {
        if day_number != position as u32 + 1 {
            return Err(TripError::GenerationFailed(format!(
                "days are not numbered contiguously from 1 (found day {day_number} at position {})",
                position + 1
            )));
        }
        let date = form.date_of_day(day_number).ok_or_else(|| {
            TripError::GenerationFailed("start date is not set".to_string())
        })?;

        let activities: Vec<Activity> = draft_day
            .activities
            .into_iter()
            .filter_map(DraftActivity::into_activity)
            .collect();
        if activities.is_empty() {
            return Err(TripError::GenerationFailed(format!(
                "day {day_number} has no activities"
            )));
        }

        let mut day = DayPlan {
            day_number,
            date,
            theme: non_blank(draft_day.theme),
            weather: non_blank(draft_day.weather),
            activities,
            total_distance_km: 0.0,
        };
        day.total_distance_km = day.activity_distance_km();
        days.push(day);
    }

    let mut itinerary = Itinerary {
        version,
        created_at: Utc::now(),
        summary: non_blank(draft.summary).unwrap_or_else(|| {
            format!("{}-day trip to {}", expected, form.destinations_label())
        }),
        days,
        hotel_recommendations: draft.hotel_recommendations.iter().filter_map(hotel).collect(),
        suggestions: entries(&draft.suggestions),
        pro_tips: entries(&draft.pro_tips),
        soft_preferences_applied: entries(&draft.soft_preferences_applied),
        soft_preferences_ignored: entries(&draft.soft_preferences_ignored),
        changes_made: entries(&draft.changes_made),
        change_summary: non_blank(draft.change_summary),
    };

    if let Some(previous) = previous {
        if itinerary.changes_made.is_empty() {
            itinerary.changes_made = itinerary
                .changed_days(previous)
                .into_iter()
                .map(|n| format!("Updated day {n}"))
                .collect();
        }
    }

    Ok(itinerary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;
    use chrono::NaiveDate;
    use serde_json::json;
    use tripforge_core::FormUpdate;

    fn locked_form(days: u32) -> FormState {
        let end = NaiveDate::from_ymd_opt(2025, 6, days).unwrap();
        let (update, errors) = FormUpdate::from_json(&json!({
            "trip_duration_days": days,
            "trip_duration_nights": days - 1,
            "traveler_count": 2,
            "group_type": "couple",
            "destinations": ["Jaipur"],
            "start_date": "2025-06-01",
            "end_date": end.to_string(),
            "daily_start_time": "09:00",
            "daily_end_time": "18:00",
            "weather_preference": "any",
            "max_travel_distance_km": 50,
            "sightseeing_pace": "relaxed",
            "cab_pickup_required": false,
            "hotel_checkin_time": "14:00",
            "hotel_checkout_time": "11:00",
            "traffic_consideration": true,
            "travel_mode": "driving",
            "budget": "standard"
        }));
        assert!(errors.is_empty(), "errors: {errors:?}");
        let mut state = FormState::new();
        state.update(&update).unwrap();
        state.lock().unwrap();
        state
    }

    fn draft(days: u32, day_two: &str) -> String {
        let days: Vec<Value> = (1..=days)
            .map(|n| {
                let place = if n == 2 { day_two } else { "Old City" };
                json!({
                    "day_number": n,
                    "date": "1999-01-01",
                    "theme": format!("Day {n}"),
                    "activities": [
                        {"time_slot": "09:00 - 11:00", "activity_type": "sightseeing",
                         "location": place, "description": "Explore", "travel_distance_km": 4.5},
                        {"time_slot": "12:00 - 13:00", "type": "meal",
                         "location": "Cafe", "description": "Lunch", "duration_minutes": 60}
                    ]
                })
            })
            .collect();
        json!({
            "summary": "A relaxed trip",
            "days": days,
            "hotel_recommendations": [{"name": "Haveli", "location": "Jaipur", "rating": 4.5}],
            "suggestions": ["Amber Fort", {"name": "Step well", "description": "at dusk"}],
            "pro_tips": ["Carry water"]
        })
        .to_string()
    }

    fn planner(provider: Arc<MockProvider>) -> ItineraryPlanner {
        ItineraryPlanner::new(provider, LlmPolicy::default())
    }

    #[tokio::test]
    async fn test_generate_assigns_dates_from_form() {
        let provider = Arc::new(MockProvider::new("mock"));
        provider.push_text(draft(3, "Palace"));

        let itinerary = planner(provider.clone())
            .generate(&locked_form(3), &[], 1)
            .await
            .unwrap();

        assert_eq!(itinerary.version, 1);
        let dates: Vec<NaiveDate> = itinerary.days.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            ]
        );
        let numbers: Vec<u32> = itinerary.days.iter().map(|d| d.day_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(itinerary.days[0].total_distance_km, 4.5);
        assert_eq!(itinerary.days[0].activities[1].activity_type, ActivityType::Meal);
        assert_eq!(itinerary.hotel_recommendations[0].rating.as_deref(), Some("4.5"));
        assert_eq!(itinerary.suggestions, vec!["Amber Fort", "Step well: at dusk"]);
        assert!(provider.requests()[0].json_mode);
        assert_eq!(provider.requests()[0].max_tokens, PLAN_MAX_TOKENS);
    }

    #[tokio::test]
    async fn test_wrong_day_count_is_rejected() {
        let provider = Arc::new(MockProvider::new("mock"));
        provider.push_text(draft(2, "Palace"));
        let err = planner(provider)
            .generate(&locked_form(3), &[], 1)
            .await
            .unwrap_err();
        assert!(matches!(err, TripError::GenerationFailed(_)));
    }

    #[tokio::test]
    async fn test_empty_day_is_rejected() {
        let provider = Arc::new(MockProvider::new("mock"));
        let mut raw: Value = serde_json::from_str(&draft(2, "Palace")).unwrap();
        raw["days"][1]["activities"] = json!([]);
        provider.push_text(raw.to_string());
        let err = planner(provider)
            .generate(&locked_form(2), &[], 1)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("day 2 has no activities"));
    }

    #[tokio::test]
    async fn test_gap_in_day_numbers_is_rejected() {
        let provider = Arc::new(MockProvider::new("mock"));
        let mut raw: Value = serde_json::from_str(&draft(2, "Palace")).unwrap();
        raw["days"][1]["day_number"] = json!(3);
        provider.push_text(raw.to_string());
        let err = planner(provider)
            .generate(&locked_form(2), &[], 1)
            .await
            .unwrap_err();
        assert!(matches!(err, TripError::GenerationFailed(_)));
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_generation_failed() {
        let provider = Arc::new(MockProvider::new("mock"));
        provider.push_failure("timeout");
        let err = planner(provider)
            .generate(&locked_form(1), &[], 1)
            .await
            .unwrap_err();
        assert!(matches!(err, TripError::GenerationFailed(_)));
    }

    #[tokio::test]
    async fn test_unlocked_form_is_refused_without_calling_model() {
        let provider = Arc::new(MockProvider::new("mock"));
        let err = planner(provider.clone())
            .generate(&FormState::new(), &[], 1)
            .await
            .unwrap_err();
        assert!(matches!(err, TripError::InvalidForm(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_modify_bumps_version_and_records_changes() {
        let provider = Arc::new(MockProvider::new("mock"));
        provider.push_text(draft(3, "Palace"));
        provider.push_text(draft(3, "City Museum"));

        let planner = planner(provider.clone());
        let form = locked_form(3);
        let first = planner.generate(&form, &[], 1).await.unwrap();
        let second = planner
            .modify(&first, &form, "change day 2 to include a museum", &[])
            .await
            .unwrap();

        assert_eq!(second.version, 2);
        assert_ne!(second.days[1].activities, first.days[1].activities);
        assert_eq!(second.days[0].activities, first.days[0].activities);
        assert_eq!(second.changes_made, vec!["Updated day 2".to_string()]);

        let prompt = &provider.requests()[1].user_prompt;
        assert!(prompt.contains("change day 2 to include a museum"));
        assert!(prompt.contains("Palace"));
    }

    #[tokio::test]
    async fn test_answer_question_uses_itinerary_context() {
        let provider = Arc::new(MockProvider::new("mock"));
        provider.push_text(draft(1, "Palace"));
        provider.push_text("  Bring comfortable shoes.  ");

        let planner = planner(provider.clone());
        let form = locked_form(1);
        let itinerary = planner.generate(&form, &[], 1).await.unwrap();
        let answer = planner
            .answer_question(&itinerary, form.form(), "What should I wear?")
            .await
            .unwrap();

        assert_eq!(answer, "Bring comfortable shoes.");
        let request = &provider.requests()[1];
        assert!(!request.json_mode);
        assert_eq!(request.max_tokens, ANSWER_MAX_TOKENS);
        assert!(request.system_prompt.contains("Jaipur"));
        assert!(request.user_prompt.contains("Old City"));
    }

    #[tokio::test]
    async fn test_quoted_numbers_are_coerced() {
        let provider = Arc::new(MockProvider::new("mock"));
        let mut raw: Value = serde_json::from_str(&draft(1, "Palace")).unwrap();
        raw["days"][0]["day_number"] = json!("1");
        raw["days"][0]["activities"][0]["travel_distance_km"] = json!("2.5");
        raw["days"][0]["activities"][1]["duration_minutes"] = json!("60");
        provider.push_text(raw.to_string());

        let itinerary = planner(provider)
            .generate(&locked_form(1), &[], 1)
            .await
            .unwrap();

        let day = &itinerary.days[0];
        assert_eq!(day.day_number, 1);
        assert_eq!(day.activities[0].travel_distance_km, 2.5);
        assert_eq!(day.activities[1].duration_minutes, Some(60));
        assert_eq!(day.total_distance_km, 2.5);
    }

    #[tokio::test]
    async fn test_null_lists_read_as_empty() {
        let provider = Arc::new(MockProvider::new("mock"));
        let mut raw: Value = serde_json::from_str(&draft(1, "Palace")).unwrap();
        raw["suggestions"] = Value::Null;
        raw["pro_tips"] = Value::Null;
        raw["hotel_recommendations"] = Value::Null;
        raw["changes_made"] = Value::Null;
        raw["summary"] = Value::Null;
        provider.push_text(raw.to_string());

        let itinerary = planner(provider)
            .generate(&locked_form(1), &[], 1)
            .await
            .unwrap();

        assert!(itinerary.suggestions.is_empty());
        assert!(itinerary.pro_tips.is_empty());
        assert!(itinerary.hotel_recommendations.is_empty());
        assert_eq!(itinerary.summary, "1-day trip to Jaipur");
    }

    #[tokio::test]
    async fn test_unreadable_optional_values_are_dropped() {
        let provider = Arc::new(MockProvider::new("mock"));
        let mut raw: Value = serde_json::from_str(&draft(2, "Palace")).unwrap();
        raw["days"][0]["day_number"] = json!("first");
        raw["days"][0]["activities"][1]["duration_minutes"] = json!("about an hour");
        raw["days"][1]["theme"] = json!(2);
        raw["pro_tips"] = json!("Carry water");
        provider.push_text(raw.to_string());

        let itinerary = planner(provider)
            .generate(&locked_form(2), &[], 1)
            .await
            .unwrap();

        assert_eq!(itinerary.days[0].day_number, 1);
        assert_eq!(itinerary.days[0].activities[1].duration_minutes, None);
        assert_eq!(itinerary.days[1].theme.as_deref(), Some("2"));
        assert_eq!(itinerary.pro_tips, vec!["Carry water"]);
    }
}
