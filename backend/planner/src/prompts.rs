//! Prompt templates for the extractor and planner roles.

use chrono::NaiveDate;
use serde_json::Value;
use tripforge_core::{FormField, Itinerary, TravelForm};

pub const EXTRACTOR_SYSTEM_PROMPT: &str = r#"You are a travel information extractor. Your ONLY job is to extract travel planning facts from the user's message and return them as JSON.

STRICT RULES:
1. Extract ONLY what the user explicitly states
2. Return null for any field not mentioned
3. Do NOT guess or infer missing values
4. Do NOT ask questions, plan trips, or give suggestions
5. Return ONLY a JSON object using the exact field names below

FIELDS:
- trip_duration_days: integer
- trip_duration_nights: integer
- traveler_count: integer
- group_type: "solo" | "couple" | "family" | "friends" | "group" | "business"
- destinations: array of strings
- start_date: "YYYY-MM-DD"
- end_date: "YYYY-MM-DD"
- daily_start_time: "HH:MM"
- daily_end_time: "HH:MM"
- weather_preference: "any" | "sunny" | "cloudy" | "mild"
- closed_days_restrictions: array of strings
- local_guidelines: string
- max_travel_distance_km: integer
- sightseeing_pace: "relaxed" | "moderate" | "packed"
- cab_pickup_required: boolean
- hotel_checkin_time: "HH:MM"
- hotel_checkout_time: "HH:MM"
- traffic_consideration: boolean
- travel_mode: "driving" | "walking" | "public_transport" | "mixed"
- budget: "economy" | "standard" | "luxury" | "lavish"

ALSO EXTRACT:
- soft_preferences: array of strings (wishes or "I prefer..." statements that do not fit a field above)

Respond with ONLY the JSON object. No explanations."#;

pub const PLANNER_SYSTEM_PROMPT: &str = r#"You are a travel itinerary planner. Generate a realistic, day-by-day travel itinerary.

HARD CONSTRAINTS - NEVER VIOLATE:
- Produce exactly one entry per trip day, numbered from 1, using the dates given
- NEVER exceed max_travel_distance_km per day
- ALWAYS keep activities between daily_start_time and daily_end_time
- Match the sightseeing_pace (relaxed = 3-4 activities, moderate = 5-6, packed = 7-8 per day)
- Include hotel check-in on the first day and check-out on the last day
- If traffic_consideration is true, add buffer time for travel
- Use the travel_mode for realistic transit times and the budget for hotel choices

SOFT PREFERENCES:
Apply them only if they do not conflict with the hard constraints.

OUTPUT FORMAT - return ONLY valid JSON:
{
  "summary": "1-2 sentence trip summary",
  "days": [
    {
      "day_number": 1,
      "date": "YYYY-MM-DD",
      "theme": "Theme of the day",
      "weather": "Short weather note",
      "activities": [
        {
          "time_slot": "HH:MM - HH:MM",
          "activity_type": "sightseeing|meal|shopping|adventure|cultural|checkin|checkout|rest|travel|other",
          "location": "Place name",
          "description": "What to do there",
          "duration_minutes": 60,
          "travel_distance_km": 0.0,
          "notes": "Optional tip"
        }
      ]
    }
  ],
  "hotel_recommendations": [
    {"name": "", "location": "", "description": "", "price_range": "", "rating": ""}
  ],
  "suggestions": ["Nearby attraction or alternative"],
  "pro_tips": ["Local custom or timing tip"],
  "soft_preferences_applied": [],
  "soft_preferences_ignored": [],
  "changes_made": [],
  "change_summary": ""
}"#;

/// Render the filled form as a bullet list of labelled constraints.
pub fn format_constraints(form: &TravelForm) -> String {
    let filled = form.filled_fields();
    FormField::ALL
        .into_iter()
        .filter_map(|field| {
            let value = filled.get(field.name())?;
            Some(format!("- {}: {}", field.label(), display_value(value)))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        other => other.to_string(),
    }
}

fn format_preferences(preferences: &[String]) -> String {
    if preferences.is_empty() {
        "None provided".to_string()
    } else {
        preferences
            .iter()
            .map(|p| format!("- {p}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn format_day_dates(form: &TravelForm) -> String {
    let days = form.trip_duration_days.unwrap_or(0);
    (1..=days)
        .filter_map(|n| form.date_of_day(n).map(|d| format!("- Day {n}: {d}")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn extractor_user_prompt(message: &str, form: &TravelForm, today: NaiveDate) -> String {
    let filled = form.filled_fields();
    let known = if filled.is_empty() {
        "Nothing yet.".to_string()
    } else {
        Value::Object(filled).to_string()
    };
    format!(
        "CONTEXT:\nAlready known: {known}\nToday's date: {today}\n\nUSER MESSAGE:\n{message}"
    )
}

pub fn generation_user_prompt(form: &TravelForm, preferences: &[String]) -> String {
    format!(
        "HARD CONSTRAINTS (MUST follow):\n{}\n\nTRIP DAYS:\n{}\n\nSOFT PREFERENCES (apply if no conflict):\n{}\n\nGenerate the itinerary now.",
        format_constraints(form),
        format_day_dates(form),
        format_preferences(preferences),
    )
}

pub fn modification_user_prompt(
    form: &TravelForm,
    current: &Itinerary,
    instruction: &str,
    preferences: &[String],
) -> String {
    let current_plan = serde_json::to_string(current).unwrap_or_default();
    format!(
        "HARD CONSTRAINTS (still apply):\n{}\n\nTRIP DAYS:\n{}\n\nCURRENT ITINERARY:\n{}\n\nMODIFICATION REQUEST:\n{}\n\nSOFT PREFERENCES:\n{}\n\nReturn the complete modified itinerary, keeping every day. Fill changes_made and change_summary. Constraints cannot be violated even for modifications.",
        format_constraints(form),
        format_day_dates(form),
        current_plan,
        instruction,
        format_preferences(preferences),
    )
}

pub fn assistant_system_prompt(destination: &str) -> String {
    format!(
        "You are a helpful travel assistant for {destination}. Answer the user's question using the itinerary context. Keep answers to 2-3 sentences."
    )
}

pub fn question_user_prompt(itinerary: &Itinerary, question: &str, destination: &str) -> String {
    let mut context = format!(
        "Destination: {destination}\nTrip Summary: {}\n",
        itinerary.summary
    );
    for day in &itinerary.days {
        context.push_str(&format!(
            "Day {} ({}): {}\n",
            day.day_number,
            day.date,
            day.theme.as_deref().unwrap_or("Exploration")
        ));
        for activity in &day.activities {
            context.push_str(&format!(
                "- {}: {}\n",
                activity.time_slot, activity.location
            ));
        }
    }
    format!("USER QUESTION: {question}\n\nITINERARY CONTEXT:\n{context}")
}
