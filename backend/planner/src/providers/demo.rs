//! Offline demo provider.
//!
//! Serves the three prompt roles without a model: keyword extraction for the
//! extractor, a template plan built from the prompt's constraints for the
//! planner, and a lookup over the itinerary context for questions. The same
//! request always gets the same answer.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::debug;

use tripforge_core::form::parse_time;
use tripforge_core::{FormField, LlmProvider, LlmRequest, LlmResponse, SightseeingPace};

use crate::prompts::{EXTRACTOR_SYSTEM_PROMPT, PLANNER_SYSTEM_PROMPT};

pub const DEMO_PROVIDER_NAME: &str = "mock";

static DAYS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})[\s-]*days?\b").unwrap());
static NIGHTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})[\s-]*nights?\b").unwrap());
static TRAVELERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s*(?:people|persons|travell?ers|adults|guests|of us)\b").unwrap()
});
static DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap());
static TIME_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2}(?::\d{2})?\s*[ap]m|\d{1,2}:\d{2})\s*(?:to|-|until|till)\s*(\d{1,2}(?::\d{2})?\s*[ap]m|\d{1,2}:\d{2})",
    )
    .unwrap()
});
static CHECKIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)check[\s-]?in\s*(?:at|time|:)?\s*(\d{1,2}(?::\d{2})?\s*(?:[ap]m)?)").unwrap()
});
static CHECKOUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)check[\s-]?out\s*(?:at|time|:)?\s*(\d{1,2}(?::\d{2})?\s*(?:[ap]m)?)").unwrap()
});
static DISTANCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,4})\s*(?:km|kilomet(?:er|re)s?)\b").unwrap());
static DESTINATIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:to|in|visit|visiting|explore|exploring)\s+([A-Z]\p{L}+(?:\s+[A-Z]\p{L}+)*(?:(?:\s*,\s*|\s+and\s+)[A-Z]\p{L}+(?:\s+[A-Z]\p{L}+)*)*)",
    )
    .unwrap()
});
static LIST_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*,\s*|\s+and\s+").unwrap());
static PREFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bi(?:'d| would)?\s+(?:prefer|love|like|enjoy)\s+(?:to\s+)?([^.,;!?\n]+)").unwrap()
});
static NO_CAB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:no|not|without|don't need|do not need)\s+(?:a\s+)?(?:cab|taxi|pickup)").unwrap()
});
static NO_TRAFFIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:ignore|no|not|without|don't worry about|do not worry about)\s+(?:the\s+)?traffic")
        .unwrap()
});
static CONSTRAINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^- ([^:\n]+): (.+)$").unwrap());
static TRIP_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^- Day (\d+): (\d{4}-\d{2}-\d{2})$").unwrap());
static DAY_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bday\s+(\d+)").unwrap());
static CONTEXT_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Day (\d+) \(([^)]*)\): (.*)$").unwrap());

const NOT_PLACES: [&str; 19] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday",
    "Saturday", "Sunday",
];

/// (activity type, location, description); `{city}` is filled per day.
const SIGHTS: [(&str, &str, &str); 6] = [
    ("sightseeing", "{city} Old Town", "Walk the historic centre and its landmarks"),
    ("cultural", "{city} Museum", "See the local art and history collections"),
    ("shopping", "{city} Market", "Browse local crafts and produce"),
    ("sightseeing", "{city} Viewpoint", "Take in the view over the city"),
    ("rest", "{city} Gardens", "Slow down in a green space"),
    ("adventure", "Outskirts of {city}", "Short outdoor excursion"),
];
const MEAL: (&str, &str, &str) = ("meal", "Local restaurant in {city}", "Try regional dishes");
const CHECKIN_STOP: (&str, &str, &str) = ("checkin", "Hotel in {city}", "Check in and drop your bags");
const CHECKOUT_STOP: (&str, &str, &str) = ("checkout", "Hotel in {city}", "Check out and head home");

/// Runs TripForge end to end with no model behind it.
#[derive(Debug, Default)]
pub struct DemoProvider;

impl DemoProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmProvider for DemoProvider {
    fn name(&self) -> &str {
        DEMO_PROVIDER_NAME
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let content = if request.system_prompt == EXTRACTOR_SYSTEM_PROMPT {
            let message = after(&request.user_prompt, "USER MESSAGE:").unwrap_or(&request.user_prompt);
            extract_fields(message).to_string()
        } else if request.system_prompt == PLANNER_SYSTEM_PROMPT {
            template_plan(&request.user_prompt).to_string()
        } else {
            answer(&request.user_prompt)
        };

        debug!(provider = DEMO_PROVIDER_NAME, json = request.json_mode, "Demo response");

        Ok(LlmResponse {
            content,
            provider: DEMO_PROVIDER_NAME.to_string(),
            model: request.model.clone(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}

fn after<'a>(text: &'a str, header: &str) -> Option<&'a str> {
    let start = text.find(header)? + header.len();
    Some(text[start..].trim())
}

/// Text under `header`, up to the next blank line.
fn section<'a>(text: &'a str, header: &str) -> Option<&'a str> {
    let rest = after(text, header)?;
    Some(rest.split("\n\n").next().unwrap_or(rest).trim())
}

// ─── Extraction ──────────────────────────────────────────────────────────────

fn first_number(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    Some(re.captures(text)?.get(1)?.as_str().trim().to_string())
}

fn keyword<'a>(lower: &str, choices: &[(&str, &'a str)]) -> Option<&'a str> {
    choices
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, value)| *value)
}

fn extract_fields(message: &str) -> Value {
    let lower = message.to_lowercase();
    let mut fields = Map::new();
    let mut set = |field: FormField, value: Value| {
        fields.insert(field.name().to_string(), value);
    };

    if let Some(days) = first_number(&DAYS, message) {
        set(FormField::TripDurationDays, json!(days));
    }
    if let Some(nights) = first_number(&NIGHTS, message) {
        set(FormField::TripDurationNights, json!(nights));
    }

    let group = keyword(
        &lower,
        &[
            ("solo", "solo"),
            ("by myself", "solo"),
            ("couple", "couple"),
            ("honeymoon", "couple"),
            ("family", "family"),
            ("kids", "family"),
            ("friends", "friends"),
            ("business", "business"),
            ("work trip", "business"),
            ("group", "group"),
        ],
    );
    if let Some(group) = group {
        set(FormField::GroupType, json!(group));
    }
    let travelers = first_number(&TRAVELERS, message).or(match group {
        Some("solo") => Some(1),
        Some("couple") => Some(2),
        _ => None,
    });
    if let Some(count) = travelers {
        set(FormField::TravelerCount, json!(count));
    }

    if let Some(caps) = DESTINATIONS.captures(message) {
        let places: Vec<String> = LIST_SEPARATOR
            .split(&caps[1])
            .map(str::trim)
            .filter(|p| !p.is_empty() && !NOT_PLACES.contains(p))
            .map(str::to_string)
            .collect();
        if !places.is_empty() {
            set(FormField::Destinations, json!(places));
        }
    }

    let mut dates = DATE.find_iter(message).map(|m| m.as_str());
    if let Some(start) = dates.next() {
        set(FormField::StartDate, json!(start));
    }
    if let Some(end) = dates.next() {
        set(FormField::EndDate, json!(end));
    }

    if let Some(caps) = TIME_RANGE.captures(message) {
        set(FormField::DailyStartTime, json!(caps[1].trim()));
        set(FormField::DailyEndTime, json!(caps[2].trim()));
    }
    if let Some(time) = capture(&CHECKIN, message) {
        set(FormField::HotelCheckinTime, json!(time));
    }
    if let Some(time) = capture(&CHECKOUT, message) {
        set(FormField::HotelCheckoutTime, json!(time));
    }
    if let Some(km) = first_number(&DISTANCE, message) {
        set(FormField::MaxTravelDistanceKm, json!(km));
    }

    let weather = keyword(
        &lower,
        &[("sunny", "sunny"), ("cloudy", "cloudy"), ("mild", "mild"), ("any weather", "any")],
    );
    if let Some(weather) = weather {
        set(FormField::WeatherPreference, json!(weather));
    }

    let pace = keyword(
        &lower,
        &[
            ("relaxed", "relaxed"),
            ("laid back", "relaxed"),
            ("moderate", "moderate"),
            ("packed", "packed"),
            ("busy", "packed"),
        ],
    );
    if let Some(pace) = pace {
        set(FormField::SightseeingPace, json!(pace));
    }

    let mode = keyword(
        &lower,
        &[
            ("public transport", "public_transport"),
            ("metro", "public_transport"),
            ("walking", "walking"),
            ("on foot", "walking"),
            ("driving", "driving"),
            ("mixed", "mixed"),
        ],
    );
    if let Some(mode) = mode {
        set(FormField::TravelMode, json!(mode));
    }

    let budget = keyword(
        &lower,
        &[
            ("economy", "economy"),
            ("cheap", "economy"),
            ("standard", "standard"),
            ("mid-range", "standard"),
            ("luxury", "luxury"),
            ("lavish", "lavish"),
        ],
    );
    if let Some(budget) = budget {
        set(FormField::Budget, json!(budget));
    }

    if NO_CAB.is_match(message) {
        set(FormField::CabPickupRequired, json!(false));
    } else if lower.contains("cab") || lower.contains("taxi") || lower.contains("pickup") {
        set(FormField::CabPickupRequired, json!(true));
    }
    if NO_TRAFFIC.is_match(message) {
        set(FormField::TrafficConsideration, json!(false));
    } else if lower.contains("traffic") {
        set(FormField::TrafficConsideration, json!(true));
    }

    let preferences: Vec<String> = PREFERENCE
        .captures_iter(message)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if !preferences.is_empty() {
        fields.insert("soft_preferences".to_string(), json!(preferences));
    }

    Value::Object(fields)
}

// ─── Planning ────────────────────────────────────────────────────────────────

/// Constraint values keyed by field label.
fn constraints(prompt: &str) -> HashMap<String, String> {
    let Some(block) = section(prompt, "HARD CONSTRAINTS") else {
        return HashMap::new();
    };
    CONSTRAINT
        .captures_iter(block)
        .map(|caps| (caps[1].trim().to_string(), caps[2].trim().to_string()))
        .collect()
}

fn lookup<'a>(constraints: &'a HashMap<String, String>, field: FormField) -> Option<&'a str> {
    constraints.get(field.label()).map(String::as_str)
}

fn fill(stop: (&str, &str, &str), city: &str) -> (String, String, String) {
    (
        stop.0.to_string(),
        stop.1.replace("{city}", city),
        stop.2.to_string(),
    )
}

fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap_or_default()
}

fn template_plan(prompt: &str) -> Value {
    let constraints = constraints(prompt);
    let dates: Vec<String> = section(prompt, "TRIP DAYS:")
        .map(|block| TRIP_DAY.captures_iter(block).map(|c| c[2].to_string()).collect())
        .unwrap_or_default();
    let day_count = if dates.is_empty() {
        lookup(&constraints, FormField::TripDurationDays)
            .and_then(|d| d.parse::<usize>().ok())
            .unwrap_or(1)
    } else {
        dates.len()
    };

    let cities: Vec<String> = lookup(&constraints, FormField::Destinations)
        .map(|d| d.split(", ").map(str::to_string).collect())
        .unwrap_or_else(|| vec!["the city".to_string()]);
    let pace = lookup(&constraints, FormField::SightseeingPace)
        .and_then(|p| p.parse::<SightseeingPace>().ok())
        .unwrap_or(SightseeingPace::Moderate);

    let mut start = lookup(&constraints, FormField::DailyStartTime)
        .and_then(|t| parse_time(t).ok())
        .unwrap_or_else(|| hour(9));
    let mut end = lookup(&constraints, FormField::DailyEndTime)
        .and_then(|t| parse_time(t).ok())
        .unwrap_or_else(|| hour(18));
    if end <= start {
        start = hour(9);
        end = hour(18);
    }
    let window = (end - start).num_minutes();
    let per_day = (pace.activities_per_day().0 as i64).min(window / 30).max(1);
    let step = window / per_day;
    let length = (step - 15).max(15);

    let max_km = lookup(&constraints, FormField::MaxTravelDistanceKm)
        .and_then(|d| d.parse::<f64>().ok());
    let leg_km = max_km
        .map(|km| ((km / per_day as f64) * 10.0).floor() / 10.0)
        .unwrap_or(5.0)
        .min(5.0);

    let days: Vec<Value> = (0..day_count)
        .map(|d| {
            let city = &cities[d % cities.len()];
            let activities: Vec<Value> = (0..per_day)
                .map(|i| {
                    let stop = if d == 0 && i == 0 {
                        CHECKIN_STOP
                    } else if d + 1 == day_count && i + 1 == per_day {
                        CHECKOUT_STOP
                    } else if i == 1 {
                        MEAL
                    } else {
                        SIGHTS[(i as usize + d) % SIGHTS.len()]
                    };
                    let (kind, location, description) = fill(stop, city);
                    let from = start + Duration::minutes(i * step);
                    let to = from + Duration::minutes(length);
                    json!({
                        "time_slot": format!("{} - {}", from.format("%H:%M"), to.format("%H:%M")),
                        "activity_type": kind,
                        "location": location,
                        "description": description,
                        "duration_minutes": length,
                        "travel_distance_km": if i == 0 { 0.0 } else { leg_km },
                    })
                })
                .collect();
            json!({
                "day_number": d + 1,
                "date": dates.get(d),
                "theme": format!("Exploring {city}"),
                "activities": activities,
            })
        })
        .collect();

    let preferences: Vec<String> = section(prompt, "SOFT PREFERENCES")
        .map(|block| {
            block
                .lines()
                .filter_map(|l| l.strip_prefix("- "))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut plan = json!({
        "summary": format!(
            "A {day_count}-day {pace} trip through {}, built from a template without a model.",
            cities.join(", ")
        ),
        "days": days,
        "hotel_recommendations": [{
            "name": format!("{} Central Hotel", cities[0]),
            "location": cities[0],
            "description": "Central base close to the first day's sights",
            "price_range": lookup(&constraints, FormField::Budget),
        }],
        "suggestions": cities.iter().map(|c| format!("Ask locals about seasonal events in {c}")).collect::<Vec<_>>(),
        "pro_tips": ["Keep offline copies of your bookings.", "Start early to beat the midday crowds."],
        "soft_preferences_applied": [],
        "soft_preferences_ignored": preferences,
    });

    if let Some(instruction) = section(prompt, "MODIFICATION REQUEST:") {
        apply_request(&mut plan, instruction, day_count);
    }
    plan
}

/// Record a modification on the day it names, or on day 1.
fn apply_request(plan: &mut Value, instruction: &str, day_count: usize) {
    let day = DAY_REF
        .captures(instruction)
        .and_then(|c| c[1].parse::<usize>().ok())
        .filter(|d| (1..=day_count).contains(d))
        .unwrap_or(1);

    let activities = plan
        .get_mut("days")
        .and_then(|days| days.get_mut(day - 1))
        .and_then(|d| d.get_mut("activities"))
        .and_then(Value::as_array_mut);
    if let Some(activity) = activities.and_then(|a| {
        let middle = a.len() / 2;
        a.get_mut(middle)
    }) {
        let description = format!(
            "{} ({instruction})",
            activity["description"].as_str().unwrap_or_default()
        );
        activity["description"] = json!(description);
        activity["notes"] = json!(format!("Adjusted for: {instruction}"));
    }
    plan["changes_made"] = json!([format!("Day {day}: {instruction}")]);
    plan["change_summary"] = json!(format!("Applied \"{instruction}\" to day {day}."));
}

// ─── Questions ───────────────────────────────────────────────────────────────

struct ContextDay {
    number: u32,
    date: String,
    theme: String,
    stops: Vec<String>,
}

fn answer(prompt: &str) -> String {
    let question = section(prompt, "USER QUESTION:").unwrap_or(prompt);
    let context = after(prompt, "ITINERARY CONTEXT:").unwrap_or_default();
    let destination = context
        .lines()
        .find_map(|l| l.strip_prefix("Destination: "))
        .unwrap_or("your destination");

    let mut days: Vec<ContextDay> = Vec::new();
    for line in context.lines() {
        if let Some(caps) = CONTEXT_DAY.captures(line) {
            days.push(ContextDay {
                number: caps[1].parse().unwrap_or(0),
                date: caps[2].to_string(),
                theme: caps[3].to_string(),
                stops: Vec::new(),
            });
        } else if let (Some(stop), Some(day)) = (line.strip_prefix("- "), days.last_mut()) {
            day.stops.push(stop.to_string());
        }
    }

    let asked = DAY_REF
        .captures(question)
        .and_then(|c| c[1].parse::<u32>().ok())
        .and_then(|n| days.iter().find(|d| d.number == n));
    if let Some(day) = asked {
        return format!(
            "Day {} ({}) is about {}: {}.",
            day.number,
            day.date,
            day.theme,
            day.stops.join("; ")
        );
    }

    match days.first() {
        Some(first) => format!(
            "Your {destination} plan covers {} day(s) starting {}. Ask about a specific day, \
             like \"what is on day 1?\", for the details.",
            days.len(),
            first.date
        ),
        None => format!("I can answer questions about your {destination} itinerary once it exists."),
    }
}
