//! The travel form: hard constraints collected before any planning happens.
//!
//! Eighteen fields are required. `closed_days_restrictions` and
//! `local_guidelines` are optional notes passed through to the planner.
//! Partial updates arrive as loose JSON (from the extractor model or from an
//! HTML form) and are validated field by field into a [`FormUpdate`] before
//! they may touch the form.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TripError;

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $value:literal $(| $alias:literal)*),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
                match normalized.as_str() {
                    $($value $(| $alias)* => Ok($name::$variant),)+
                    _ => Err(format!(
                        "expected one of: {}",
                        Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
                    )),
                }
            }
        }
    };
}

choice_enum! {
    /// Travel group types.
    GroupType {
        Solo => "solo",
        Couple => "couple",
        Family => "family",
        Friends => "friends",
        Group => "group",
        Business => "business",
    }
}

choice_enum! {
    WeatherPreference {
        Any => "any",
        Sunny => "sunny",
        Cloudy => "cloudy",
        Mild => "mild",
    }
}

choice_enum! {
    /// How densely each day should be packed with activities.
    SightseeingPace {
        Relaxed => "relaxed",
        Moderate => "moderate",
        Packed => "packed",
    }
}

choice_enum! {
    TravelMode {
        Driving => "driving" | "drive" | "car",
        Walking => "walking" | "walk",
        PublicTransport => "public_transport" | "public_transit" | "transit",
        Mixed => "mixed",
    }
}

choice_enum! {
    BudgetLevel {
        Economy => "economy" | "budget",
        Standard => "standard",
        Luxury => "luxury",
        Lavish => "lavish",
    }
}

impl SightseeingPace {
    /// Inclusive range of activities per day this pace calls for.
    pub fn activities_per_day(self) -> (usize, usize) {
        match self {
            SightseeingPace::Relaxed => (3, 4),
            SightseeingPace::Moderate => (5, 6),
            SightseeingPace::Packed => (7, 8),
        }
    }
}

/// Every field of the travel form, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    TripDurationDays,
    TripDurationNights,
    TravelerCount,
    GroupType,
    Destinations,
    StartDate,
    EndDate,
    DailyStartTime,
    DailyEndTime,
    WeatherPreference,
    MaxTravelDistanceKm,
    SightseeingPace,
    CabPickupRequired,
    HotelCheckinTime,
    HotelCheckoutTime,
    TrafficConsideration,
    TravelMode,
    Budget,
    ClosedDaysRestrictions,
    LocalGuidelines,
}

impl FormField {
    pub const ALL: [FormField; 20] = [
        FormField::TripDurationDays,
        FormField::TripDurationNights,
        FormField::TravelerCount,
        FormField::GroupType,
        FormField::Destinations,
        FormField::StartDate,
        FormField::EndDate,
        FormField::DailyStartTime,
        FormField::DailyEndTime,
        FormField::WeatherPreference,
        FormField::MaxTravelDistanceKm,
        FormField::SightseeingPace,
        FormField::CabPickupRequired,
        FormField::HotelCheckinTime,
        FormField::HotelCheckoutTime,
        FormField::TrafficConsideration,
        FormField::TravelMode,
        FormField::Budget,
        FormField::ClosedDaysRestrictions,
        FormField::LocalGuidelines,
    ];

    /// Number of fields that must be filled before the form can be locked.
    pub const REQUIRED_COUNT: usize = 18;

    /// Fields asked about first when the user has not mentioned them yet.
    pub const PRIORITY: [FormField; 10] = [
        FormField::Destinations,
        FormField::TripDurationDays,
        FormField::StartDate,
        FormField::EndDate,
        FormField::TravelerCount,
        FormField::GroupType,
        FormField::DailyStartTime,
        FormField::DailyEndTime,
        FormField::SightseeingPace,
        FormField::TravelMode,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FormField::TripDurationDays => "trip_duration_days",
            FormField::TripDurationNights => "trip_duration_nights",
            FormField::TravelerCount => "traveler_count",
            FormField::GroupType => "group_type",
            FormField::Destinations => "destinations",
            FormField::StartDate => "start_date",
            FormField::EndDate => "end_date",
            FormField::DailyStartTime => "daily_start_time",
            FormField::DailyEndTime => "daily_end_time",
            FormField::WeatherPreference => "weather_preference",
            FormField::MaxTravelDistanceKm => "max_travel_distance_km",
            FormField::SightseeingPace => "sightseeing_pace",
            FormField::CabPickupRequired => "cab_pickup_required",
            FormField::HotelCheckinTime => "hotel_checkin_time",
            FormField::HotelCheckoutTime => "hotel_checkout_time",
            FormField::TrafficConsideration => "traffic_consideration",
            FormField::TravelMode => "travel_mode",
            FormField::Budget => "budget",
            FormField::ClosedDaysRestrictions => "closed_days_restrictions",
            FormField::LocalGuidelines => "local_guidelines",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn is_required(self) -> bool {
        !matches!(
            self,
            FormField::ClosedDaysRestrictions | FormField::LocalGuidelines
        )
    }

    /// Human-readable label used in prompts and chat replies.
    pub fn label(self) -> &'static str {
        match self {
            FormField::TripDurationDays => "Trip Duration (days)",
            FormField::TripDurationNights => "Nights",
            FormField::TravelerCount => "Number of Travelers",
            FormField::GroupType => "Group Type",
            FormField::Destinations => "Destinations",
            FormField::StartDate => "Start Date",
            FormField::EndDate => "End Date",
            FormField::DailyStartTime => "Daily Start Time",
            FormField::DailyEndTime => "Daily End Time",
            FormField::WeatherPreference => "Weather Preference",
            FormField::MaxTravelDistanceKm => "Max Daily Travel Distance (km)",
            FormField::SightseeingPace => "Sightseeing Pace",
            FormField::CabPickupRequired => "Cab Pickup Required",
            FormField::HotelCheckinTime => "Hotel Check-in Time",
            FormField::HotelCheckoutTime => "Hotel Check-out Time",
            FormField::TrafficConsideration => "Consider Traffic",
            FormField::TravelMode => "Travel Mode",
            FormField::Budget => "Budget",
            FormField::ClosedDaysRestrictions => "Closed Days",
            FormField::LocalGuidelines => "Local Guidelines",
        }
    }

    /// Follow-up question asked when this field is still missing.
    pub fn question(self) -> &'static str {
        match self {
            FormField::TripDurationDays => "How many days will your trip be?",
            FormField::TripDurationNights => "How many nights will you stay?",
            FormField::TravelerCount => "How many people will be traveling?",
            FormField::GroupType => {
                "What type of group is this? (solo, couple, family, friends, group, or business)"
            }
            FormField::Destinations => "Which destinations would you like to visit?",
            FormField::StartDate => "What is your trip start date?",
            FormField::EndDate => "What is your trip end date?",
            FormField::DailyStartTime => {
                "What time would you like to start your activities each day?"
            }
            FormField::DailyEndTime => "What time would you like to end your activities each day?",
            FormField::WeatherPreference => {
                "Do you have a weather preference? (any, sunny, cloudy, or mild)"
            }
            FormField::MaxTravelDistanceKm => {
                "What's the maximum distance you'd like to travel per day (in kilometers)?"
            }
            FormField::SightseeingPace => {
                "What pace of sightseeing do you prefer? (relaxed, moderate, or packed)"
            }
            FormField::CabPickupRequired => "Do you need cab pickup services?",
            FormField::HotelCheckinTime => "What time is your hotel check-in?",
            FormField::HotelCheckoutTime => "What time is your hotel check-out?",
            FormField::TrafficConsideration => "Should we consider traffic in the planning?",
            FormField::TravelMode => {
                "What's your preferred mode of travel? (driving, walking, public transport, or mixed)"
            }
            FormField::Budget => "What is your budget level? (economy, standard, luxury, or lavish)",
            FormField::ClosedDaysRestrictions => {
                "Are there any days when places you want to visit might be closed?"
            }
            FormField::LocalGuidelines => {
                "Are there any local or government guidelines we should consider?"
            }
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validation failure attached to one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

impl FieldError {
    pub fn new(field: FormField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// The mandatory travel form. Every field is optional until the form is locked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TravelForm {
    pub trip_duration_days: Option<u32>,
    pub trip_duration_nights: Option<u32>,
    pub traveler_count: Option<u32>,
    pub group_type: Option<GroupType>,
    pub destinations: Option<Vec<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default, with = "hhmm")]
    pub daily_start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm")]
    pub daily_end_time: Option<NaiveTime>,
    pub weather_preference: Option<WeatherPreference>,
    pub max_travel_distance_km: Option<u32>,
    pub sightseeing_pace: Option<SightseeingPace>,
    pub cab_pickup_required: Option<bool>,
    #[serde(default, with = "hhmm")]
    pub hotel_checkin_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm")]
    pub hotel_checkout_time: Option<NaiveTime>,
    pub traffic_consideration: Option<bool>,
    pub travel_mode: Option<TravelMode>,
    pub budget: Option<BudgetLevel>,
    pub closed_days_restrictions: Option<Vec<String>>,
    pub local_guidelines: Option<String>,
}

impl TravelForm {
    pub fn is_filled(&self, field: FormField) -> bool {
        match field {
            FormField::TripDurationDays => self.trip_duration_days.is_some(),
            FormField::TripDurationNights => self.trip_duration_nights.is_some(),
            FormField::TravelerCount => self.traveler_count.is_some(),
            FormField::GroupType => self.group_type.is_some(),
            FormField::Destinations => self.destinations.as_ref().is_some_and(|d| !d.is_empty()),
            FormField::StartDate => self.start_date.is_some(),
            FormField::EndDate => self.end_date.is_some(),
            FormField::DailyStartTime => self.daily_start_time.is_some(),
            FormField::DailyEndTime => self.daily_end_time.is_some(),
            FormField::WeatherPreference => self.weather_preference.is_some(),
            FormField::MaxTravelDistanceKm => self.max_travel_distance_km.is_some(),
            FormField::SightseeingPace => self.sightseeing_pace.is_some(),
            FormField::CabPickupRequired => self.cab_pickup_required.is_some(),
            FormField::HotelCheckinTime => self.hotel_checkin_time.is_some(),
            FormField::HotelCheckoutTime => self.hotel_checkout_time.is_some(),
            FormField::TrafficConsideration => self.traffic_consideration.is_some(),
            FormField::TravelMode => self.travel_mode.is_some(),
            FormField::Budget => self.budget.is_some(),
            FormField::ClosedDaysRestrictions => self.closed_days_restrictions.is_some(),
            FormField::LocalGuidelines => self
                .local_guidelines
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty()),
        }
    }

    /// Required fields that are still empty, in declaration order.
    pub fn missing_fields(&self) -> Vec<FormField> {
        FormField::ALL
            .into_iter()
            .filter(|f| f.is_required() && !self.is_filled(*f))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Number of required fields that hold a value.
    pub fn filled_required(&self) -> usize {
        FormField::REQUIRED_COUNT - self.missing_fields().len()
    }

    /// Fields with values, in their wire representation.
    pub fn filled_fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.into_iter().filter(|(_, v)| !v.is_null()).collect(),
            _ => Map::new(),
        }
    }

    /// Overwrite every field the update carries a value for.
    pub fn apply(&mut self, update: &FormUpdate) {
        let v = &update.values;
        merge(&mut self.trip_duration_days, &v.trip_duration_days);
        merge(&mut self.trip_duration_nights, &v.trip_duration_nights);
        merge(&mut self.traveler_count, &v.traveler_count);
        merge(&mut self.group_type, &v.group_type);
        merge(&mut self.destinations, &v.destinations);
        merge(&mut self.start_date, &v.start_date);
        merge(&mut self.end_date, &v.end_date);
        merge(&mut self.daily_start_time, &v.daily_start_time);
        merge(&mut self.daily_end_time, &v.daily_end_time);
        merge(&mut self.weather_preference, &v.weather_preference);
        merge(&mut self.max_travel_distance_km, &v.max_travel_distance_km);
        merge(&mut self.sightseeing_pace, &v.sightseeing_pace);
        merge(&mut self.cab_pickup_required, &v.cab_pickup_required);
        merge(&mut self.hotel_checkin_time, &v.hotel_checkin_time);
        merge(&mut self.hotel_checkout_time, &v.hotel_checkout_time);
        merge(&mut self.traffic_consideration, &v.traffic_consideration);
        merge(&mut self.travel_mode, &v.travel_mode);
        merge(&mut self.budget, &v.budget);
        merge(&mut self.closed_days_restrictions, &v.closed_days_restrictions);
        merge(&mut self.local_guidelines, &v.local_guidelines);
    }

    /// Rules that span more than one field. Only checked when both sides are present.
    pub fn cross_field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                errors.push(FieldError::new(
                    FormField::EndDate,
                    "end date must not be before the start date",
                ));
            } else if let Some(days) = self.trip_duration_days {
                let span = (end - start).num_days() + 1;
                if span != i64::from(days) {
                    errors.push(FieldError::new(
                        FormField::TripDurationDays,
                        format!(
                            "{start} to {end} spans {span} days but the trip duration is {days} days"
                        ),
                    ));
                }
            }
        }

        if let (Some(days), Some(nights)) = (self.trip_duration_days, self.trip_duration_nights) {
            if nights > days {
                errors.push(FieldError::new(
                    FormField::TripDurationNights,
                    "number of nights cannot exceed the number of days",
                ));
            }
        }

        if let (Some(start), Some(end)) = (self.daily_start_time, self.daily_end_time) {
            if end <= start {
                errors.push(FieldError::new(
                    FormField::DailyEndTime,
                    "daily end time must be after the daily start time",
                ));
            }
        }

        errors
    }

    /// Calendar date of a 1-based trip day.
    pub fn date_of_day(&self, day_number: u32) -> Option<NaiveDate> {
        let start = self.start_date?;
        start.checked_add_days(Days::new(u64::from(day_number.checked_sub(1)?)))
    }

    /// Destinations joined for display, or a neutral placeholder.
    pub fn destinations_label(&self) -> String {
        match &self.destinations {
            Some(d) if !d.is_empty() => d.join(", "),
            _ => "your destination".to_string(),
        }
    }
}

fn merge<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
    if let Some(value) = source {
        *target = Some(value.clone());
    }
}

/// A validated partial update. Only fields that passed validation carry a value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormUpdate {
    values: TravelForm,
}

impl FormUpdate {
    /// Validate a loose JSON object field by field.
    ///
    /// Unknown keys are ignored, nulls and blanks are skipped, and values that
    /// fail validation are reported instead of merged.
    pub fn from_json(raw: &Value) -> (Self, Vec<FieldError>) {
        let mut values = TravelForm::default();
        let mut errors = Vec::new();

        let Some(object) = raw.as_object() else {
            return (Self { values }, errors);
        };

        for field in FormField::ALL {
            let Some(raw) = object.get(field.name()) else {
                continue;
            };
            if is_blank(raw) {
                continue;
            }

            let result = match field {
                FormField::TripDurationDays => {
                    parse_count(raw, 1, 30).map(|v| values.trip_duration_days = Some(v))
                }
                FormField::TripDurationNights => {
                    parse_count(raw, 0, 30).map(|v| values.trip_duration_nights = Some(v))
                }
                FormField::TravelerCount => {
                    parse_count(raw, 1, 50).map(|v| values.traveler_count = Some(v))
                }
                FormField::GroupType => parse_choice(raw).map(|v| values.group_type = Some(v)),
                FormField::Destinations => parse_list(raw).map(|v| values.destinations = Some(v)),
                FormField::StartDate => parse_date(raw).map(|v| values.start_date = Some(v)),
                FormField::EndDate => parse_date(raw).map(|v| values.end_date = Some(v)),
                FormField::DailyStartTime => {
                    parse_time_value(raw).map(|v| values.daily_start_time = Some(v))
                }
                FormField::DailyEndTime => {
                    parse_time_value(raw).map(|v| values.daily_end_time = Some(v))
                }
                FormField::WeatherPreference => {
                    parse_choice(raw).map(|v| values.weather_preference = Some(v))
                }
                FormField::MaxTravelDistanceKm => {
                    parse_count(raw, 1, 500).map(|v| values.max_travel_distance_km = Some(v))
                }
                FormField::SightseeingPace => {
                    parse_choice(raw).map(|v| values.sightseeing_pace = Some(v))
                }
                FormField::CabPickupRequired => {
                    parse_bool(raw).map(|v| values.cab_pickup_required = Some(v))
                }
                FormField::HotelCheckinTime => {
                    parse_time_value(raw).map(|v| values.hotel_checkin_time = Some(v))
                }
                FormField::HotelCheckoutTime => {
                    parse_time_value(raw).map(|v| values.hotel_checkout_time = Some(v))
                }
                FormField::TrafficConsideration => {
                    parse_bool(raw).map(|v| values.traffic_consideration = Some(v))
                }
                FormField::TravelMode => parse_choice(raw).map(|v| values.travel_mode = Some(v)),
                FormField::Budget => parse_choice(raw).map(|v| values.budget = Some(v)),
                FormField::ClosedDaysRestrictions => {
                    parse_list(raw).map(|v| values.closed_days_restrictions = Some(v))
                }
                FormField::LocalGuidelines => {
                    parse_text(raw).map(|v| values.local_guidelines = Some(v))
                }
            };

            if let Err(message) = result {
                errors.push(FieldError::new(field, message));
            }
        }

        (Self { values }, errors)
    }

    /// Fields this update will overwrite.
    pub fn fields(&self) -> Vec<FormField> {
        FormField::ALL
            .into_iter()
            .filter(|f| self.values.is_filled(*f))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    pub fn values(&self) -> &TravelForm {
        &self.values
    }
}

/// Form values plus the one-way lock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormState {
    form: TravelForm,
    locked: bool,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &TravelForm {
        &self.form
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_complete(&self) -> bool {
        self.form.is_complete()
    }

    /// Merge a validated update. Returns the fields that were written.
    pub fn update(&mut self, update: &FormUpdate) -> Result<Vec<FormField>, TripError> {
        if self.locked {
            return Err(TripError::FormLocked);
        }
        self.form.apply(update);
        Ok(update.fields())
    }

    /// Every reason the form cannot be locked right now.
    pub fn lock_errors(&self) -> Vec<FieldError> {
        let mut errors: Vec<FieldError> = self
            .form
            .missing_fields()
            .into_iter()
            .map(|f| FieldError::new(f, "this field is required"))
            .collect();
        errors.extend(self.form.cross_field_errors());
        errors
    }

    /// Freeze the form. Fails if it is already locked or not valid.
    pub fn lock(&mut self) -> Result<(), TripError> {
        if self.locked {
            return Err(TripError::FormLocked);
        }
        let errors = self.lock_errors();
        if !errors.is_empty() {
            return Err(TripError::InvalidForm(errors));
        }
        self.locked = true;
        Ok(())
    }

    pub fn status(&self) -> FormStatus {
        let missing_fields = self.form.missing_fields();
        FormStatus {
            filled_fields: self.form.filled_fields(),
            filled_count: FormField::REQUIRED_COUNT - missing_fields.len(),
            required_count: FormField::REQUIRED_COUNT,
            is_complete: missing_fields.is_empty(),
            is_locked: self.locked,
            missing_fields,
        }
    }
}

/// Snapshot of form progress returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormStatus {
    pub filled_fields: Map<String, Value>,
    pub missing_fields: Vec<FormField>,
    pub filled_count: usize,
    pub required_count: usize,
    pub is_complete: bool,
    pub is_locked: bool,
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn parse_count(raw: &Value, min: u32, max: u32) -> Result<u32, String> {
    let n: i64 = match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or("expected a whole number")?,
        Value::String(s) => s
            .split_whitespace()
            .next()
            .and_then(|token| token.parse::<i64>().ok())
            .ok_or_else(|| format!("expected a whole number, got \"{}\"", s.trim()))?,
        _ => return Err("expected a whole number".to_string()),
    };
    if n < i64::from(min) || n > i64::from(max) {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(n as u32)
}

fn parse_bool(raw: &Value) -> Result<bool, String> {
    match raw {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err("expected yes or no".to_string()),
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "on" => Ok(true),
            "false" | "no" | "n" | "0" | "off" => Ok(false),
            other => Err(format!("expected yes or no, got \"{other}\"")),
        },
        _ => Err("expected yes or no".to_string()),
    }
}

fn parse_text(raw: &Value) -> Result<String, String> {
    match raw {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err("expected text".to_string()),
    }
}

fn parse_list(raw: &Value) -> Result<Vec<String>, String> {
    let items: Vec<String> = match raw {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Value::String(s) => s.split(',').map(|part| part.trim().to_string()).collect(),
        _ => return Err("expected a list of names".to_string()),
    };
    let items: Vec<String> = items.into_iter().filter(|s| !s.is_empty()).collect();
    if items.is_empty() {
        return Err("expected at least one entry".to_string());
    }
    Ok(items)
}

fn parse_date(raw: &Value) -> Result<NaiveDate, String> {
    let s = raw.as_str().ok_or("expected a date as YYYY-MM-DD")?;
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("expected a date as YYYY-MM-DD, got \"{}\"", s.trim()))
}

fn parse_time_value(raw: &Value) -> Result<NaiveTime, String> {
    let s = raw.as_str().ok_or("expected a time as HH:MM")?;
    parse_time(s)
}

/// Parse `HH:MM`, `HH:MM:SS`, `h:mm am` or `9pm` style times.
pub fn parse_time(input: &str) -> Result<NaiveTime, String> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect::<String>()
        .to_uppercase();

    let meridiem = ["AM", "PM"]
        .into_iter()
        .find_map(|m| compact.strip_suffix(m).map(|clock| (clock, m)));

    let parsed = match meridiem {
        Some((clock, m)) => {
            let clock = if clock.contains(':') {
                clock.to_string()
            } else {
                format!("{clock}:00")
            };
            NaiveTime::parse_from_str(&format!("{clock}{m}"), "%I:%M%p")
        }
        None => NaiveTime::parse_from_str(&compact, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&compact, "%H:%M:%S")),
    };

    parsed.map_err(|_| format!("expected a time as HH:MM, got \"{}\"", input.trim()))
}

fn parse_choice<T>(raw: &Value) -> Result<T, String>
where
    T: FromStr<Err = String>,
{
    raw.as_str().ok_or("expected text")?.parse()
}

/// Serde adapter writing times as `HH:MM`.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_str(&time.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| super::parse_time(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_json() -> Value {
        json!({
            "trip_duration_days": 3,
            "trip_duration_nights": 2,
            "traveler_count": 2,
            "group_type": "couple",
            "destinations": ["Jaipur"],
            "start_date": "2025-06-01",
            "end_date": "2025-06-03",
            "daily_start_time": "09:00",
            "daily_end_time": "18:00",
            "weather_preference": "any",
            "max_travel_distance_km": 100,
            "sightseeing_pace": "moderate",
            "cab_pickup_required": true,
            "hotel_checkin_time": "14:00",
            "hotel_checkout_time": "11:00",
            "traffic_consideration": true,
            "travel_mode": "mixed",
            "budget": "standard"
        })
    }

    #[test]
    fn test_empty_form_is_missing_every_required_field() {
        let form = TravelForm::default();
        assert_eq!(form.missing_fields().len(), FormField::REQUIRED_COUNT);
        assert!(!form.is_complete());
        assert_eq!(form.filled_required(), 0);
    }

    #[test]
    fn test_required_count_matches_field_table() {
        let required = FormField::ALL.iter().filter(|f| f.is_required()).count();
        assert_eq!(required, FormField::REQUIRED_COUNT);
    }

    #[test]
    fn test_complete_update_fills_form() {
        let (update, errors) = FormUpdate::from_json(&complete_json());
        assert!(errors.is_empty(), "errors: {errors:?}");

        let mut state = FormState::new();
        state.update(&update).unwrap();
        assert!(state.is_complete());
        assert!(state.lock_errors().is_empty());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let (update, errors) = FormUpdate::from_json(&json!({
            "favourite_colour": "blue",
            "destinations": "Goa"
        }));
        assert!(errors.is_empty());
        assert_eq!(update.fields(), vec![FormField::Destinations]);
    }

    #[test]
    fn test_loose_values_are_coerced() {
        let (update, errors) = FormUpdate::from_json(&json!({
            "trip_duration_days": "4 days",
            "cab_pickup_required": "yes",
            "destinations": "Jaipur, Udaipur",
            "daily_start_time": "9am",
            "hotel_checkout_time": "11:30 AM",
            "travel_mode": "public transit"
        }));
        assert!(errors.is_empty(), "errors: {errors:?}");

        let v = update.values();
        assert_eq!(v.trip_duration_days, Some(4));
        assert_eq!(v.cab_pickup_required, Some(true));
        assert_eq!(
            v.destinations,
            Some(vec!["Jaipur".to_string(), "Udaipur".to_string()])
        );
        assert_eq!(v.daily_start_time, NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(v.hotel_checkout_time, NaiveTime::from_hms_opt(11, 30, 0));
        assert_eq!(v.travel_mode, Some(TravelMode::PublicTransport));
    }

    #[test]
    fn test_invalid_values_are_reported_not_merged() {
        let (update, errors) = FormUpdate::from_json(&json!({
            "trip_duration_days": 0,
            "group_type": "pirates",
            "start_date": "next tuesday",
            "traveler_count": 4
        }));
        let failed: Vec<FormField> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            failed,
            vec![
                FormField::TripDurationDays,
                FormField::GroupType,
                FormField::StartDate
            ]
        );
        assert_eq!(update.fields(), vec![FormField::TravelerCount]);
    }

    #[test]
    fn test_nulls_and_blanks_are_skipped() {
        let (update, errors) = FormUpdate::from_json(&json!({
            "destinations": [],
            "local_guidelines": "  ",
            "budget": null
        }));
        assert!(errors.is_empty());
        assert!(update.is_empty());
    }

    #[test]
    fn test_lock_rejects_further_updates() {
        let (update, _) = FormUpdate::from_json(&complete_json());
        let mut state = FormState::new();
        state.update(&update).unwrap();
        state.lock().unwrap();

        let before = state.form().clone();
        let (change, _) = FormUpdate::from_json(&json!({"traveler_count": 9}));
        assert!(matches!(state.update(&change), Err(TripError::FormLocked)));
        assert_eq!(state.form(), &before);
        assert!(matches!(state.lock(), Err(TripError::FormLocked)));
    }

    #[test]
    fn test_lock_requires_complete_form() {
        let mut state = FormState::new();
        let err = state.lock().unwrap_err();
        match err {
            TripError::InvalidForm(errors) => assert_eq!(errors.len(), FormField::REQUIRED_COUNT),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!state.is_locked());
    }

    #[test]
    fn test_cross_field_rules() {
        let mut raw = complete_json();
        raw["trip_duration_days"] = json!(5);
        raw["trip_duration_nights"] = json!(6);
        raw["daily_end_time"] = json!("08:00");
        let (update, _) = FormUpdate::from_json(&raw);

        let mut state = FormState::new();
        state.update(&update).unwrap();
        let fields: Vec<FormField> = state.lock_errors().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&FormField::TripDurationDays));
        assert!(fields.contains(&FormField::TripDurationNights));
        assert!(fields.contains(&FormField::DailyEndTime));
    }

    #[test]
    fn test_date_of_day() {
        let (update, _) = FormUpdate::from_json(&complete_json());
        let mut form = TravelForm::default();
        form.apply(&update);
        assert_eq!(form.date_of_day(1), NaiveDate::from_ymd_opt(2025, 6, 1));
        assert_eq!(form.date_of_day(3), NaiveDate::from_ymd_opt(2025, 6, 3));
        assert_eq!(form.date_of_day(0), None);
    }

    #[test]
    fn test_filled_fields_use_wire_format() {
        let (update, _) = FormUpdate::from_json(&complete_json());
        let mut form = TravelForm::default();
        form.apply(&update);
        let filled = form.filled_fields();
        assert_eq!(filled["daily_start_time"], "09:00");
        assert_eq!(filled["start_date"], "2025-06-01");
        assert_eq!(filled["travel_mode"], "mixed");
        assert!(!filled.contains_key("local_guidelines"));
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in FormField::ALL {
            assert_eq!(FormField::from_name(field.name()), Some(field));
            let json = serde_json::to_value(field).unwrap();
            assert_eq!(json, field.name());
        }
    }
}
