use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of activities in an itinerary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Sightseeing,
    Meal,
    Shopping,
    Adventure,
    Cultural,
    #[serde(alias = "check_in", alias = "check-in")]
    Checkin,
    #[serde(alias = "check_out", alias = "check-out")]
    Checkout,
    Rest,
    Travel,
    #[serde(other)]
    Other,
}

/// A single activity in a day plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Time range such as `09:00 - 11:00`.
    pub time_slot: String,
    #[serde(rename = "type", alias = "activity_type")]
    pub activity_type: ActivityType,
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub travel_distance_km: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Activity {
    /// Parse the start and end of `time_slot`, if it is a `HH:MM - HH:MM` range.
    pub fn time_range(&self) -> Option<(NaiveTime, NaiveTime)> {
        let (start, end) = self
            .time_slot
            .split_once(['-', '–'])
            .map(|(a, b)| (a.trim(), b.trim()))?;
        let start = NaiveTime::parse_from_str(start, "%H:%M").ok()?;
        let end = NaiveTime::parse_from_str(end, "%H:%M").ok()?;
        Some((start, end))
    }
}

/// Plan for one day of the trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    /// 1-based, contiguous within an itinerary.
    pub day_number: u32,
    pub date: NaiveDate,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub weather: Option<String>,
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub total_distance_km: f64,
}

impl DayPlan {
    pub fn activity_distance_km(&self) -> f64 {
        self.activities.iter().map(|a| a.travel_distance_km).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelRecommendation {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price_range: Option<String>,
    /// Informal rating such as "4-star" or "Budget".
    #[serde(default)]
    pub rating: Option<String>,
}

/// A complete, immutable itinerary version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub summary: String,
    pub days: Vec<DayPlan>,
    #[serde(default)]
    pub hotel_recommendations: Vec<HotelRecommendation>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub pro_tips: Vec<String>,
    #[serde(default)]
    pub soft_preferences_applied: Vec<String>,
    #[serde(default)]
    pub soft_preferences_ignored: Vec<String>,
    #[serde(default)]
    pub changes_made: Vec<String>,
    #[serde(default)]
    pub change_summary: Option<String>,
}

impl Itinerary {
    pub fn total_distance_km(&self) -> f64 {
        self.days.iter().map(|d| d.total_distance_km).sum()
    }

    pub fn day(&self, day_number: u32) -> Option<&DayPlan> {
        self.days.iter().find(|d| d.day_number == day_number)
    }

    pub fn activity_count(&self) -> usize {
        self.days.iter().map(|d| d.activities.len()).sum()
    }

    /// Day numbers whose activities differ from `previous`.
    pub fn changed_days(&self, previous: &Itinerary) -> Vec<u32> {
        self.days
            .iter()
            .filter(|day| {
                previous
                    .day(day.day_number)
                    .map_or(true, |old| old.activities != day.activities)
            })
            .map(|day| day.day_number)
            .collect()
    }

    pub fn summary_entry(&self) -> VersionSummary {
        VersionSummary {
            version: self.version,
            created_at: self.created_at,
            summary: self.summary.clone(),
            total_days: self.days.len(),
            change_summary: self.change_summary.clone(),
        }
    }
}

/// One line of the version history listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSummary {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub summary: String,
    pub total_days: usize,
    pub change_summary: Option<String>,
}
