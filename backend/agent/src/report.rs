//! Quality metrics for a generated itinerary.
//!
//! The report never blocks an itinerary; it is logged and served so that
//! constraint drift in model output is visible.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use tripforge_core::{ActivityType, Itinerary, SightseeingPace, TravelForm};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryReport {
    pub version: u32,
    pub total_days: usize,
    pub expected_days: Option<u32>,
    pub duration_matches: bool,
    pub total_activities: usize,
    pub average_activities_per_day: f64,
    pub meals_every_day: bool,
    pub days_without_meal: Vec<u32>,
    pub checkin_on_first_day: bool,
    pub checkout_on_last_day: bool,
    pub unique_locations: usize,
    /// Every parseable time slot lies inside the daily start/end window.
    pub slots_within_window: bool,
    pub slots_outside_window: Vec<String>,
    pub pace: Option<SightseeingPace>,
    /// Days whose activity count falls outside the pace range.
    pub days_off_pace: Vec<u32>,
    pub total_distance_km: f64,
    /// Days whose travel exceeds `max_travel_distance_km`.
    pub days_over_distance: Vec<u32>,
}

impl ItineraryReport {
    pub fn build(itinerary: &Itinerary, form: &TravelForm) -> Self {
        let total_days = itinerary.days.len();
        let total_activities = itinerary.activity_count();

        let has = |day: &tripforge_core::DayPlan, kind: ActivityType| {
            day.activities.iter().any(|a| a.activity_type == kind)
        };

        let days_without_meal: Vec<u32> = itinerary
            .days
            .iter()
            .filter(|d| !has(*d, ActivityType::Meal))
            .map(|d| d.day_number)
            .collect();

        let unique_locations = itinerary
            .days
            .iter()
            .flat_map(|d| d.activities.iter())
            .map(|a| a.location.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect::<HashSet<_>>()
            .len();

        let mut slots_outside_window = Vec::new();
        if let (Some(start), Some(end)) = (form.daily_start_time, form.daily_end_time) {
            for day in &itinerary.days {
                for activity in &day.activities {
                    if let Some((from, to)) = activity.time_range() {
                        if from < start || to > end {
                            slots_outside_window
                                .push(format!("day {}: {}", day.day_number, activity.time_slot));
                        }
                    }
                }
            }
        }

        let days_off_pace = match form.sightseeing_pace {
            Some(pace) => {
                let (min, max) = pace.activities_per_day();
                itinerary
                    .days
                    .iter()
                    .filter(|d| !(min..=max).contains(&d.activities.len()))
                    .map(|d| d.day_number)
                    .collect()
            }
            None => Vec::new(),
        };

        let days_over_distance = match form.max_travel_distance_km {
            Some(limit) => itinerary
                .days
                .iter()
                .filter(|d| d.total_distance_km > f64::from(limit))
                .map(|d| d.day_number)
                .collect(),
            None => Vec::new(),
        };

        Self {
            version: itinerary.version,
            total_days,
            expected_days: form.trip_duration_days,
            duration_matches: form
                .trip_duration_days
                .is_some_and(|d| d as usize == total_days),
            total_activities,
            average_activities_per_day: if total_days == 0 {
                0.0
            } else {
                total_activities as f64 / total_days as f64
            },
            meals_every_day: days_without_meal.is_empty(),
            days_without_meal,
            checkin_on_first_day: itinerary
                .days
                .first()
                .is_some_and(|d| has(d, ActivityType::Checkin)),
            checkout_on_last_day: itinerary
                .days
                .last()
                .is_some_and(|d| has(d, ActivityType::Checkout)),
            unique_locations,
            slots_within_window: slots_outside_window.is_empty(),
            slots_outside_window,
            pace: form.sightseeing_pace,
            days_off_pace,
            total_distance_km: itinerary.total_distance_km(),
            days_over_distance,
        }
    }

    /// True when no hard-constraint check failed.
    pub fn is_clean(&self) -> bool {
        self.duration_matches
            && self.slots_within_window
            && self.days_off_pace.is_empty()
            && self.days_over_distance.is_empty()
    }
}
