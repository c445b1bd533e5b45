//! Assistant reply text.

use tripforge_core::{FormField, Itinerary, TravelForm};
use tripforge_planner::Extraction;

pub const WELCOME: &str = "Hi! I'm your travel planner. Tell me about the trip you have in mind \
(where, when, and who's coming), or fill in the form. Once every required field is set, \
lock the form or say \"generate itinerary\".";

/// The next field worth asking about, favouring the core trip facts.
pub fn next_question(form: &TravelForm) -> Option<&'static str> {
    let missing = form.missing_fields();
    FormField::PRIORITY
        .into_iter()
        .find(|f| missing.contains(f))
        .or_else(|| missing.first().copied())
        .map(FormField::question)
}

pub fn progress_line(form: &TravelForm) -> String {
    format!(
        "Progress: {}/{} required fields.",
        form.filled_required(),
        FormField::REQUIRED_COUNT
    )
}

/// Reply to a chat message while the form is still being collected.
pub fn collecting_reply(extraction: &Extraction, form: &TravelForm) -> String {
    let mut parts = vec![extraction.acknowledgement()];
    match next_question(form) {
        Some(question) => parts.push(question.to_string()),
        None => {
            let conflicts = conflicts(form);
            if conflicts.is_empty() {
                parts.push(
                    "Your form is complete! Say \"generate itinerary\" when you're ready."
                        .to_string(),
                );
            } else {
                parts.push(format!(
                    "Every field is filled, but please fix: {}.",
                    conflicts.join("; ")
                ));
            }
        }
    }
    parts.push(progress_line(form));
    parts.join(" ")
}

fn conflicts(form: &TravelForm) -> Vec<String> {
    form.cross_field_errors()
        .into_iter()
        .map(|e| format!("{}: {}", e.field.label(), e.message))
        .collect()
}

/// Reply when generation was requested but the form cannot be locked.
pub fn not_ready_reply(form: &TravelForm) -> String {
    let missing: Vec<&str> = form
        .missing_fields()
        .into_iter()
        .map(FormField::label)
        .collect();
    let conflicts = conflicts(form);

    let mut text = String::from("I can't generate your itinerary yet.");
    if !missing.is_empty() {
        text.push_str(&format!(" Still needed: {}.", missing.join(", ")));
    }
    if !conflicts.is_empty() {
        text.push_str(&format!(" Please fix: {}.", conflicts.join("; ")));
    }
    text
}

/// Summary of a freshly generated or modified itinerary.
pub fn itinerary_reply(itinerary: &Itinerary) -> String {
    let mut text = if itinerary.version == 1 {
        format!(
            "Here's your {}-day itinerary! {}",
            itinerary.days.len(),
            itinerary.summary
        )
    } else {
        let changes = itinerary
            .change_summary
            .clone()
            .unwrap_or_else(|| itinerary.changes_made.join("; "));
        format!(
            "Updated your itinerary (version {}). {}",
            itinerary.version,
            if changes.is_empty() { itinerary.summary.clone() } else { changes }
        )
    };

    for day in &itinerary.days {
        text.push_str(&format!(
            "\nDay {} ({}): {} - {} activities",
            day.day_number,
            day.date.format("%a %d %b"),
            day.theme.as_deref().unwrap_or("Exploring"),
            day.activities.len()
        ));
    }
    text.push_str("\nAsk me to change anything, or ask a question about the plan.");
    text
}
