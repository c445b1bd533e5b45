use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use tripforge_core::{FieldError, FormField, FormUpdate, LlmPolicy, LlmProvider, TravelForm};

use crate::json_response::parse_json_object;
use crate::prompts::{extractor_user_prompt, EXTRACTOR_SYSTEM_PROMPT};

const EXTRACTION_TEMPERATURE: f32 = 0.1;

pub const EXTRACTION_APOLOGY: &str =
    "Sorry, I had trouble understanding that. Could you rephrase it, or fill in the form directly?";

/// Result of one extraction pass over a chat message.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub original_message: String,
    pub update: FormUpdate,
    pub soft_preferences: Vec<String>,
    /// Values the model produced that failed field validation.
    pub rejected: Vec<FieldError>,
    /// Set when the model call or its output could not be used.
    pub failure: Option<String>,
}

impl Extraction {
    fn failed(message: &str, reason: impl Into<String>) -> Self {
        Self {
            original_message: message.to_string(),
            failure: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }

    /// Short conversational acknowledgement of what was understood.
    pub fn acknowledgement(&self) -> String {
        if self.is_failure() {
            return EXTRACTION_APOLOGY.to_string();
        }

        let values = self.update.values().filled_fields();
        let noted: Vec<String> = self
            .update
            .fields()
            .into_iter()
            .take(3)
            .filter_map(|field| {
                let value = values.get(field.name())?;
                Some(format!("{}: {}", field.label(), display(value)))
            })
            .collect();

        let mut parts = Vec::new();
        if !noted.is_empty() {
            let extra = self.update.fields().len().saturating_sub(noted.len());
            let mut line = format!("Got it! {}", noted.join(", "));
            if extra > 0 {
                line.push_str(&format!(" (and {extra} more)"));
            }
            parts.push(line);
        }
        if !self.soft_preferences.is_empty() {
            parts.push(format!(
                "I'll keep in mind: {}.",
                self.soft_preferences.join(", ")
            ));
        }
        for error in &self.rejected {
            parts.push(format!(
                "I couldn't use that for {}: {}.",
                error.field.label(),
                error.message
            ));
        }
        if parts.is_empty() {
            parts.push("Thanks!".to_string());
        }
        parts.join(" ")
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        other => other.to_string(),
    }
}

/// Turns free-text chat into validated form updates.
pub struct InformationExtractor {
    provider: Arc<dyn LlmProvider>,
    policy: LlmPolicy,
}

impl InformationExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>, policy: LlmPolicy) -> Self {
        Self { provider, policy }
    }

    pub async fn extract(&self, message: &str, form: &TravelForm) -> Extraction {
        self.extract_on(message, form, Utc::now().date_naive()).await
    }

    /// Extract with an explicit "today", used to resolve relative dates.
    ///
    /// Never fails: provider and parse errors come back as a failed [`Extraction`].
    pub async fn extract_on(&self, message: &str, form: &TravelForm, today: NaiveDate) -> Extraction {
        let request = self
            .policy
            .request(
                EXTRACTOR_SYSTEM_PROMPT,
                extractor_user_prompt(message, form, today),
            )
            .with_temperature(EXTRACTION_TEMPERATURE)
            .json();

        let response = match self.provider.complete(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(provider = %self.provider.name(), error = %e, "Extraction call failed");
                return Extraction::failed(message, e.to_string());
            }
        };

        debug!(
            provider = %response.provider,
            latency_ms = response.latency_ms,
            "Extractor responded"
        );

        let Some(raw) = parse_json_object(&response.content) else {
            warn!(provider = %response.provider, "Extractor returned no JSON object");
            return Extraction::failed(message, "model output was not a JSON object");
        };

        let (update, rejected) = FormUpdate::from_json(&raw);
        let soft_preferences = soft_preferences(&raw);

        info!(
            fields = update.fields().len(),
            rejected = rejected.len(),
            preferences = soft_preferences.len(),
            "Extracted form update"
        );

        Extraction {
            original_message: message.to_string(),
            update,
            soft_preferences,
            rejected,
            failure: None,
        }
    }
}

fn soft_preferences(raw: &Value) -> Vec<String> {
    let key = "soft_preferences";
    let items = match raw.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    };
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && FormField::from_name(s).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;

    fn extractor(provider: Arc<MockProvider>) -> InformationExtractor {
        InformationExtractor::new(provider, LlmPolicy::default())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    #[tokio::test]
    async fn test_extracts_fields_and_preferences() {
        let provider = Arc::new(MockProvider::new("mock"));
        provider.push_text(
            r#"```json
{"destinations": ["Jaipur"], "trip_duration_days": "3", "budget": null,
 "soft_preferences": ["street food", "  "]}
```"#,
        );

        let result = extractor(provider.clone())
            .extract_on("3 days in Jaipur, love street food", &TravelForm::default(), today())
            .await;

        assert!(!result.is_failure());
        assert_eq!(
            result.update.fields(),
            vec![FormField::TripDurationDays, FormField::Destinations]
        );
        assert_eq!(result.soft_preferences, vec!["street food".to_string()]);

        let request = &provider.requests()[0];
        assert!(request.json_mode);
        assert_eq!(request.temperature, EXTRACTION_TEMPERATURE);
        assert!(request.user_prompt.contains("2025-05-01"));
    }

    #[tokio::test]
    async fn test_invalid_values_are_rejected_and_acknowledged() {
        let provider = Arc::new(MockProvider::new("mock"));
        provider.push_text(r#"{"traveler_count": 500, "group_type": "couple"}"#);

        let result = extractor(provider)
            .extract_on("500 of us, a couple", &TravelForm::default(), today())
            .await;

        assert_eq!(result.update.fields(), vec![FormField::GroupType]);
        assert_eq!(result.rejected.len(), 1);
        let reply = result.acknowledgement();
        assert!(reply.contains("Group Type: couple"));
        assert!(reply.contains("Number of Travelers"));
    }

    #[tokio::test]
    async fn test_provider_failure_is_soft() {
        let provider = Arc::new(MockProvider::new("mock"));
        provider.push_failure("connection refused");

        let result = extractor(provider)
            .extract_on("hello", &TravelForm::default(), today())
            .await;

        assert!(result.is_failure());
        assert!(result.update.is_empty());
        assert_eq!(result.original_message, "hello");
        assert_eq!(result.acknowledgement(), EXTRACTION_APOLOGY);
    }

    #[tokio::test]
    async fn test_unparseable_output_is_soft() {
        let provider = Arc::new(MockProvider::new("mock").with_response("I am not JSON"));
        let result = extractor(provider)
            .extract_on("hello", &TravelForm::default(), today())
            .await;
        assert!(result.is_failure());
    }

    #[test]
    fn test_acknowledgement_caps_listed_fields() {
        let (update, _) = FormUpdate::from_json(&serde_json::json!({
            "trip_duration_days": 3,
            "trip_duration_nights": 2,
            "traveler_count": 2,
            "budget": "luxury",
            "travel_mode": "walking"
        }));
        let extraction = Extraction {
            update,
            ..Default::default()
        };
        let reply = extraction.acknowledgement();
        assert!(reply.starts_with("Got it! Trip Duration (days): 3"));
        assert!(reply.contains("(and 2 more)"));
    }
}
