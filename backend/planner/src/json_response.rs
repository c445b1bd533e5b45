//! Recover a JSON object from free-form model output.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json|JSON)?\s*([\s\S]*?)```").unwrap());

/// Parse the first JSON object found in `text`.
///
/// Tries, in order: the whole text, a fenced code block, and the span between
/// the first `{` and the last `}`. Non-object JSON is rejected.
pub fn parse_json_object(text: &str) -> Option<Value> {
    let text = text.trim();

    let as_object = |candidate: &str| {
        serde_json::from_str::<Value>(candidate.trim())
            .ok()
            .filter(Value::is_object)
    };

    if let Some(value) = as_object(text) {
        return Some(value);
    }

    if let Some(value) = FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| as_object(m.as_str()))
    {
        return Some(value);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        return as_object(&text[start..=end]);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_object() {
        let v = parse_json_object(r#" {"a": 1} "#).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn parses_fenced_block() {
        let text = "Here you go:\n```json\n{\"days\": []}\n```\nEnjoy!";
        let v = parse_json_object(text).unwrap();
        assert!(v["days"].as_array().unwrap().is_empty());
    }

    #[test]
    fn parses_embedded_braces() {
        let text = "Sure! {\"destinations\": [\"Goa\"]} Let me know.";
        let v = parse_json_object(text).unwrap();
        assert_eq!(v["destinations"][0], "Goa");
    }

    #[test]
    fn rejects_garbage_and_arrays() {
        assert!(parse_json_object("I could not do that").is_none());
        assert!(parse_json_object("[1, 2, 3]").is_none());
        assert!(parse_json_object("{ not json }").is_none());
    }
}
