//! Field alias tables for structured code entries.
//!
//! Upstream entries name the same thing differently from one response to
//! the next. Each table lists the accepted keys in lookup order; the first
//! key holding a non-empty string wins.

use serde_json::Value;

/// Keys tried, in order, when resolving a description.
pub const DESCRIPTION_FIELDS: &[&str] = &[
    "description",
    "desc",
    "long_description",
    "full_description",
    "fullDescription",
    "label",
    "display",
    "title",
    "name",
];

/// Keys tried, in order, when resolving a status.
pub const STATUS_FIELDS: &[&str] = &["status", "state", "conditionStatus"];

pub const CODE_FIELDS: &[&str] = &["code"];
pub const CONFIDENCE_FIELDS: &[&str] = &["confidence"];
pub const EXPLANATION_FIELDS: &[&str] = &["explanation"];

/// First non-empty (after trimming) string value among `fields`.
pub fn first_text<'a>(item: &'a Value, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .filter_map(|field| item.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_description_priority() {
        let item = json!({"name": "by name", "title": "by title", "desc": "by desc"});
        assert_eq!(first_text(&item, DESCRIPTION_FIELDS), Some("by desc"));
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let item = json!({"description": "   ", "label": "", "display": "Display text"});
        assert_eq!(first_text(&item, DESCRIPTION_FIELDS), Some("Display text"));
    }

    #[test]
    fn test_non_string_values_are_skipped() {
        let item = json!({"status": 3, "state": null, "conditionStatus": "historical"});
        assert_eq!(first_text(&item, STATUS_FIELDS), Some("historical"));
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(first_text(&json!({}), DESCRIPTION_FIELDS), None);
        assert_eq!(first_text(&json!("E11.9"), DESCRIPTION_FIELDS), None);
    }
}
