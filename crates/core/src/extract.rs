//! Field extraction from loosely structured webhook payloads
//!
//! Lookups never mutate the payload and never fail on optional data: a
//! missing optional field is `None`. Only fields the platform always sends
//! (`member.id`, `member.username`) are treated as required.

use serde_json::Value;

use crate::error::{RelayError, RelayResult};

/// Custom field holding the member's TradingView login
pub const DEFAULT_CUSTOM_FIELD_ID: i64 = 3358;

/// Value of the first `custom_fields` entry whose `field.id` is `target_id`.
///
/// Entries without `field.id`, or that are not objects, never match. Only the
/// first match is considered: if its `value` is missing or null the result is
/// `None` even when a later entry carries the same id.
pub fn extract_custom_field(payload: &Value, target_id: i64) -> Option<&Value> {
    let entries = payload.get("custom_fields").and_then(Value::as_array)?;
    entries
        .iter()
        .find(|entry| {
            entry
                .get("field")
                .and_then(|field| field.get("id"))
                .is_some_and(|id| id_matches(id, target_id))
        })
        .and_then(|entry| entry.get("value"))
        .filter(|value| !value.is_null())
}

fn id_matches(id: &Value, target_id: i64) -> bool {
    match id.as_i64() {
        Some(id) => id == target_id,
        // 3358.0 is the same id as 3358
        None => id.as_f64().is_some_and(|id| id == target_id as f64),
    }
}

/// Calendar-day prefix of an ISO-8601 timestamp.
///
/// Absent or empty input is `None`. Otherwise everything before the first
/// `T` is returned without checking that it is a real date.
pub fn truncate_to_date(timestamp: Option<&str>) -> Option<String> {
    let timestamp = timestamp.filter(|ts| !ts.is_empty())?;
    let date = timestamp.split_once('T').map_or(timestamp, |(date, _)| date);
    Some(date.to_string())
}

/// Look up a dotted path (`"member.id"`) that must be present and non-null
pub fn required_field<'a>(payload: &'a Value, path: &'static str) -> RelayResult<&'a Value> {
    path.split('.')
        .try_fold(payload, |value, segment| value.get(segment))
        .filter(|value| !value.is_null())
        .ok_or(RelayError::MissingField(path))
}

/// Optional lookup of `key` on an object, `None` for missing or null
pub fn optional_field<'a>(object: &'a Value, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|value| !value.is_null())
}

/// String form of an identifier that may arrive as a string or a number
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_matching_custom_field() {
        let payload = json!({
            "custom_fields": [
                {"field": {"id": 1}, "value": "x"},
                {"field": {"id": 3358}, "value": "tv_login"}
            ]
        });
        assert_eq!(
            extract_custom_field(&payload, 3358),
            Some(&json!("tv_login"))
        );
        assert_eq!(extract_custom_field(&payload, 1), Some(&json!("x")));
    }

    #[test]
    fn test_no_match_is_absent() {
        let payload = json!({"custom_fields": [{"field": {"id": 1}, "value": "x"}]});
        assert_eq!(extract_custom_field(&payload, 3358), None);
    }

    #[test]
    fn test_missing_or_non_array_custom_fields_is_absent() {
        assert_eq!(extract_custom_field(&json!({}), 3358), None);
        assert_eq!(extract_custom_field(&json!({"custom_fields": null}), 3358), None);
        assert_eq!(
            extract_custom_field(&json!({"custom_fields": {"field": {"id": 3358}}}), 3358),
            None
        );
    }

    #[test]
    fn test_first_match_wins() {
        let payload = json!({
            "custom_fields": [
                {"field": {"id": 3358}, "value": "first"},
                {"field": {"id": 3358}, "value": "second"}
            ]
        });
        assert_eq!(extract_custom_field(&payload, 3358), Some(&json!("first")));
    }

    #[test]
    fn test_first_match_with_null_value_is_absent() {
        let payload = json!({
            "custom_fields": [
                {"field": {"id": 3358}, "value": null},
                {"field": {"id": 3358}, "value": "later"}
            ]
        });
        assert_eq!(extract_custom_field(&payload, 3358), None);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let payload = json!({
            "custom_fields": [
                "garbage",
                {"value": "no field"},
                {"field": {}, "value": "no id"},
                {"field": {"id": "3358"}, "value": "string id"},
                {"field": {"id": 3358}, "value": "ok"}
            ]
        });
        assert_eq!(extract_custom_field(&payload, 3358), Some(&json!("ok")));
    }

    #[test]
    fn test_float_id_matches_integer_target() {
        let payload = json!({"custom_fields": [{"field": {"id": 3358.0}, "value": "v"}]});
        assert_eq!(extract_custom_field(&payload, 3358), Some(&json!("v")));
    }

    #[test]
    fn test_non_string_value_is_returned_as_is() {
        let payload = json!({"custom_fields": [{"field": {"id": 5}, "value": {"a": 1}}]});
        assert_eq!(extract_custom_field(&payload, 5), Some(&json!({"a": 1})));
    }

    #[test]
    fn test_truncate_to_date() {
        assert_eq!(
            truncate_to_date(Some("2024-01-05T10:00:00Z")).as_deref(),
            Some("2024-01-05")
        );
        assert_eq!(truncate_to_date(None), None);
        assert_eq!(truncate_to_date(Some("")), None);
    }

    #[test]
    fn test_truncate_to_date_does_not_validate() {
        assert_eq!(truncate_to_date(Some("2024-01-05")).as_deref(), Some("2024-01-05"));
        assert_eq!(truncate_to_date(Some("garbageTmore")).as_deref(), Some("garbage"));
        assert_eq!(truncate_to_date(Some("T10:00")).as_deref(), Some(""));
        assert_eq!(truncate_to_date(Some("aTbTc")).as_deref(), Some("a"));
    }

    #[test]
    fn test_required_field() {
        let payload = json!({"member": {"id": 42, "username": null}});
        assert_eq!(required_field(&payload, "member.id").unwrap(), &json!(42));
        assert!(matches!(
            required_field(&payload, "member.username"),
            Err(RelayError::MissingField("member.username"))
        ));
        assert!(matches!(
            required_field(&json!({}), "member.id"),
            Err(RelayError::MissingField("member.id"))
        ));
    }

    #[test]
    fn test_coerce_to_string() {
        assert_eq!(coerce_to_string(&json!(42)), "42");
        assert_eq!(coerce_to_string(&json!("42")), "42");
        assert_eq!(coerce_to_string(&json!(true)), "true");
    }
}
