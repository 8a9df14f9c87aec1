//! PII masking for log output
//!
//! Produces a redacted copy of a webhook payload so it can be logged. The
//! masked copy is never what the handlers return to the caller.
//!
//! Matching is by field name only. Values stored under generic keys are not
//! recognised: the TradingView login arrives as `custom_fields[].value` and is
//! logged in clear in the request, while the same value is masked as
//! `trading_view_login` in the response.

use serde_json::{Map, Value};

/// Replacement applied to a sensitive field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mask {
    /// Replace the whole value with this string
    Literal(&'static str),
    /// Redact individual sub-fields when the value is an object, otherwise
    /// replace the whole value with `literal`
    Compound {
        literal: &'static str,
        fields: &'static [(&'static str, Mask)],
    },
}

impl Mask {
    /// String used when the value is replaced wholesale
    pub fn literal(&self) -> &'static str {
        match self {
            Mask::Literal(s) => *s,
            Mask::Compound { literal, .. } => *literal,
        }
    }
}

const ADDRESS_FIELDS: &[(&str, Mask)] = &[
    ("line1", Mask::Literal("***")),
    ("line2", Mask::Literal("***")),
    ("street", Mask::Literal("***")),
    ("city", Mask::Literal("***")),
    ("state", Mask::Literal("***")),
    ("postal_code", Mask::Literal("*****")),
    ("zip", Mask::Literal("*****")),
];

/// Field names treated as PII anywhere in a payload
pub const PII_FIELDS: &[(&str, Mask)] = &[
    ("email", Mask::Literal("***@***.***")),
    ("phone_number", Mask::Literal("***-***-****")),
    ("phone", Mask::Literal("***-***-****")),
    ("first_name", Mask::Literal("***")),
    ("last_name", Mask::Literal("***")),
    ("full_name", Mask::Literal("***")),
    ("trading_view_login", Mask::Literal("***")),
    ("ip_address", Mask::Literal("***.***.***.***")),
    ("date_of_birth", Mask::Literal("****-**-**")),
    ("password", Mask::Literal("********")),
    (
        "address",
        Mask::Compound {
            literal: "***",
            fields: ADDRESS_FIELDS,
        },
    ),
];

fn lookup<'a>(table: &'a [(&'static str, Mask)], key: &str) -> Option<&'a Mask> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, mask)| mask)
}

/// Mask `value` with the default PII table
pub fn mask(value: &Value) -> Value {
    mask_with(value, PII_FIELDS)
}

/// Mask `value` with a caller-provided table.
///
/// Objects and arrays are walked at any depth; scalars are returned as-is.
pub fn mask_with(value: &Value, table: &'static [(&'static str, Mask)]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| (key.clone(), mask_entry(key, inner, table, table)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|i| mask_with(i, table)).collect()),
        other => other.clone(),
    }
}

/// `lookup_table` decides whether `key` is sensitive, `table` is used for
/// everything below it
fn mask_entry(
    key: &str,
    value: &Value,
    lookup_table: &'static [(&'static str, Mask)],
    table: &'static [(&'static str, Mask)],
) -> Value {
    match (lookup(lookup_table, key), value) {
        (Some(Mask::Compound { fields, .. }), Value::Object(map)) => {
            mask_compound(map, fields, table)
        }
        (Some(mask), _) => Value::String(mask.literal().to_string()),
        (None, _) => mask_with(value, table),
    }
}

/// Sub-fields listed in `fields` get their own replacement; the rest are
/// still masked with the outer table so nested PII is caught.
fn mask_compound(
    map: &Map<String, Value>,
    fields: &'static [(&'static str, Mask)],
    table: &'static [(&'static str, Mask)],
) -> Value {
    Value::Object(
        map.iter()
            .map(|(key, inner)| {
                let masked = if lookup(fields, key).is_some() {
                    mask_entry(key, inner, fields, table)
                } else {
                    mask_entry(key, inner, table, table)
                };
                (key.clone(), masked)
            })
            .collect(),
    )
}

/// Parse `body` as JSON and return its masked serialization.
///
/// Returns `None` for empty or non-JSON bodies.
pub fn mask_body(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let value: Value = serde_json::from_slice(body).ok()?;
    serde_json::to_string(&mask(&value)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_masks_top_level_and_nested_fields() {
        let payload = json!({"email": "a@b.com", "nested": {"phone_number": "555"}});
        assert_eq!(
            mask(&payload),
            json!({"email": "***@***.***", "nested": {"phone_number": "***-***-****"}})
        );
    }

    #[test]
    fn test_input_is_not_mutated() {
        let payload = json!({"member": {"email": "a@b.com"}});
        let before = payload.clone();
        let _ = mask(&payload);
        assert_eq!(payload, before);
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(mask(&json!(42)), json!(42));
        assert_eq!(mask(&json!("a@b.com")), json!("a@b.com"));
        assert_eq!(mask(&Value::Null), Value::Null);
    }

    #[test]
    fn test_arrays_keep_order_and_length() {
        let payload = json!([
            {"email": "one@x.io"},
            "plain",
            {"id": 3, "phone": "123"}
        ]);
        assert_eq!(
            mask(&payload),
            json!([
                {"email": "***@***.***"},
                "plain",
                {"id": 3, "phone": "***-***-****"}
            ])
        );
    }

    #[test]
    fn test_object_address_masks_only_known_sub_fields() {
        let payload = json!({
            "address": {"line1": "1 Main St", "city": "Springfield", "zip": "12345", "country": "US"}
        });
        assert_eq!(
            mask(&payload),
            json!({
                "address": {"line1": "***", "city": "***", "zip": "*****", "country": "US"}
            })
        );
    }

    #[test]
    fn test_non_object_address_is_replaced_with_literal() {
        let payload = json!({"address": "1 Main St, Springfield"});
        assert_eq!(mask(&payload), json!({"address": "***"}));

        let payload = json!({"address": ["1 Main St"]});
        assert_eq!(mask(&payload), json!({"address": "***"}));
    }

    #[test]
    fn test_pii_inside_address_object_is_still_masked() {
        let payload = json!({"address": {"city": "Paris", "contact": {"email": "c@d.fr"}}});
        assert_eq!(
            mask(&payload),
            json!({"address": {"city": "***", "contact": {"email": "***@***.***"}}})
        );
    }

    #[test]
    fn test_sensitive_object_value_replaced_wholesale() {
        let payload = json!({"email": {"primary": "a@b.com"}});
        assert_eq!(mask(&payload), json!({"email": "***@***.***"}));
    }

    // Custom field values sit under the generic `value` key and are not
    // name-matched; see the module docs.
    #[test]
    fn test_custom_field_values_are_not_name_matched() {
        let payload = json!({
            "event": "member.created",
            "member": {"id": 42, "username": "bob", "email": "bob@example.com"},
            "custom_fields": [{"field": {"id": 3358}, "value": "tvuser"}]
        });
        let masked = mask(&payload);
        assert_eq!(masked["event"], "member.created");
        assert_eq!(masked["member"]["id"], 42);
        assert_eq!(masked["member"]["email"], "***@***.***");
        assert_eq!(masked["custom_fields"][0]["value"], "tvuser");
    }

    #[test]
    fn test_masked_output_never_contains_original_values() {
        let secrets = ["alice@example.com", "+1-202-555-0188", "Alice", "Liddell", "10.0.0.7"];
        let payload = json!({
            "member": {
                "email": secrets[0],
                "phone_number": secrets[1],
                "first_name": secrets[2],
                "last_name": secrets[3],
                "history": [{"ip_address": secrets[4]}, {"email": secrets[0]}]
            },
            "email": secrets[0]
        });
        let rendered = mask(&payload).to_string();
        for secret in secrets {
            assert!(!rendered.contains(secret), "{secret} leaked into {rendered}");
        }
    }

    #[test]
    fn test_mask_with_custom_table() {
        const TABLE: &[(&str, Mask)] = &[("token", Mask::Literal("[REDACTED]"))];
        let payload = json!({"token": "abc", "email": "a@b.com"});
        assert_eq!(
            mask_with(&payload, TABLE),
            json!({"token": "[REDACTED]", "email": "a@b.com"})
        );
    }

    #[test]
    fn test_mask_body() {
        assert_eq!(
            mask_body(br#"{"email":"a@b.com"}"#).as_deref(),
            Some(r#"{"email":"***@***.***"}"#)
        );
        assert_eq!(mask_body(b""), None);
        assert_eq!(mask_body(b"not json"), None);
    }
}
