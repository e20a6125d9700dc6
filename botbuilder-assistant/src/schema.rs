//! The small slice of JSON Schema the assistant cares about.

use serde_json::{Map, Value};

/// Fields the Gemini function declaration schema rejects.
const UNSUPPORTED_SCHEMA_FIELDS: &[&str] = &["default", "additionalProperties", "$schema"];

/// Recursively strips the schema fields the planning backend would refuse.
///
/// Keys of a `properties` map are parameter names, not keywords, and are kept.
pub fn strip_unsupported_fields(value: &mut Value) {
    if let Some(object) = value.as_object_mut() {
        for field in UNSUPPORTED_SCHEMA_FIELDS {
            object.remove(*field);
        }
        for (key, nested) in object.iter_mut() {
            match (key.as_str(), nested) {
                ("properties", Value::Object(properties)) => {
                    properties.values_mut().for_each(strip_unsupported_fields)
                }
                (_, nested) => strip_unsupported_fields(nested),
            }
        }
    } else if let Some(items) = value.as_array_mut() {
        items.iter_mut().for_each(strip_unsupported_fields);
    }
}

/// Checks `arguments` against an object schema: every `required` key must be
/// present and every declared property must match its primitive `type`.
///
/// Unknown keys are left alone, the planner tends to add harmless extras.
pub fn validate_arguments(schema: &Value, arguments: &Map<String, Value>) -> Result<(), String> {
    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);

    for key in required {
        if arguments.get(key).is_none_or(Value::is_null) {
            return Err(format!("missing required argument `{key}`"));
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (key, value) in arguments {
        let Some(expected) = properties
            .get(key)
            .and_then(|property| property.get("type"))
            .and_then(Value::as_str)
        else {
            continue;
        };

        if !value.is_null() && !matches_type(expected, value) {
            return Err(format!("`{key}` should be of type {expected}"));
        }
    }

    Ok(())
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected.to_ascii_lowercase().as_str() {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|number| number.fract() == 0.0)
        }
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "amount": { "type": "integer" },
                "hoist": { "type": "boolean" },
            },
            "required": ["name"],
        })
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn accepts_matching_arguments() {
        assert!(validate_arguments(&schema(), &args(json!({ "name": "a", "amount": 5.0 }))).is_ok());
        assert!(validate_arguments(&schema(), &args(json!({ "name": "a", "extra": [] }))).is_ok());
    }

    #[test]
    fn rejects_missing_and_mistyped_arguments() {
        assert!(validate_arguments(&schema(), &args(json!({ "amount": 5 }))).is_err());
        assert!(validate_arguments(&schema(), &args(json!({ "name": null }))).is_err());
        assert!(validate_arguments(&schema(), &args(json!({ "name": "a", "amount": 1.5 }))).is_err());
        assert!(validate_arguments(&schema(), &args(json!({ "name": "a", "hoist": "yes" }))).is_err());
    }

    #[test]
    fn strips_nested_unsupported_fields() {
        let mut schema = json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "kind": { "type": "string", "default": "text" },
            },
        });

        strip_unsupported_fields(&mut schema);

        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": { "kind": { "type": "string" } },
            })
        );
    }

    #[test]
    fn parameters_named_like_keywords_survive() {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "default": { "type": "boolean", "default": false },
                "nested": {
                    "type": "object",
                    "properties": { "$schema": { "type": "string" } },
                },
            },
            "required": ["default"],
        });

        strip_unsupported_fields(&mut schema);

        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "default": { "type": "boolean" },
                    "nested": {
                        "type": "object",
                        "properties": { "$schema": { "type": "string" } },
                    },
                },
                "required": ["default"],
            })
        );
    }
}
