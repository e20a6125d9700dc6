//! Placeholder references of the form `<action>::<data path>::<index>`.
//!
//! The planner can't know ids that don't exist yet, so it writes e.g.
//! `createCategory::data.categoryId::0` and the value is substituted right
//! before the referencing action runs.

use crate::types::ActionResult;
use serde_json::{Map, Value};

const SEPARATOR: &str = "::";

/// A parsed placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderReference<'a> {
    /// Informational only, the index is what is followed.
    pub name: &'a str,
    pub data_path: &'a str,
    pub index: usize,
}

impl<'a> PlaceholderReference<'a> {
    /// `Ok(None)` for anything that isn't shaped like a placeholder, such
    /// strings are plain literals. A `name::path::index` string whose index
    /// isn't a result position is an error.
    pub fn parse(value: &'a str) -> Result<Option<Self>, String> {
        let parts: Vec<&str> = value.split(SEPARATOR).collect();
        let &[name, data_path, index] = parts.as_slice() else {
            return Ok(None);
        };

        let is_word = |part: &str| !part.is_empty() && !part.contains(char::is_whitespace);
        if !is_word(name) || !is_word(data_path) {
            return Ok(None);
        }

        let index = index
            .bytes()
            .all(|byte| byte.is_ascii_digit())
            .then(|| index.parse().ok())
            .flatten()
            .ok_or_else(|| format!("`{index}` is not a valid result index"))?;

        Ok(Some(Self {
            name,
            data_path,
            index,
        }))
    }

    fn resolve(&self, results: &[ActionResult]) -> Result<Value, String> {
        let result = results.get(self.index).ok_or_else(|| {
            format!(
                "index {} is out of range, only {} results are available",
                self.index,
                results.len()
            )
        })?;

        let root = serde_json::to_value(result).map_err(|e| e.to_string())?;

        self.data_path
            .split('.')
            .try_fold(&root, |value, segment| step(value, segment))
            .cloned()
            .ok_or_else(|| {
                format!(
                    "`{}` does not exist on the result of `{}`",
                    self.data_path, result.function_name
                )
            })
    }
}

fn step<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
        _ => None,
    }
    .filter(|value| !value.is_null())
}

/// A placeholder that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderError {
    pub reference: String,
    pub reason: String,
}

/// Replaces every placeholder in `arguments`, at any depth, with the value it
/// points at in `results`.
pub fn resolve_arguments(
    arguments: &Map<String, Value>,
    results: &[ActionResult],
) -> Result<Map<String, Value>, PlaceholderError> {
    arguments
        .iter()
        .map(|(key, value)| Ok((key.clone(), resolve_value(value, results)?)))
        .collect()
}

fn resolve_value(value: &Value, results: &[ActionResult]) -> Result<Value, PlaceholderError> {
    match value {
        Value::String(text) => {
            let to_error = |reason| PlaceholderError {
                reference: text.clone(),
                reason,
            };

            match PlaceholderReference::parse(text).map_err(to_error)? {
                Some(reference) => reference.resolve(results).map_err(to_error),
                None => Ok(value.clone()),
            }
        }
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_value(item, results))
            .collect::<Result<_, _>>()
            .map(Value::Array),
        Value::Object(map) => resolve_arguments(map, results).map(Value::Object),
        _ => Ok(value.clone()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn result(name: &str, data: Value, index: usize) -> ActionResult {
        ActionResult {
            function_name: name.to_owned(),
            success: true,
            data,
            call_index: index,
        }
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn parses_only_well_formed_references() {
        assert_eq!(
            PlaceholderReference::parse("create::data.id::0"),
            Ok(Some(PlaceholderReference {
                name: "create",
                data_path: "data.id",
                index: 0
            }))
        );

        assert_eq!(PlaceholderReference::parse("just text"), Ok(None));
        assert_eq!(PlaceholderReference::parse("a::b"), Ok(None));
        assert_eq!(PlaceholderReference::parse("a::b::1::2"), Ok(None));
        assert_eq!(PlaceholderReference::parse("::data.id::0"), Ok(None));
        assert_eq!(PlaceholderReference::parse("see the docs::intro::later"), Ok(None));
    }

    #[test]
    fn malformed_indices_are_errors() {
        assert!(PlaceholderReference::parse("a::b::c").is_err());
        assert!(PlaceholderReference::parse("a::b::-1").is_err());
        assert!(PlaceholderReference::parse("a::b::").is_err());
        assert!(PlaceholderReference::parse("a::b::99999999999999999999999").is_err());
    }

    #[test]
    fn malformed_references_fail_resolution() {
        let results = [result("create", json!({ "id": "A" }), 0)];

        let error = resolve_arguments(
            &args(json!({ "parentId": "create::data.id::first" })),
            &results,
        )
        .unwrap_err();
        assert_eq!(error.reference, "create::data.id::first");

        let error = resolve_arguments(
            &args(json!({ "nested": [{ "id": "create::data.id::-1" }] })),
            &results,
        )
        .unwrap_err();
        assert_eq!(error.reference, "create::data.id::-1");
    }

    #[test]
    fn resolves_into_earlier_results() {
        let results = [result("create", json!({ "id": "A" }), 0)];

        let resolved =
            resolve_arguments(&args(json!({ "parentId": "create::data.id::0" })), &results)
                .unwrap();

        assert_eq!(resolved, args(json!({ "parentId": "A" })));
    }

    #[test]
    fn resolves_nested_values_and_keeps_literals() {
        let results = [
            result("createCategory", json!({ "categoryId": "999" }), 0),
            result("createRole", json!({ "roles": [{ "id": 7 }] }), 1),
        ];

        let resolved = resolve_arguments(
            &args(json!({
                "name": "help",
                "limit": 3,
                "overwrites": [{ "roleId": "createRole::data.roles.0.id::1" }],
                "parent": { "id": "createCategory::data.categoryId::0" },
                "note": "see docs::intro",
            })),
            &results,
        )
        .unwrap();

        assert_eq!(
            resolved,
            args(json!({
                "name": "help",
                "limit": 3,
                "overwrites": [{ "roleId": 7 }],
                "parent": { "id": "999" },
                "note": "see docs::intro",
            }))
        );
    }

    #[test]
    fn out_of_range_index_fails() {
        let results = [result("create", json!({ "id": "A" }), 0)];

        let error =
            resolve_arguments(&args(json!({ "id": "create::data.id::1" })), &results).unwrap_err();

        assert_eq!(error.reference, "create::data.id::1");
        assert!(error.reason.contains("out of range"));
    }

    #[test]
    fn missing_path_fails() {
        let results = [result("create", json!({ "id": "A", "gone": null }), 0)];

        assert!(resolve_arguments(&args(json!({ "id": "create::data.name::0" })), &results).is_err());
        assert!(resolve_arguments(&args(json!({ "id": "create::data.gone::0" })), &results).is_err());
        assert!(resolve_arguments(&args(json!({ "id": "create::data.id.deeper::0" })), &results).is_err());
    }
}
