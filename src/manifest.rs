//! Tool manifests — the app's self-declared capability list.
//!
//! Fetched once per connection via `__proprio_manifest__` and cached for the
//! connection's lifetime. The manifest is advisory: it drives discovery, UX
//! and local param validation, but never gates which methods may be invoked —
//! the remote is the source of truth.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// One invokable remote operation, as declared by the app.
///
/// `parameters` maps param name → advisory type tag (`"int"`, `"string"`, ...).
/// Apps that declare no schema send an empty map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

/// The ordered tool list from a `__proprio_manifest__` reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
}

impl Manifest {
    pub fn find(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }
}

// ─── Param validation ─────────────────────────────────────────────────────────

/// Check caller params against a tool's declared type tags.
///
/// Fails fast locally instead of forwarding malformed args to the remote.
/// Only declared params are checked; extra params pass through untouched
/// (the tags are advisory and many apps under-declare).
pub fn validate_params(tool: &ToolDescriptor, params: &Value) -> Result<(), Error> {
    if tool.parameters.is_empty() {
        return Ok(());
    }

    let map = match params {
        Value::Object(map) => map,
        Value::Null => {
            return Err(Error::Validation {
                tool: tool.name.clone(),
                reason: format!("missing params: {}", param_names(tool)),
            })
        }
        other => {
            return Err(Error::Validation {
                tool: tool.name.clone(),
                reason: format!("params must be an object, got {}", type_name(other)),
            })
        }
    };

    for (name, tag) in &tool.parameters {
        let value = map.get(name).ok_or_else(|| Error::Validation {
            tool: tool.name.clone(),
            reason: format!("missing param '{name}' ({tag})"),
        })?;
        if !matches_tag(value, tag) {
            return Err(Error::Validation {
                tool: tool.name.clone(),
                reason: format!(
                    "param '{name}' should be {tag}, got {}",
                    type_name(value)
                ),
            });
        }
    }
    Ok(())
}

/// Advisory type-tag vocabulary, as emitted by real apps. Unknown tags
/// accept anything rather than rejecting params the app would handle fine.
fn matches_tag(value: &Value, tag: &str) -> bool {
    match tag {
        "int" | "integer" => value.is_i64() || value.is_u64(),
        "float" | "number" => value.is_number(),
        "string" | "str" => value.is_string(),
        "bool" | "boolean" => value.is_boolean(),
        "object" | "dict" => value.is_object(),
        "array" | "list" => value.is_array(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn param_names(tool: &ToolDescriptor) -> String {
    tool.parameters
        .keys()
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rectangle_tool() -> ToolDescriptor {
        serde_json::from_value(json!({
            "name": "draw_rectangle",
            "description": "Draws a rectangle on the screen.",
            "parameters": {"width": "int", "height": "int"}
        }))
        .unwrap()
    }

    #[test]
    fn manifest_preserves_remote_order() {
        let m: Manifest = serde_json::from_value(json!({
            "tools": [
                {"name": "b", "description": "", "parameters": {}},
                {"name": "a", "description": "", "parameters": {}}
            ]
        }))
        .unwrap();
        let names: Vec<_> = m.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn well_typed_params_pass() {
        let tool = rectangle_tool();
        validate_params(&tool, &json!({"width": 50, "height": 80})).unwrap();
    }

    #[test]
    fn wrong_type_fails_locally() {
        let tool = rectangle_tool();
        let err = validate_params(&tool, &json!({"width": "wide", "height": 80})).unwrap_err();
        match err {
            Error::Validation { tool, reason } => {
                assert_eq!(tool, "draw_rectangle");
                assert!(reason.contains("width"), "reason: {reason}");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn missing_param_fails_locally() {
        let tool = rectangle_tool();
        assert!(matches!(
            validate_params(&tool, &json!({"width": 50})),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn extra_params_are_forwarded_not_rejected() {
        let tool = rectangle_tool();
        validate_params(&tool, &json!({"width": 1, "height": 2, "color": "red"})).unwrap();
    }

    #[test]
    fn undeclared_schema_accepts_anything() {
        let tool: ToolDescriptor =
            serde_json::from_value(json!({"name": "get_screen_size"})).unwrap();
        validate_params(&tool, &json!({})).unwrap();
        validate_params(&tool, &json!(null)).unwrap();
    }

    #[test]
    fn unknown_tag_accepts_anything() {
        let tool: ToolDescriptor = serde_json::from_value(json!({
            "name": "t",
            "parameters": {"x": "any"}
        }))
        .unwrap();
        validate_params(&tool, &json!({"x": [1, 2]})).unwrap();
    }
}
