//! Lightweight argument checks against a tool's declared input schema.
//!
//! Covers the subset MCP servers declare in practice: an object with
//! `properties`, `required` and primitive `type`s. Anything more elaborate is
//! left to the server.

use crate::error::{Result, TaskloopError};
use serde_json::Value;

/// Validate tool arguments against a JSON schema object.
pub fn validate_arguments(tool: &str, schema: &Value, arguments: &Value) -> Result<()> {
    let args = arguments.as_object().ok_or_else(|| {
        TaskloopError::Invocation(format!("Arguments for '{}' must be a JSON object", tool))
    })?;

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for key in required.iter().filter_map(Value::as_str) {
            if !args.contains_key(key) {
                return Err(TaskloopError::Invocation(format!(
                    "Missing '{}' argument for '{}'",
                    key, tool
                )));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (key, value) in args {
        let Some(expected) = properties
            .get(key)
            .and_then(|p| p.get("type"))
            .and_then(Value::as_str)
        else {
            continue;
        };

        if value.is_null() && !is_required(schema, key) {
            continue;
        }

        if !matches_type(expected, value) {
            return Err(TaskloopError::Invocation(format!(
                "Argument '{}' for '{}' should be of type {}",
                key, tool, expected
            )));
        }
    }

    Ok(())
}

fn is_required(schema: &Value, key: &str) -> bool {
    schema
        .get("required")
        .and_then(Value::as_array)
        .is_some_and(|r| r.iter().any(|v| v.as_str() == Some(key)))
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}
