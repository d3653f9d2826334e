//! Argument validation against component schemas.

use serde_json::{Map, Value};

use crate::error::ServerError;
use crate::registry::{ArgObject, ComponentMetadata, ParamType};

fn type_matches(ty: ParamType, value: &Value) -> bool {
    match ty {
        ParamType::String => value.is_string(),
        ParamType::Integer => value.is_i64() || value.is_u64(),
        ParamType::Number => value.is_number(),
        ParamType::Boolean => value.is_boolean(),
        ParamType::Object => value.is_object(),
        ParamType::Array => value.is_array(),
    }
}

/// Validate raw arguments against a tool's parameter schema.
///
/// Declared parameters are type-checked, required ones must be present, and
/// defaults are filled in. Undeclared keys pass through untouched; the
/// resolver reads its `splunk_*` override keys from the same object.
///
/// # Errors
///
/// [`ServerError::InvalidArgs`] carrying per-field reasons in `details`.
pub fn validate_tool_args(
    metadata: &ComponentMetadata,
    raw: Option<&ArgObject>,
) -> Result<ArgObject, ServerError> {
    let empty = Map::new();
    let raw = raw.unwrap_or(&empty);
    let mut validated = raw.clone();
    let mut reasons = Map::new();

    for param in &metadata.params {
        match raw.get(param.name) {
            Some(Value::Null) | None => {
                if let Some(default) = &param.default {
                    validated.insert(param.name.to_string(), default.clone());
                } else if param.required {
                    reasons.insert(
                        param.name.to_string(),
                        Value::String("required argument is missing".to_string()),
                    );
                }
            }
            Some(value) => {
                if !type_matches(param.ty, value) {
                    reasons.insert(
                        param.name.to_string(),
                        Value::String(format!("expected {}", param.ty.as_str())),
                    );
                }
            }
        }
    }

    if reasons.is_empty() {
        Ok(validated)
    } else {
        Err(ServerError::InvalidArgs {
            message: format!(
                "{} argument(s) rejected for '{}'",
                reasons.len(),
                metadata.name
            ),
            details: Some(Value::Object(reasons)),
        })
    }
}

/// Validate prompt arguments: required ones must be present and non-empty.
///
/// # Errors
///
/// [`ServerError::InvalidArgs`] carrying per-argument reasons.
pub fn validate_prompt_args(
    metadata: &ComponentMetadata,
    raw: Option<&ArgObject>,
) -> Result<ArgObject, ServerError> {
    let empty = Map::new();
    let raw = raw.unwrap_or(&empty);
    let mut reasons = Map::new();

    for arg in &metadata.prompt_args {
        let missing = match raw.get(arg.name) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        };
        if arg.required && missing {
            reasons.insert(
                arg.name.to_string(),
                Value::String("required argument is missing".to_string()),
            );
        }
    }

    if reasons.is_empty() {
        Ok(raw.clone())
    } else {
        Err(ServerError::InvalidArgs {
            message: format!(
                "{} argument(s) rejected for prompt '{}'",
                reasons.len(),
                metadata.name
            ),
            details: Some(Value::Object(reasons)),
        })
    }
}
