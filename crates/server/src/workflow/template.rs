//! The workflow argument template language.
//!
//! `${ctx.X}` and `${tasks.T.path}` are the only allowed forms; anything
//! else inside `${...}` is a syntax error at plan time. There is no
//! expression evaluation; references select values, nothing more.

use serde_json::Value;

use crate::error::ServerError;

/// A parsed template reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    /// `${ctx.FIELD}`: a field of the resolved workflow context.
    Context { field: String },
    /// `${tasks.T.PATH}`: a dotted path into task T's result data.
    TaskOutput { task_id: String, path: Vec<String> },
}

impl TemplateRef {
    /// Parse the inside of a `${...}` reference.
    ///
    /// # Errors
    ///
    /// [`ServerError::WorkflowInvalid`] for anything that is not a
    /// `ctx.FIELD` or `tasks.T.PATH` form.
    pub fn parse(inner: &str) -> Result<Self, ServerError> {
        let mut parts = inner.split('.');
        match parts.next() {
            Some("ctx") => {
                let field: Vec<&str> = parts.collect();
                if field.len() != 1 || field[0].is_empty() {
                    return Err(ServerError::WorkflowInvalid(format!(
                        "bad context reference '${{{inner}}}': expected ${{ctx.FIELD}}"
                    )));
                }
                Ok(TemplateRef::Context {
                    field: field[0].to_string(),
                })
            }
            Some("tasks") => {
                let task_id = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| {
                    ServerError::WorkflowInvalid(format!(
                        "bad task reference '${{{inner}}}': expected ${{tasks.TASK.PATH}}"
                    ))
                })?;
                let path: Vec<String> = parts.map(|s| s.to_string()).collect();
                if path.is_empty() || path.iter().any(|s| s.is_empty()) {
                    return Err(ServerError::WorkflowInvalid(format!(
                        "bad task reference '${{{inner}}}': expected ${{tasks.TASK.PATH}}"
                    )));
                }
                Ok(TemplateRef::TaskOutput {
                    task_id: task_id.to_string(),
                    path,
                })
            }
            _ => Err(ServerError::WorkflowInvalid(format!(
                "unknown template form '${{{inner}}}': only ctx.* and tasks.* are allowed"
            ))),
        }
    }
}

/// Find every `${...}` reference in a template string.
///
/// # Errors
///
/// [`ServerError::WorkflowInvalid`] on unterminated `${` or a malformed
/// reference body.
pub fn scan_refs(template: &str) -> Result<Vec<TemplateRef>, ServerError> {
    let mut refs = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            ServerError::WorkflowInvalid(format!("unterminated template reference in '{template}'"))
        })?;
        refs.push(TemplateRef::parse(&after[..end])?);
        rest = &after[end + 1..];
    }
    Ok(refs)
}

/// Collect every reference used anywhere in a task's argument object.
pub fn scan_value(value: &Value) -> Result<Vec<TemplateRef>, ServerError> {
    let mut refs = Vec::new();
    collect(value, &mut refs)?;
    Ok(refs)
}

fn collect(value: &Value, refs: &mut Vec<TemplateRef>) -> Result<(), ServerError> {
    match value {
        Value::String(s) => refs.extend(scan_refs(s)?),
        Value::Array(items) => {
            for item in items {
                collect(item, refs)?;
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect(item, refs)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Resolve a single reference against the run state.
///
/// `lookup_task` returns the `data` payload of a completed task.
///
/// # Errors
///
/// [`ServerError::ReferenceError`] when the context field, task, or dotted
/// path does not exist.
pub fn resolve_ref(
    reference: &TemplateRef,
    context: &serde_json::Map<String, Value>,
    lookup_task: &dyn Fn(&str) -> Option<Value>,
) -> Result<Value, ServerError> {
    match reference {
        TemplateRef::Context { field } => context.get(field).cloned().ok_or_else(|| {
            ServerError::ReferenceError(format!("context has no field '{field}'"))
        }),
        TemplateRef::TaskOutput { task_id, path } => {
            let data = lookup_task(task_id).ok_or_else(|| {
                ServerError::ReferenceError(format!("task '{task_id}' has no result"))
            })?;
            let mut current = data;
            for segment in path {
                current = match &current {
                    Value::Object(map) => map.get(segment).cloned(),
                    Value::Array(items) => segment
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| items.get(i).cloned()),
                    _ => None,
                }
                .ok_or_else(|| {
                    ServerError::ReferenceError(format!(
                        "task '{task_id}' result has no path '{}'",
                        path.join(".")
                    ))
                })?;
            }
            Ok(current)
        }
    }
}

/// Render a template value: strings that are exactly one reference are
/// replaced by the referenced value (preserving its type); strings with
/// embedded references get string substitution; arrays and objects render
/// recursively; everything else passes through.
pub fn render_value(
    value: &Value,
    context: &serde_json::Map<String, Value>,
    lookup_task: &dyn Fn(&str) -> Option<Value>,
) -> Result<Value, ServerError> {
    match value {
        Value::String(s) => render_string(s, context, lookup_task),
        Value::Array(items) => {
            let rendered: Result<Vec<Value>, ServerError> = items
                .iter()
                .map(|item| render_value(item, context, lookup_task))
                .collect();
            Ok(Value::Array(rendered?))
        }
        Value::Object(map) => {
            let mut rendered = serde_json::Map::new();
            for (key, item) in map {
                rendered.insert(key.clone(), render_value(item, context, lookup_task)?);
            }
            Ok(Value::Object(rendered))
        }
        other => Ok(other.clone()),
    }
}

fn render_string(
    template: &str,
    context: &serde_json::Map<String, Value>,
    lookup_task: &dyn Fn(&str) -> Option<Value>,
) -> Result<Value, ServerError> {
    // Whole-string reference keeps the referenced value's type.
    if template.starts_with("${")
        && template.ends_with('}')
        && template.matches("${").count() == 1
    {
        let inner = &template[2..template.len() - 1];
        let reference = TemplateRef::parse(inner)?;
        return resolve_ref(&reference, context, lookup_task);
    }

    let mut out = String::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            ServerError::WorkflowInvalid(format!("unterminated template reference in '{template}'"))
        })?;
        let reference = TemplateRef::parse(&after[..end])?;
        let value = resolve_ref(&reference, context, lookup_task)?;
        match value {
            Value::String(s) => out.push_str(&s),
            other => out.push_str(&other.to_string()),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(Value::String(out))
}
