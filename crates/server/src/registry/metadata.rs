//! Component metadata shared by tools, resources, prompts, and workflows.

use serde::Serialize;
use serde_json::{Map, Value};

/// The four kinds of named, invokable units the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Performs an action.
    Tool,
    /// Returns addressable content.
    Resource,
    /// Renders a parameterised template.
    Prompt,
    /// A declarative, multi-phase plan composed of tool invocations.
    Workflow,
}

impl ComponentKind {
    /// Stable lowercase name for logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Tool => "tool",
            ComponentKind::Resource => "resource",
            ComponentKind::Prompt => "prompt",
            ComponentKind::Workflow => "workflow",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which layer of the namespace a component came from.
///
/// Core entries register before contrib; on a name conflict contrib loses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Shipped with the server.
    Core,
    /// Community-supplied.
    Contrib,
}

impl Origin {
    /// Stable lowercase name for logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Core => "core",
            Origin::Contrib => "contrib",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON type accepted for a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    /// JSON Schema type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        }
    }
}

/// One declared tool parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    /// Parameter name as it appears in the arguments object.
    pub name: &'static str,
    /// Accepted JSON type.
    pub ty: ParamType,
    /// Whether the argument must be present.
    pub required: bool,
    /// Default applied when the argument is absent.
    pub default: Option<Value>,
    /// Human description for listings.
    pub description: &'static str,
}

impl ParamSpec {
    /// A required parameter with no default.
    pub fn required(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            required: true,
            default: None,
            description,
        }
    }

    /// An optional parameter, optionally carrying a default.
    pub fn optional(
        name: &'static str,
        ty: ParamType,
        default: Option<Value>,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            ty,
            required: false,
            default,
            description,
        }
    }
}

/// One declared prompt argument.
#[derive(Debug, Clone, Serialize)]
pub struct PromptArgSpec {
    /// Argument name.
    pub name: &'static str,
    /// Human description for listings.
    pub description: &'static str,
    /// Whether the argument must be supplied.
    pub required: bool,
}

/// Metadata common to every registered component.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentMetadata {
    /// Logical name, unique per kind, lower-snake.
    pub name: String,
    /// Human description, surfaced through MCP listings.
    pub description: String,
    /// Category label (declared set or short free-form).
    pub category: String,
    /// Free-form tags for list filtering.
    pub tags: Vec<String>,
    /// Whether invocations need a usable Splunk config.
    pub requires_splunk: bool,
    /// Which namespace layer supplied the component.
    pub origin: Origin,
    /// Where the definition came from, for diagnostics.
    pub source_location: String,
    /// Tool parameter schema; empty for other kinds.
    pub params: Vec<ParamSpec>,
    /// Resource URI or URI template; None for other kinds.
    pub uri: Option<String>,
    /// Prompt argument descriptors; empty for other kinds.
    pub prompt_args: Vec<PromptArgSpec>,
}

impl ComponentMetadata {
    /// Metadata with the fields every kind shares; per-kind extras default
    /// to empty.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        requires_splunk: bool,
        origin: Origin,
        source_location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category: category.into(),
            tags: Vec::new(),
            requires_splunk,
            origin,
            source_location: source_location.into(),
            params: Vec::new(),
            uri: None,
            prompt_args: Vec::new(),
        }
    }

    /// Attach tags.
    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Attach a tool parameter schema.
    pub fn with_params(mut self, params: Vec<ParamSpec>) -> Self {
        self.params = params;
        self
    }

    /// Attach a resource URI or URI template.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Attach prompt argument descriptors.
    pub fn with_prompt_args(mut self, args: Vec<PromptArgSpec>) -> Self {
        self.prompt_args = args;
        self
    }

    /// Render the tool parameter schema as a JSON Schema object for MCP
    /// listings.
    pub fn params_json_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            let mut prop = Map::new();
            prop.insert("type".to_string(), Value::String(param.ty.as_str().into()));
            prop.insert(
                "description".to_string(),
                Value::String(param.description.into()),
            );
            if let Some(default) = &param.default {
                prop.insert("default".to_string(), default.clone());
            }
            properties.insert(param.name.to_string(), Value::Object(prop));
            if param.required {
                required.push(Value::String(param.name.to_string()));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::String("object".into()));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        schema
    }
}
