//! Component entries: metadata plus per-invocation handler factories.
//!
//! Handlers are tagged variants keyed by kind, each carrying a constructor
//! that yields a fresh handler instance per invocation so handlers can hold
//! per-call state without contaminating other calls.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::context::InvocationContext;
use crate::error::Result;
use crate::registry::metadata::{ComponentKind, ComponentMetadata};
use crate::workflow::WorkflowDefinition;

/// Argument object handed to tool handlers after validation.
pub type ArgObject = Map<String, Value>;

/// A tool performs an action and returns a JSON payload.
#[async_trait]
pub trait ToolHandler: Send {
    /// Execute the tool with validated arguments.
    async fn execute(&mut self, ctx: &InvocationContext, args: ArgObject) -> Result<Value>;
}

/// A resource returns addressable content for a bound URI.
#[async_trait]
pub trait ResourceHandler: Send {
    /// Read the resource; `binding` carries template segment values.
    async fn read(&mut self, ctx: &InvocationContext, binding: HashMap<String, String>)
    -> Result<Value>;
}

/// A prompt renders a parameterised template to text.
#[async_trait]
pub trait PromptHandler: Send {
    /// Render the prompt with the supplied arguments.
    async fn render(&mut self, ctx: &InvocationContext, args: ArgObject) -> Result<String>;
}

/// Constructor for a fresh tool handler.
pub type ToolFactory = Arc<dyn Fn() -> Box<dyn ToolHandler> + Send + Sync>;
/// Constructor for a fresh resource handler.
pub type ResourceFactory = Arc<dyn Fn() -> Box<dyn ResourceHandler> + Send + Sync>;
/// Constructor for a fresh prompt handler.
pub type PromptFactory = Arc<dyn Fn() -> Box<dyn PromptHandler> + Send + Sync>;

/// Per-kind handler constructor.
#[derive(Clone)]
pub enum HandlerFactory {
    Tool(ToolFactory),
    Resource(ResourceFactory),
    Prompt(PromptFactory),
    /// Workflows carry their definition; execution goes through the engine.
    Workflow(Arc<WorkflowDefinition>),
}

impl HandlerFactory {
    /// The component kind this factory produces handlers for.
    pub fn kind(&self) -> ComponentKind {
        match self {
            HandlerFactory::Tool(_) => ComponentKind::Tool,
            HandlerFactory::Resource(_) => ComponentKind::Resource,
            HandlerFactory::Prompt(_) => ComponentKind::Prompt,
            HandlerFactory::Workflow(_) => ComponentKind::Workflow,
        }
    }
}

impl std::fmt::Debug for HandlerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            HandlerFactory::Tool(_) => "HandlerFactory::Tool",
            HandlerFactory::Resource(_) => "HandlerFactory::Resource",
            HandlerFactory::Prompt(_) => "HandlerFactory::Prompt",
            HandlerFactory::Workflow(_) => "HandlerFactory::Workflow",
        })
    }
}

/// A registered component: metadata plus handler constructor.
#[derive(Debug, Clone)]
pub struct ComponentEntry {
    /// Validated metadata.
    pub metadata: ComponentMetadata,
    /// Per-invocation handler constructor.
    pub factory: HandlerFactory,
}

impl ComponentEntry {
    /// Build a tool entry from metadata and a handler constructor.
    pub fn tool<H, F>(metadata: ComponentMetadata, make: F) -> Self
    where
        H: ToolHandler + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self {
            metadata,
            factory: HandlerFactory::Tool(Arc::new(move || Box::new(make()))),
        }
    }

    /// Build a resource entry from metadata and a handler constructor.
    pub fn resource<H, F>(metadata: ComponentMetadata, make: F) -> Self
    where
        H: ResourceHandler + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self {
            metadata,
            factory: HandlerFactory::Resource(Arc::new(move || Box::new(make()))),
        }
    }

    /// Build a prompt entry from metadata and a handler constructor.
    pub fn prompt<H, F>(metadata: ComponentMetadata, make: F) -> Self
    where
        H: PromptHandler + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self {
            metadata,
            factory: HandlerFactory::Prompt(Arc::new(move || Box::new(make()))),
        }
    }

    /// Build a workflow entry from metadata and its parsed definition.
    pub fn workflow(metadata: ComponentMetadata, definition: WorkflowDefinition) -> Self {
        Self {
            metadata,
            factory: HandlerFactory::Workflow(Arc::new(definition)),
        }
    }

    /// The component kind.
    pub fn kind(&self) -> ComponentKind {
        self.factory.kind()
    }
}
