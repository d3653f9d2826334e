//! The component registry.
//!
//! Per-kind mappings from logical name to [`ComponentEntry`]. Registration
//! happens during discovery (core before contrib); afterwards the registry
//! is frozen and all reads are lock-free. Late registration fails unless the
//! runtime is in hot-reload mode.

mod entry;
mod metadata;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use thiserror::Error;
use tracing::warn;

pub use entry::{
    ArgObject, ComponentEntry, HandlerFactory, PromptFactory, PromptHandler, ResourceFactory,
    ResourceHandler, ToolFactory, ToolHandler,
};
pub use metadata::{
    ComponentKind, ComponentMetadata, Origin, ParamSpec, ParamType, PromptArgSpec,
};

/// Errors raised by registry writes.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The name+kind pair is already registered from a different source.
    #[error("{kind} '{name}' already registered from {existing_source}")]
    Duplicate {
        kind: ComponentKind,
        name: String,
        existing_source: String,
    },

    /// The registry is frozen and the runtime is not in hot-reload mode.
    #[error("registry is frozen; cannot register {kind} '{name}'")]
    Frozen { kind: ComponentKind, name: String },
}

/// Outcome of a successful `register` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The entry was added.
    Registered,
    /// The same entry (same source location) was already present.
    Idempotent,
}

/// Filter for `list`.
#[derive(Debug, Clone, Default)]
pub struct ComponentFilter {
    /// Match this category exactly.
    pub category: Option<String>,
    /// Require this tag to be present.
    pub tag: Option<String>,
    /// Match this origin.
    pub origin: Option<Origin>,
}

impl ComponentFilter {
    fn matches(&self, metadata: &ComponentMetadata) -> bool {
        if let Some(category) = &self.category
            && metadata.category != *category
        {
            return false;
        }
        if let Some(tag) = &self.tag
            && !metadata.tags.iter().any(|t| t == tag)
        {
            return false;
        }
        if let Some(origin) = self.origin
            && metadata.origin != origin
        {
            return false;
        }
        true
    }
}

/// Holds metadata and factories for tools, resources, prompts, and
/// workflows. Owns its entries exclusively.
#[derive(Debug)]
pub struct ComponentRegistry {
    entries: DashMap<(ComponentKind, String), Arc<ComponentEntry>>,
    frozen: AtomicBool,
    hot_reload: bool,
}

impl ComponentRegistry {
    /// Create an empty, unfrozen registry.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            frozen: AtomicBool::new(false),
            hot_reload: false,
        }
    }

    /// Create a registry that accepts registration after freeze.
    pub fn with_hot_reload() -> Self {
        Self {
            entries: DashMap::new(),
            frozen: AtomicBool::new(false),
            hot_reload: true,
        }
    }

    /// Register an entry.
    ///
    /// Duplicate registration from the same source location is idempotent
    /// and logs a warning; from a different source it fails with
    /// [`RegistryError::Duplicate`].
    ///
    /// # Errors
    ///
    /// [`RegistryError::Frozen`] after discovery completes (unless
    /// hot-reload), [`RegistryError::Duplicate`] on cross-source conflicts.
    pub fn register(&self, entry: ComponentEntry) -> Result<RegisterOutcome, RegistryError> {
        let kind = entry.kind();
        let name = entry.metadata.name.clone();

        if self.is_frozen() && !self.hot_reload {
            return Err(RegistryError::Frozen { kind, name });
        }

        if let Some(existing) = self.entries.get(&(kind, name.clone())) {
            if existing.metadata.source_location == entry.metadata.source_location {
                warn!(%kind, %name, "duplicate registration from same source, ignoring");
                return Ok(RegisterOutcome::Idempotent);
            }
            return Err(RegistryError::Duplicate {
                kind,
                name,
                existing_source: existing.metadata.source_location.clone(),
            });
        }

        self.entries.insert((kind, name), Arc::new(entry));
        Ok(RegisterOutcome::Registered)
    }

    /// Look up an entry by kind and name.
    pub fn lookup(&self, kind: ComponentKind, name: &str) -> Option<Arc<ComponentEntry>> {
        self.entries
            .get(&(kind, name.to_string()))
            .map(|e| Arc::clone(&e))
    }

    /// List entries of a kind, optionally filtered, sorted by name.
    pub fn list(
        &self,
        kind: ComponentKind,
        filter: Option<&ComponentFilter>,
    ) -> Vec<Arc<ComponentEntry>> {
        let mut entries: Vec<Arc<ComponentEntry>> = self
            .entries
            .iter()
            .filter(|item| item.key().0 == kind)
            .filter(|item| filter.is_none_or(|f| f.matches(&item.value().metadata)))
            .map(|item| Arc::clone(item.value()))
            .collect();
        entries.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        entries
    }

    /// Number of registered entries of a kind.
    pub fn count(&self, kind: ComponentKind) -> usize {
        self.entries.iter().filter(|item| item.key().0 == kind).count()
    }

    /// Freeze the registry after initial discovery.
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
    }

    /// Whether the registry has been frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
