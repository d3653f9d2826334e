//! Component discovery and registration.
//!
//! Tools, resources, and prompts register from static catalogue modules
//! (core first, then contrib). Workflows are discovered from JSON files
//! under ordered roots tagged with their origin. Candidates that fail to
//! load or validate emit a structured [`LoadFailure`] without aborting
//! discovery; on name conflicts contrib loses with a warning. The registry
//! is frozen once discovery completes.
//!
//! Roots and directory entries are sorted lexically so registries are
//! stable across platforms.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::registry::{
    ComponentEntry, ComponentKind, ComponentMetadata, ComponentRegistry, Origin, RegistryError,
};
use crate::surface::uri::UriTemplate;
use crate::workflow::{planner, WorkflowDefinition};

/// Categories with declared meaning; anything else is accepted when short.
const DECLARED_CATEGORIES: [&str; 7] = [
    "search",
    "metadata",
    "health",
    "system",
    "workflow",
    "troubleshooting",
    "llm",
];

/// A definition that could not be loaded or validated.
#[derive(Debug, Clone)]
pub struct LoadFailure {
    /// File path or catalogue source location.
    pub path: String,
    /// The component kind being loaded.
    pub kind: ComponentKind,
    /// Why it was rejected.
    pub reason: String,
}

/// Registered-entry counts for one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    pub core: usize,
    pub contrib: usize,
}

impl KindCounts {
    fn add(&mut self, origin: Origin) {
        match origin {
            Origin::Core => self.core += 1,
            Origin::Contrib => self.contrib += 1,
        }
    }

    /// Total across origins.
    pub fn total(&self) -> usize {
        self.core + self.contrib
    }
}

/// Summary of one discovery pass.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    pub tools: KindCounts,
    pub resources: KindCounts,
    pub prompts: KindCounts,
    pub workflows: KindCounts,
    /// Definitions that failed to load or validate.
    pub failures: Vec<LoadFailure>,
    /// Conflicts and idempotent re-registrations.
    pub warnings: Vec<String>,
}

impl DiscoveryReport {
    fn counts_mut(&mut self, kind: ComponentKind) -> &mut KindCounts {
        match kind {
            ComponentKind::Tool => &mut self.tools,
            ComponentKind::Resource => &mut self.resources,
            ComponentKind::Prompt => &mut self.prompts,
            ComponentKind::Workflow => &mut self.workflows,
        }
    }

    /// Total registered entries across kinds and origins.
    pub fn total_registered(&self) -> usize {
        self.tools.total() + self.resources.total() + self.prompts.total() + self.workflows.total()
    }
}

/// A workflow root with its namespace layer.
#[derive(Debug, Clone)]
pub struct WorkflowRoot {
    pub origin: Origin,
    pub path: PathBuf,
}

/// Run discovery: register catalogues, then workflows, then freeze.
///
/// Catalogues must be ordered core before contrib by the caller; the roots
/// are sorted here. Components with `requires_splunk` register regardless
/// of Splunk reachability, which is checked per-invocation.
pub fn run(
    registry: &ComponentRegistry,
    catalogues: Vec<(Origin, Vec<ComponentEntry>)>,
    mut workflow_roots: Vec<WorkflowRoot>,
) -> DiscoveryReport {
    let mut report = DiscoveryReport::default();

    for (origin, entries) in catalogues {
        for entry in entries {
            register_entry(registry, entry, origin, &mut report);
        }
    }

    // Workflows load last so every referenced tool is already registered.
    workflow_roots.sort_by(|a, b| (a.origin, a.path.clone()).cmp(&(b.origin, b.path.clone())));
    for root in &workflow_roots {
        discover_workflows(registry, root, &mut report);
    }

    registry.freeze();

    info!(
        tools = report.tools.total(),
        resources = report.resources.total(),
        prompts = report.prompts.total(),
        workflows = report.workflows.total(),
        failures = report.failures.len(),
        warnings = report.warnings.len(),
        "component discovery complete"
    );
    report
}

fn register_entry(
    registry: &ComponentRegistry,
    entry: ComponentEntry,
    origin: Origin,
    report: &mut DiscoveryReport,
) {
    let kind = entry.kind();
    let path = entry.metadata.source_location.clone();
    let name = entry.metadata.name.clone();

    if let Err(reason) = validate_metadata(&entry.metadata, kind) {
        warn!(%kind, %name, %reason, "component failed validation");
        report.failures.push(LoadFailure { path, kind, reason });
        return;
    }

    match registry.register(entry) {
        Ok(crate::registry::RegisterOutcome::Registered) => {
            report.counts_mut(kind).add(origin);
        }
        Ok(crate::registry::RegisterOutcome::Idempotent) => {
            report
                .warnings
                .push(format!("{kind} '{name}' re-registered from {path}"));
        }
        Err(RegistryError::Duplicate {
            existing_source, ..
        }) => {
            // Core registers first, so on conflict contrib loses.
            report.warnings.push(format!(
                "{kind} '{name}' from {path} conflicts with {existing_source}; keeping the first"
            ));
        }
        Err(e @ RegistryError::Frozen { .. }) => {
            report.failures.push(LoadFailure {
                path,
                kind,
                reason: e.to_string(),
            });
        }
    }
}

/// Enumerate `*.json` direct descendants of a root, lexically sorted.
/// Files whose name begins with `_` and hidden entries are skipped.
fn discover_workflows(
    registry: &ComponentRegistry,
    root: &WorkflowRoot,
    report: &mut DiscoveryReport,
) {
    let entries = match std::fs::read_dir(&root.path) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %root.path.display(), error = %e, "workflow root unreadable");
            report.failures.push(LoadFailure {
                path: root.path.display().to_string(),
                kind: ComponentKind::Workflow,
                reason: format!("root unreadable: {e}"),
            });
            return;
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_candidate(path))
        .collect();
    files.sort();

    for file in files {
        load_workflow_file(registry, &file, root.origin, report);
    }
}

fn is_candidate(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('_') || name.starts_with('.') {
        return false;
    }
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

fn load_workflow_file(
    registry: &ComponentRegistry,
    path: &Path,
    origin: Origin,
    report: &mut DiscoveryReport,
) {
    let location = path.display().to_string();

    let fail = |report: &mut DiscoveryReport, reason: String| {
        warn!(path = %location, %reason, "workflow failed to load");
        report.failures.push(LoadFailure {
            path: location.clone(),
            kind: ComponentKind::Workflow,
            reason,
        });
    };

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => return fail(report, format!("unreadable: {e}")),
    };

    let definition: WorkflowDefinition = match serde_json::from_str(&raw) {
        Ok(definition) => definition,
        Err(e) => return fail(report, format!("invalid JSON: {e}")),
    };

    // The DAG must be acyclic and every referenced tool registered.
    if let Err(e) = planner::plan(&definition, Some(registry)) {
        return fail(report, e.to_string());
    }

    let category = definition
        .category
        .clone()
        .unwrap_or_else(|| "workflow".to_string());
    let metadata = ComponentMetadata::new(
        definition.id.clone(),
        definition.description.clone(),
        category,
        false,
        origin,
        location,
    );
    let entry = ComponentEntry::workflow(metadata, definition);
    register_entry(registry, entry, origin, report);
}

/// Validate common and per-kind metadata rules.
fn validate_metadata(metadata: &ComponentMetadata, kind: ComponentKind) -> Result<(), String> {
    if !is_lower_snake(&metadata.name) {
        return Err(format!(
            "name '{}' is not a lower-snake identifier",
            metadata.name
        ));
    }

    let category_ok = DECLARED_CATEGORIES.contains(&metadata.category.as_str())
        || metadata.category.len() <= splunk_config::constants::MAX_CATEGORY_LEN;
    if !category_ok {
        return Err(format!("category '{}' is too long", metadata.category));
    }

    match kind {
        ComponentKind::Tool => {
            let mut seen = std::collections::BTreeSet::new();
            for param in &metadata.params {
                if !is_lower_snake(param.name) {
                    return Err(format!("parameter '{}' is not lower-snake", param.name));
                }
                if !seen.insert(param.name) {
                    return Err(format!("duplicate parameter '{}'", param.name));
                }
            }
        }
        ComponentKind::Resource => {
            let uri = metadata
                .uri
                .as_deref()
                .ok_or_else(|| "resource has no URI".to_string())?;
            UriTemplate::parse(uri).map_err(|e| format!("bad URI pattern: {e}"))?;
        }
        ComponentKind::Prompt => {
            let mut seen = std::collections::BTreeSet::new();
            for arg in &metadata.prompt_args {
                if !seen.insert(arg.name) {
                    return Err(format!("duplicate prompt argument '{}'", arg.name));
                }
            }
        }
        ComponentKind::Workflow => {}
    }

    Ok(())
}

fn is_lower_snake(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    name.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
