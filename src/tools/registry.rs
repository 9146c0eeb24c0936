use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use super::{InProcessTool, ToolCatalog, ToolDescriptor};
use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::external::{ExternalToolAdapter, load_dynamic_identifiers};

/// How a tool is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    InProcess,
    External,
}

/// What to call when a resolved tool is invoked
#[derive(Clone)]
pub enum ToolHandle {
    InProcess(Arc<dyn InProcessTool>),
    External { identifier: String },
}

impl fmt::Debug for ToolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProcess(tool) => f
                .debug_tuple("InProcess")
                .field(&tool.source_name())
                .finish(),
            Self::External { identifier } => f
                .debug_struct("External")
                .field("identifier", identifier)
                .finish(),
        }
    }
}

/// One resolved tool name
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub tool_name: String,
    pub source_name: String,
    pub handle: ToolHandle,
    pub descriptor: ToolDescriptor,
}

impl RegistryEntry {
    pub fn kind(&self) -> ToolKind {
        match self.handle {
            ToolHandle::InProcess(_) => ToolKind::InProcess,
            ToolHandle::External { .. } => ToolKind::External,
        }
    }
}

/// Everything one discovered external executable contributed to a build
#[derive(Debug, Clone)]
struct DiscoveredTool {
    identifier: String,
    source_name: String,
    descriptors: Vec<ToolDescriptor>,
}

/// The result of one registry build: name → entry, plus the advertised
/// descriptors in discovery order
#[derive(Debug, Clone, Default)]
pub struct ResolvedRegistry {
    entries: HashMap<String, RegistryEntry>,
    descriptors: Vec<ToolDescriptor>,
    identifiers: Vec<String>,
}

impl ResolvedRegistry {
    /// Look up a tool by name
    pub fn get(&self, tool_name: &str) -> Option<&RegistryEntry> {
        self.entries.get(tool_name)
    }

    /// In-process descriptors followed by external descriptors, in discovery
    /// order. Colliding names appear once per declaration.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    /// External tool identifiers listed in configuration, including ones
    /// that could not be inspected
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    fn insert(&mut self, entry: RegistryEntry) {
        self.descriptors.push(entry.descriptor.clone());
        if let Some(previous) = self.entries.insert(entry.tool_name.clone(), entry) {
            debug!(
                tool = %previous.tool_name,
                previous_source = %previous.source_name,
                "tool name overridden by later registration"
            );
        }
    }
}

/// External tool discovery settings
#[derive(Debug, Clone)]
struct Discovery {
    adapter: ExternalToolAdapter,
    list_file: PathBuf,
}

/// Registry of in-process tools and discovered external tools.
///
/// Nothing is cached between lookups: every call to [`build`](Self::build)
/// (and every lookup built on it) re-reads the identifier list and re-inspects
/// the external executables.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn InProcessTool>>,
    discovery: Option<Discovery>,
}

impl ToolRegistry {
    /// Create a new empty registry with discovery disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configuration, instantiating built-ins from `catalog`
    pub fn from_config(config: &DispatchConfig, catalog: &ToolCatalog) -> Self {
        let mut registry = Self::new();
        for tool in catalog.instantiate(config) {
            registry.register_arc(tool);
        }
        if config.dynamic_plugins {
            registry = registry.with_discovery(
                ExternalToolAdapter::from_config(config),
                config.dynamic_plugins_file.clone(),
            );
        }
        registry
    }

    /// Register an in-process tool
    pub fn register(&mut self, tool: impl InProcessTool + 'static) {
        self.tools.push(Arc::new(tool));
    }

    /// Register a shared in-process tool
    pub fn register_arc(&mut self, tool: Arc<dyn InProcessTool>) {
        self.tools.push(tool);
    }

    /// Enable external tool discovery
    pub fn with_discovery(
        mut self,
        adapter: ExternalToolAdapter,
        list_file: impl Into<PathBuf>,
    ) -> Self {
        self.discovery = Some(Discovery {
            adapter,
            list_file: list_file.into(),
        });
        self
    }

    /// The external tool adapter, if discovery is enabled
    pub fn adapter(&self) -> Option<&ExternalToolAdapter> {
        self.discovery.as_ref().map(|d| &d.adapter)
    }

    /// Registered in-process tools
    pub fn in_process_tools(&self) -> &[Arc<dyn InProcessTool>] {
        &self.tools
    }

    /// Read the configured external identifiers.
    ///
    /// Empty when discovery is disabled or the list cannot be read.
    pub async fn dynamic_identifiers(&self) -> Vec<String> {
        let Some(discovery) = &self.discovery else {
            return Vec::new();
        };
        match load_dynamic_identifiers(&discovery.list_file).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "dynamic tools unavailable");
                Vec::new()
            }
        }
    }

    /// Build the merged name → entry mapping.
    ///
    /// In-process tools are merged first, then external tools in list order;
    /// a later declaration of a name replaces an earlier one, so external
    /// tools win collisions. An external tool that is missing or fails to
    /// answer is skipped without affecting the rest.
    pub async fn build(&self) -> ResolvedRegistry {
        let mut resolved = ResolvedRegistry::default();

        for tool in &self.tools {
            for descriptor in tool.describe() {
                resolved.insert(RegistryEntry {
                    tool_name: descriptor.name.clone(),
                    source_name: tool.source_name().to_string(),
                    handle: ToolHandle::InProcess(Arc::clone(tool)),
                    descriptor,
                });
            }
        }

        let Some(discovery) = &self.discovery else {
            return resolved;
        };

        resolved.identifiers = self.dynamic_identifiers().await;
        let discovered = join_all(
            resolved
                .identifiers
                .iter()
                .map(|identifier| inspect(&discovery.adapter, identifier)),
        )
        .await;

        for found in discovered.into_iter().flatten() {
            for descriptor in found.descriptors {
                resolved.insert(RegistryEntry {
                    tool_name: descriptor.name.clone(),
                    source_name: found.source_name.clone(),
                    handle: ToolHandle::External {
                        identifier: found.identifier.clone(),
                    },
                    descriptor,
                });
            }
        }

        debug!(tools = resolved.len(), "registry built");
        resolved
    }

    /// Resolve a tool name
    pub async fn resolve(&self, tool_name: &str) -> Option<RegistryEntry> {
        self.build().await.get(tool_name).cloned()
    }

    /// Whether `tool_name` resolves to an external tool
    pub async fn is_external(&self, tool_name: &str) -> bool {
        self.resolve(tool_name)
            .await
            .is_some_and(|entry| entry.kind() == ToolKind::External)
    }

    /// CLI help of the external tool owning `tool_name`
    pub async fn cli_help_for(&self, tool_name: &str) -> Option<String> {
        let entry = self.resolve(tool_name).await?;
        let ToolHandle::External { identifier } = &entry.handle else {
            return None;
        };
        match self.adapter()?.fetch_cli_help(identifier).await {
            Ok(help) => Some(help),
            Err(e) => {
                warn!(tool = tool_name, error = %e, "failed to fetch CLI help");
                None
            }
        }
    }
}

/// Fetch descriptors and source name for one identifier.
///
/// Returns `None` when the executable is absent or misbehaves.
async fn inspect(adapter: &ExternalToolAdapter, identifier: &str) -> Option<DiscoveredTool> {
    if !adapter.exists(identifier) {
        debug!(identifier, "no executable for dynamic tool, skipping");
        return None;
    }

    let fetched = async {
        let descriptors = adapter.fetch_descriptors(identifier).await?;
        let source_name = adapter.fetch_source_name(identifier).await?;
        Ok::<_, DispatchError>(DiscoveredTool {
            identifier: identifier.to_string(),
            source_name,
            descriptors,
        })
    }
    .await;

    match fetched {
        Ok(tool) => Some(tool),
        Err(e) => {
            warn!(identifier, error = %e, "skipping dynamic tool");
            None
        }
    }
}
