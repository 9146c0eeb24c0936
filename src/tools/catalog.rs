use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use super::{ClockTool, GreetingTool, InProcessTool, WorkspaceTool};
use crate::config::DispatchConfig;

/// Builds an in-process tool from configuration
pub type ToolConstructor = fn(&DispatchConfig) -> Result<Arc<dyn InProcessTool>>;

/// Compile-time set of in-process tools, selectable by name from configuration
pub struct ToolCatalog {
    constructors: BTreeMap<String, ToolConstructor>,
}

impl ToolCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Catalog holding every built-in tool
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register("greeting", |_| Ok(Arc::new(GreetingTool)));
        catalog.register("clock", |_| Ok(Arc::new(ClockTool)));
        catalog.register("workspace", |config| {
            let root = match &config.workspace_root {
                Some(root) => root.clone(),
                None => std::env::current_dir()?,
            };
            Ok(Arc::new(WorkspaceTool::new(root)))
        });
        catalog
    }

    /// Register a constructor under a catalog name, replacing any previous one
    pub fn register(&mut self, name: impl Into<String>, constructor: ToolConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    /// Catalog names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(|s| s.as_str()).collect()
    }

    /// Instantiate the tools named in `config.plugins`, in that order.
    ///
    /// Unknown names and failing constructors are skipped with a warning.
    pub fn instantiate(&self, config: &DispatchConfig) -> Vec<Arc<dyn InProcessTool>> {
        let mut tools = Vec::with_capacity(config.plugins.len());
        for name in &config.plugins {
            let Some(constructor) = self.constructors.get(name) else {
                warn!(plugin = %name, "unknown plugin in configuration, skipping");
                continue;
            };
            match constructor(config) {
                Ok(tool) => {
                    debug!(plugin = %name, source = tool.source_name(), "enabled plugin");
                    tools.push(tool);
                }
                Err(e) => warn!(plugin = %name, error = %e, "failed to initialise plugin"),
            }
        }
        tools
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(plugins: &[&str]) -> DispatchConfig {
        DispatchConfig {
            plugins: plugins.iter().map(|s| s.to_string()).collect(),
            ..DispatchConfig::default()
        }
    }

    #[test]
    fn builtin_catalog_names() {
        assert_eq!(ToolCatalog::builtin().names(), vec!["clock", "greeting", "workspace"]);
    }

    #[test]
    fn instantiate_keeps_configured_order() {
        let tools = ToolCatalog::builtin().instantiate(&config_with(&["greeting", "clock"]));
        let sources: Vec<&str> = tools.iter().map(|t| t.source_name()).collect();
        assert_eq!(sources, vec!["Greeter", "Clock"]);
    }

    #[test]
    fn unknown_and_failing_plugins_are_skipped() {
        let mut catalog = ToolCatalog::builtin();
        catalog.register("broken", |_| Err(anyhow::anyhow!("GITHUB_TOKEN must be set")));

        let tools = catalog.instantiate(&config_with(&["broken", "spotify", "greeting"]));
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].source_name(), "Greeter");
    }
}
