use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::tools::{
    Arguments, RegistryEntry, ToolCatalog, ToolDescriptor, ToolHandle, ToolRegistry,
    validate_arguments,
};

/// Resolves tool names through the registry and executes them.
///
/// Every result is a JSON-encoded string. Failures never escape as errors;
/// they come back as `{"error": "<message>"}`.
pub struct Dispatcher {
    registry: ToolRegistry,
}

impl Dispatcher {
    /// Create a dispatcher over a registry
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Create a dispatcher with the built-in catalog and the given configuration
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(ToolRegistry::from_config(config, &ToolCatalog::builtin()))
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Every callable tool: in-process descriptors, then external ones in
    /// discovery order
    pub async fn list_descriptors(&self) -> Vec<ToolDescriptor> {
        self.registry.build().await.descriptors().to_vec()
    }

    /// Invoke a tool with JSON-serialized named arguments
    pub async fn invoke(&self, tool_name: &str, arguments: &str) -> String {
        let Some(entry) = self.registry.resolve(tool_name).await else {
            debug!(tool = tool_name, "tool not found");
            return DispatchError::not_found(tool_name).to_envelope();
        };
        self.invoke_entry(&entry, arguments).await
    }

    /// Validate arguments against the tool's parameter schema, then invoke it
    pub async fn invoke_validated(&self, tool_name: &str, arguments: &str) -> String {
        let Some(entry) = self.registry.resolve(tool_name).await else {
            return DispatchError::not_found(tool_name).to_envelope();
        };

        // `null` means no arguments, same as in `invoke`
        let checked = parse_json(tool_name, arguments)
            .map(|args| match args {
                Value::Null => Value::Object(Arguments::new()),
                other => other,
            })
            .and_then(|args| validate_arguments(&entry.descriptor, &args));
        if let Err(e) = checked {
            debug!(tool = tool_name, error = %e, "rejected arguments");
            return e.to_envelope();
        }

        self.invoke_entry(&entry, arguments).await
    }

    async fn invoke_entry(&self, entry: &RegistryEntry, arguments: &str) -> String {
        let tool_name = entry.tool_name.as_str();
        info!(tool = tool_name, source = %entry.source_name, kind = ?entry.kind(), "invoking tool");

        match &entry.handle {
            ToolHandle::InProcess(tool) => {
                let args = match parse_arguments(tool_name, arguments) {
                    Ok(args) => args,
                    Err(e) => return e.to_envelope(),
                };
                match tool.execute(tool_name, args).await {
                    Ok(value) => value.to_string(),
                    Err(e) => {
                        warn!(tool = tool_name, error = %e, "tool execution failed");
                        DispatchError::from(e).to_envelope()
                    }
                }
            }
            ToolHandle::External { identifier } => {
                let result = match self.registry.adapter() {
                    Some(adapter) => adapter.execute(identifier, arguments).await,
                    None => Err(DispatchError::protocol(identifier, "discovery disabled")),
                };
                result.unwrap_or_else(|e| {
                    warn!(tool = tool_name, error = %e, "external tool invocation failed");
                    DispatchError::not_found(tool_name).to_envelope()
                })
            }
        }
    }

    /// Invoke an external tool with a free-form argument string.
    ///
    /// In-process tools have no CLI form; asking for one returns an error
    /// envelope without running anything.
    pub async fn invoke_cli(&self, tool_name: &str, raw_arguments: &str) -> String {
        let Some(entry) = self.registry.resolve(tool_name).await else {
            return DispatchError::not_found(tool_name).to_envelope();
        };

        let ToolHandle::External { identifier } = &entry.handle else {
            return json!({
                "error": format!("Function {} is not an external tool and has no CLI form", tool_name)
            })
            .to_string();
        };

        info!(tool = tool_name, identifier = %identifier, "invoking external tool from CLI");
        let result = match self.registry.adapter() {
            Some(adapter) => adapter.execute_cli(identifier, raw_arguments).await,
            None => Err(DispatchError::protocol(identifier, "discovery disabled")),
        };
        result.unwrap_or_else(|e| {
            warn!(tool = tool_name, error = %e, "external CLI invocation failed");
            DispatchError::not_found(tool_name).to_envelope()
        })
    }

    /// Owning source name, or an empty string if the name does not resolve
    pub async fn source_name_for(&self, tool_name: &str) -> String {
        self.registry
            .resolve(tool_name)
            .await
            .map(|entry| entry.source_name)
            .unwrap_or_default()
    }

    pub async fn is_external(&self, tool_name: &str) -> bool {
        self.registry.is_external(tool_name).await
    }

    /// CLI help text for an external tool
    pub async fn cli_help_for(&self, tool_name: &str) -> Option<String> {
        self.registry.cli_help_for(tool_name).await
    }

    /// Configured external identifiers, in order
    pub async fn dynamic_identifiers(&self) -> Vec<String> {
        self.registry.dynamic_identifiers().await
    }

    /// Numbered CLI help of every listed external tool, one entry per line.
    ///
    /// Identifiers without an executable, or whose help cannot be fetched,
    /// are left out.
    pub async fn dynamic_tools_as_text(&self) -> String {
        let Some(adapter) = self.registry.adapter() else {
            return String::new();
        };

        let mut helps = Vec::new();
        for identifier in self.registry.dynamic_identifiers().await {
            if !adapter.exists(&identifier) {
                continue;
            }
            match adapter.fetch_cli_help(&identifier).await {
                Ok(help) => helps.push(help.trim().to_string()),
                Err(e) => warn!(identifier = %identifier, error = %e, "failed to fetch CLI help"),
            }
        }

        helps
            .iter()
            .enumerate()
            .map(|(i, help)| format!("{}. {}", i + 1, help))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn parse_json(tool_name: &str, arguments: &str) -> Result<Value, DispatchError> {
    if arguments.trim().is_empty() {
        return Ok(Value::Object(Arguments::new()));
    }
    serde_json::from_str(arguments).map_err(|e| DispatchError::InvalidArguments {
        tool_name: tool_name.to_string(),
        message: format!("arguments are not valid JSON: {}", e),
    })
}

/// Decode serialized arguments into named arguments; empty input and `null`
/// mean no arguments
fn parse_arguments(tool_name: &str, arguments: &str) -> Result<Arguments, DispatchError> {
    match parse_json(tool_name, arguments)? {
        Value::Object(args) => Ok(args),
        Value::Null => Ok(Arguments::new()),
        _ => Err(DispatchError::InvalidArguments {
            tool_name: tool_name.to_string(),
            message: "arguments must be a JSON object".to_string(),
        }),
    }
}
