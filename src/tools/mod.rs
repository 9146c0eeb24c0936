mod builtin;
mod catalog;
mod registry;
mod validate;

pub use builtin::{ClockTool, GreetingTool, WorkspaceTool};
pub use catalog::{ToolCatalog, ToolConstructor};
pub use registry::{RegistryEntry, ResolvedRegistry, ToolHandle, ToolKind, ToolRegistry};
pub use validate::validate_arguments;

use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ToolExecutionError;

/// Named arguments passed to a tool
pub type Arguments = Map<String, Value>;

/// Declarative description of one callable tool.
///
/// This is the shape the model consumes: `{"name", "description", "parameters"}`.
/// Two descriptors are equal when their names are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// JSON schema for the accepted arguments
    #[serde(rename = "parameters", default = "empty_schema")]
    pub parameter_schema: Value,
}

fn empty_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameter_schema: schema,
        }
    }

    /// Names listed under the schema's `required` key
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameter_schema["required"]
            .as_array()
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

impl PartialEq for ToolDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ToolDescriptor {}

impl Hash for ToolDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// A set of tools implemented inside this process.
///
/// One implementation may expose several tools; `execute` receives the name of
/// the tool being called. Implementations that cache state are responsible for
/// their own synchronisation.
#[async_trait]
pub trait InProcessTool: Send + Sync {
    /// Human-readable owner label, used for attribution
    fn source_name(&self) -> &str;

    /// Descriptors for every tool this implementation provides
    fn describe(&self) -> Vec<ToolDescriptor>;

    /// Execute one of the described tools
    async fn execute(
        &self,
        tool_name: &str,
        args: Arguments,
    ) -> Result<Value, ToolExecutionError>;
}
