mod clock;
mod greeting;
mod workspace;

pub use clock::ClockTool;
pub use greeting::GreetingTool;
pub use workspace::WorkspaceTool;

use anyhow::Context;
use serde_json::Value;

use super::Arguments;
use crate::error::ToolExecutionError;

/// Fetch a required string argument
fn required_str<'a>(
    tool_name: &str,
    args: &'a Arguments,
    key: &str,
) -> Result<&'a str, ToolExecutionError> {
    args.get(key)
        .and_then(Value::as_str)
        .with_context(|| format!("missing '{}' parameter", key))
        .map_err(|e| ToolExecutionError::new(tool_name, e))
}

fn unknown_function(tool_name: &str) -> ToolExecutionError {
    ToolExecutionError::new(tool_name, anyhow::anyhow!("unknown function"))
}
