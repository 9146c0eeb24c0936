use async_trait::async_trait;
use serde_json::{Value, json};

use super::{required_str, unknown_function};
use crate::error::ToolExecutionError;
use crate::tools::{Arguments, InProcessTool, ToolDescriptor};

/// Greets people by name
pub struct GreetingTool;

#[async_trait]
impl InProcessTool for GreetingTool {
    fn source_name(&self) -> &str {
        "Greeter"
    }

    fn describe(&self) -> Vec<ToolDescriptor> {
        vec![ToolDescriptor::new(
            "say_hello",
            "Say hello to someone by name",
            json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "The name of the person to greet"
                    }
                },
                "required": ["name"]
            }),
        )]
    }

    async fn execute(
        &self,
        tool_name: &str,
        args: Arguments,
    ) -> Result<Value, ToolExecutionError> {
        match tool_name {
            "say_hello" => {
                let name = required_str(tool_name, &args, "name")?;
                Ok(Value::String(format!("Hello, {}!", name)))
            }
            _ => Err(unknown_function(tool_name)),
        }
    }
}
