use serde_json::Value;

use super::ToolDescriptor;
use crate::error::DispatchError;

/// Check arguments against a descriptor's parameter schema.
///
/// Returns every violation joined into one `InvalidArguments` message. A
/// schema that does not compile is reported the same way.
pub fn validate_arguments(descriptor: &ToolDescriptor, args: &Value) -> Result<(), DispatchError> {
    let invalid = |message: String| DispatchError::InvalidArguments {
        tool_name: descriptor.name.clone(),
        message,
    };

    let validator = jsonschema::Validator::new(&descriptor.parameter_schema)
        .map_err(|e| invalid(format!("invalid tool schema: {}", e)))?;
    if validator.is_valid(args) {
        return Ok(());
    }

    let errors: Vec<String> = validator.iter_errors(args).map(|e| e.to_string()).collect();
    Err(invalid(errors.join("; ")))
}
