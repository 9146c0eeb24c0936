use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Function {tool_name} not found")]
    Resolution { tool_name: String },

    #[error("external tool error: {identifier}: {message}")]
    AdapterProtocol { identifier: String, message: String },

    #[error(transparent)]
    ToolExecution(#[from] ToolExecutionError),

    #[error("invalid arguments for {tool_name}: {message}")]
    InvalidArguments { tool_name: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl DispatchError {
    pub fn not_found(tool_name: impl Into<String>) -> Self {
        Self::Resolution {
            tool_name: tool_name.into(),
        }
    }

    pub fn protocol(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AdapterProtocol {
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    /// Render this error as the `{"error": "..."}` result envelope.
    pub fn to_envelope(&self) -> String {
        json!({ "error": self.to_string() }).to_string()
    }
}

/// Failure raised by an in-process tool while executing.
#[derive(Debug, thiserror::Error)]
#[error("tool error: {tool_name}: {source:#}")]
pub struct ToolExecutionError {
    pub tool_name: String,
    #[source]
    pub source: anyhow::Error,
}

impl ToolExecutionError {
    pub fn new(tool_name: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self {
            tool_name: tool_name.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_envelope_matches_wire_format() {
        let err = DispatchError::not_found("plurk");
        assert_eq!(err.to_envelope(), r#"{"error":"Function plurk not found"}"#);
    }

    #[test]
    fn execution_error_keeps_cause_chain() {
        let cause = anyhow::anyhow!("connection refused").context("upstream request failed");
        let err = DispatchError::from(ToolExecutionError::new("get_repos", cause));
        let message = err.to_string();
        assert!(message.starts_with("tool error: get_repos"));
        assert!(message.contains("connection refused"));
    }
}
