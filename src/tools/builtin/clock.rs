use anyhow::Context;
use async_trait::async_trait;
use chrono::{FixedOffset, SecondsFormat, Utc};
use serde_json::{Value, json};

use super::unknown_function;
use crate::error::ToolExecutionError;
use crate::tools::{Arguments, InProcessTool, ToolDescriptor};

/// Reports the current time
pub struct ClockTool;

impl ClockTool {
    fn current_time(offset_hours: f64) -> anyhow::Result<Value> {
        let offset_secs = (offset_hours * 3600.0).round() as i32;
        let offset = FixedOffset::east_opt(offset_secs)
            .with_context(|| format!("invalid UTC offset: {} hours", offset_hours))?;
        let now = Utc::now().with_timezone(&offset);

        Ok(json!({
            "timestamp": now.to_rfc3339_opts(SecondsFormat::Secs, false),
            "utc_offset_hours": offset_hours,
            "unix": now.timestamp(),
        }))
    }
}

#[async_trait]
impl InProcessTool for ClockTool {
    fn source_name(&self) -> &str {
        "Clock"
    }

    fn describe(&self) -> Vec<ToolDescriptor> {
        vec![ToolDescriptor::new(
            "current_time",
            "Get the current date and time, optionally shifted to a UTC offset",
            json!({
                "type": "object",
                "properties": {
                    "utc_offset_hours": {
                        "type": "number",
                        "description": "Offset from UTC in hours, e.g. 2 or -5.5 (default: 0)"
                    }
                }
            }),
        )]
    }

    async fn execute(
        &self,
        tool_name: &str,
        args: Arguments,
    ) -> Result<Value, ToolExecutionError> {
        match tool_name {
            "current_time" => {
                let offset = args
                    .get("utc_offset_hours")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0);
                Self::current_time(offset).map_err(|e| ToolExecutionError::new(tool_name, e))
            }
            _ => Err(unknown_function(tool_name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn current_time_defaults_to_utc() {
        let result = ClockTool
            .execute("current_time", Arguments::new())
            .await
            .unwrap();
        let timestamp = result["timestamp"].as_str().unwrap();
        assert!(timestamp.ends_with("+00:00"), "got {}", timestamp);
        assert!(result["unix"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn current_time_applies_offset() {
        let args = json!({"utc_offset_hours": 5.5}).as_object().cloned().unwrap();
        let result = ClockTool.execute("current_time", args).await.unwrap();
        assert!(result["timestamp"].as_str().unwrap().ends_with("+05:30"));
    }

    #[tokio::test]
    async fn out_of_range_offset_is_error() {
        let args = json!({"utc_offset_hours": 48}).as_object().cloned().unwrap();
        let err = ClockTool.execute("current_time", args).await.unwrap_err();
        assert!(err.to_string().contains("invalid UTC offset"));
    }
}
