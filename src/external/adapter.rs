use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde_json::Value;
use tokio::process::Command;
use tokio::time::{Duration, sleep, timeout};
use tracing::debug;

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::tools::ToolDescriptor;

const SPAWN_ATTEMPTS: usize = 3;
const SPAWN_RETRY_DELAY: Duration = Duration::from_millis(50);
const MAX_STDERR_CHARS: usize = 500;

/// Treats executables in a directory as tool providers.
///
/// Every operation is a fresh process invocation. The adapter holds no state
/// besides where to look and how long to wait.
#[derive(Debug, Clone)]
pub struct ExternalToolAdapter {
    dir: PathBuf,
    timeout: Duration,
}

impl ExternalToolAdapter {
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            dir: dir.into(),
            timeout,
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(&config.dynamic_plugins_dir, config.external_timeout())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the executable for `identifier`, or `None` if the identifier
    /// is not a plain file name
    pub fn path_for(&self, identifier: &str) -> Option<PathBuf> {
        let plain = !identifier.is_empty()
            && identifier != "."
            && identifier != ".."
            && !identifier.contains(['/', '\\']);
        plain.then(|| self.dir.join(identifier))
    }

    /// Whether an executable exists for `identifier`
    pub fn exists(&self, identifier: &str) -> bool {
        self.path_for(identifier).is_some_and(|path| path.is_file())
    }

    /// Invoke with `--help` and parse the tool descriptors.
    ///
    /// Accepts a JSON array of descriptors or a single descriptor object.
    pub async fn fetch_descriptors(
        &self,
        identifier: &str,
    ) -> Result<Vec<ToolDescriptor>, DispatchError> {
        let output = self.run(identifier, &["--help"]).await?;
        let value: Value = serde_json::from_str(&output).map_err(|e| {
            DispatchError::protocol(identifier, format!("malformed descriptor JSON: {}", e))
        })?;

        let descriptors = match value {
            Value::Array(_) => serde_json::from_value(value),
            Value::Object(_) => serde_json::from_value(value).map(|d| vec![d]),
            other => {
                return Err(DispatchError::protocol(
                    identifier,
                    format!("expected descriptor array, got {}", kind_of(&other)),
                ));
            }
        };
        descriptors.map_err(|e| {
            DispatchError::protocol(identifier, format!("invalid tool descriptor: {}", e))
        })
    }

    /// Invoke with `--cli-help` and return the raw text
    pub async fn fetch_cli_help(&self, identifier: &str) -> Result<String, DispatchError> {
        self.run(identifier, &["--cli-help"]).await
    }

    /// Invoke with `--name` and return the trimmed display name
    pub async fn fetch_source_name(&self, identifier: &str) -> Result<String, DispatchError> {
        let output = self.run(identifier, &["--name"]).await?;
        Ok(output.trim().to_string())
    }

    /// Invoke with the serialized arguments as the single positional argument.
    ///
    /// The trimmed output is returned encoded as a JSON string value.
    pub async fn execute(
        &self,
        identifier: &str,
        serialized_args: &str,
    ) -> Result<String, DispatchError> {
        let output = self.run(identifier, &[serialized_args]).await?;
        Ok(encode_output(&output))
    }

    /// Invoke with `--cli <raw>` and return the trimmed output as a JSON string value
    pub async fn execute_cli(&self, identifier: &str, raw: &str) -> Result<String, DispatchError> {
        let output = self.run(identifier, &["--cli", raw]).await?;
        Ok(encode_output(&output))
    }

    /// Run the executable for `identifier` and return its stdout
    async fn run(&self, identifier: &str, args: &[&str]) -> Result<String, DispatchError> {
        let path = self
            .path_for(identifier)
            .filter(|path| path.is_file())
            .ok_or_else(|| {
                DispatchError::protocol(
                    identifier,
                    format!("executable not found in {}", self.dir.display()),
                )
            })?;

        debug!(identifier, ?args, "invoking external tool");

        let mut attempt = 0;
        let child = loop {
            let mut cmd = Command::new(&path);
            cmd.args(args);
            cmd.stdin(Stdio::null());
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
            cmd.kill_on_drop(true);

            attempt += 1;
            match cmd.spawn() {
                Ok(child) => break child,
                // A freshly written executable can still be open for writing
                Err(e) if e.kind() == ErrorKind::ExecutableFileBusy && attempt < SPAWN_ATTEMPTS => {
                    sleep(SPAWN_RETRY_DELAY).await;
                }
                Err(e) => {
                    return Err(DispatchError::protocol(
                        identifier,
                        format!("failed to spawn {}: {}", path.display(), e),
                    ));
                }
            }
        };

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| {
                DispatchError::protocol(identifier, format!("failed to wait for process: {}", e))
            })?,
            Err(_) => {
                return Err(DispatchError::protocol(
                    identifier,
                    format!("timed out after {} seconds", self.timeout.as_secs_f64()),
                ));
            }
        };

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr: String = stderr.trim().chars().take(MAX_STDERR_CHARS).collect();
            let message = if stderr.is_empty() {
                format!("exited with code {}", code)
            } else {
                format!("exited with code {}: {}", code, stderr)
            };
            return Err(DispatchError::protocol(identifier, message));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| DispatchError::protocol(identifier, "output is not valid UTF-8"))
    }
}

fn encode_output(output: &str) -> String {
    Value::String(output.trim().to_string()).to_string()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
