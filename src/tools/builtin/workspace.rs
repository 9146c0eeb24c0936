use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use glob::glob;
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{required_str, unknown_function};
use crate::error::ToolExecutionError;
use crate::tools::{Arguments, InProcessTool, ToolDescriptor};

const MAX_RESULTS: usize = 100;

/// Lists files under a root directory.
///
/// The file list is enumerated on first use and cached for the lifetime of the
/// tool; files created afterwards are not seen.
pub struct WorkspaceTool {
    root: PathBuf,
    files: OnceCell<Vec<String>>,
}

impl WorkspaceTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: OnceCell::new(),
        }
    }

    async fn files(&self) -> Result<&[String]> {
        let files = self
            .files
            .get_or_try_init(|| async {
                info!(root = %self.root.display(), "caching workspace files");
                let root = self.root.clone();
                let files = tokio::task::spawn_blocking(move || enumerate(&root))
                    .await
                    .context("file enumeration task panicked")??;
                info!(count = files.len(), "done caching workspace files");
                Ok::<_, anyhow::Error>(files)
            })
            .await?;
        Ok(files)
    }

    async fn list_files(&self, query: Option<&str>) -> Result<Value> {
        let words: Vec<String> = query
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();

        let matches: Vec<&String> = self
            .files()
            .await?
            .iter()
            .filter(|path| {
                let lower = path.to_lowercase();
                words.iter().all(|word| lower.contains(word.as_str()))
            })
            .collect();

        let truncated = matches.len() > MAX_RESULTS;
        let files: Vec<&String> = matches.into_iter().take(MAX_RESULTS).collect();
        Ok(json!({ "files": files, "truncated": truncated }))
    }

    async fn count_files(&self, extension: &str) -> Result<Value> {
        let extension = extension.trim_start_matches('.').to_lowercase();
        let count = self
            .files()
            .await?
            .iter()
            .filter(|path| {
                Path::new(path.as_str())
                    .extension()
                    .is_some_and(|ext| ext.to_string_lossy().to_lowercase() == extension)
            })
            .count();
        Ok(json!({ "extension": extension, "count": count }))
    }
}

/// Walk `root` and return every non-hidden file, relative to `root`, sorted
fn enumerate(root: &Path) -> Result<Vec<String>> {
    let pattern = format!("{}/**/*", root.display().to_string().trim_end_matches('/'));
    let entries = glob(&pattern).with_context(|| format!("invalid glob pattern: {}", pattern))?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => {
                let Ok(relative) = path.strip_prefix(root) else {
                    continue;
                };
                let hidden = relative
                    .components()
                    .any(|c| c.as_os_str().to_string_lossy().starts_with('.'));
                if !hidden {
                    files.push(relative.display().to_string());
                }
            }
            Ok(_) => {}
            Err(e) => debug!("glob entry error: {}", e),
        }
    }
    files.sort();
    Ok(files)
}

#[async_trait]
impl InProcessTool for WorkspaceTool {
    fn source_name(&self) -> &str {
        "Workspace"
    }

    fn describe(&self) -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new(
                "list_files",
                "List files in the workspace, filtered by words in the path if a query is provided",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Part(s) of the file path to filter by, separated by spaces"
                        }
                    }
                }),
            ),
            ToolDescriptor::new(
                "count_files",
                "Count the workspace files with a given extension",
                json!({
                    "type": "object",
                    "properties": {
                        "extension": {
                            "type": "string",
                            "description": "File extension without the dot, e.g. 'rs'"
                        }
                    },
                    "required": ["extension"]
                }),
            ),
        ]
    }

    async fn execute(
        &self,
        tool_name: &str,
        args: Arguments,
    ) -> Result<Value, ToolExecutionError> {
        let result = match tool_name {
            "list_files" => {
                let query = args.get("query").and_then(Value::as_str);
                self.list_files(query).await
            }
            "count_files" => {
                let extension = required_str(tool_name, &args, "extension")?;
                self.count_files(extension).await
            }
            _ => return Err(unknown_function(tool_name)),
        };
        result.map_err(|e| ToolExecutionError::new(tool_name, e))
    }
}
