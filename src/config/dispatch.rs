use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DispatchError;

const DEFAULT_CONFIG_FILE: &str = "tool-dispatch.toml";
const CONFIG_ENV: &str = "TOOL_DISPATCH_CONFIG";
const DYNAMIC_PLUGINS_ENV: &str = "TOOL_DISPATCH_DYNAMIC_PLUGINS";
const PLUGINS_DIR_ENV: &str = "TOOL_DISPATCH_PLUGINS_DIR";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 300;

/// Configuration for the tool registry and dispatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Built-in tools to enable, by catalog name (e.g. "greeting", "clock")
    pub plugins: Vec<String>,

    /// Whether external tools are discovered at all
    pub dynamic_plugins: bool,

    /// JSON array of external tool identifiers
    pub dynamic_plugins_file: PathBuf,

    /// Directory holding the external tool executables
    pub dynamic_plugins_dir: PathBuf,

    /// Timeout applied to every external process invocation
    pub external_timeout_secs: u64,

    /// Root directory enumerated by the workspace tool
    pub workspace_root: Option<PathBuf>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            plugins: Vec::new(),
            dynamic_plugins: false,
            dynamic_plugins_file: PathBuf::from("./bot/dynamic_plugins.json"),
            dynamic_plugins_dir: PathBuf::from("./bot/dynplugins"),
            external_timeout_secs: DEFAULT_TIMEOUT_SECS,
            workspace_root: None,
        }
    }
}

impl DispatchConfig {
    /// Load configuration.
    ///
    /// Precedence for the file: `explicit` > `$TOOL_DISPATCH_CONFIG` >
    /// `./tool-dispatch.toml`. A missing default file yields defaults; an
    /// explicitly named file must exist. Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self, DispatchError> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match named {
            Some(path) => Self::from_file(&path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    debug!("no config file found, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, DispatchError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DispatchError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&raw)
            .map_err(|e| DispatchError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Apply overrides from a key lookup (the process environment in practice).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(DYNAMIC_PLUGINS_ENV) {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.dynamic_plugins = true,
                "0" | "false" | "no" => self.dynamic_plugins = false,
                other => debug!(value = other, "ignoring unrecognised {}", DYNAMIC_PLUGINS_ENV),
            }
        }
        if let Some(dir) = lookup(PLUGINS_DIR_ENV) {
            self.dynamic_plugins_dir = PathBuf::from(dir);
        }
    }

    /// External process timeout, clamped to a sane maximum
    pub fn external_timeout(&self) -> Duration {
        Duration::from_secs(self.external_timeout_secs.clamp(1, MAX_TIMEOUT_SECS))
    }
}
