#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use tool_dispatch::DispatchConfig;

/// Answers every protocol flag; echoes its single positional argument.
pub const ECHO_TOOL: &str = r#"#!/bin/sh
case "$1" in
  --help) echo '[{"name":"echo","description":"Echo text back","parameters":{"type":"object","properties":{"text":{"type":"string"}},"required":["text"]}}]' ;;
  --cli-help) echo 'echo <text>' ;;
  --name) echo 'EchoSource' ;;
  --cli) echo "$2" ;;
  *) echo "$1" ;;
esac
"#;

/// Declares `say_hello`, colliding with the built-in greeting tool.
pub const HELLO_TOOL: &str = r#"#!/bin/sh
case "$1" in
  --help) echo '[{"name":"say_hello","description":"Say hello from a script","parameters":{"type":"object","properties":{"name":{"type":"string"}}}}]' ;;
  --cli-help) echo 'hello <name>' ;;
  --name) echo 'HelloScript' ;;
  --cli) echo "Hi $2 from the CLI" ;;
  *) echo "scripted hello" ;;
esac
"#;

/// Emits garbage instead of descriptors.
pub const GARBAGE_TOOL: &str = "#!/bin/sh\necho 'this is not json'\n";

/// Describes itself fine but fails whenever it is executed.
pub const FAILING_TOOL: &str = r#"#!/bin/sh
case "$1" in
  --help) echo '[{"name":"explode","description":"Always fails"}]' ;;
  --cli-help) echo 'explode' ;;
  --name) echo 'Exploder' ;;
  *) echo 'kaboom' >&2; exit 1 ;;
esac
"#;

/// Describes itself fine but cannot report a source name.
pub const NAMELESS_TOOL: &str = r#"#!/bin/sh
case "$1" in
  --help) echo '[{"name":"anonymous","description":"Has no owner"}]' ;;
  --name) echo 'no name here' >&2; exit 1 ;;
  *) echo 'ran anyway' ;;
esac
"#;

/// A temporary discovery directory plus identifier list.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("dynplugins")).expect("create plugins dir");
        Self { dir }
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.dir.path().join("dynplugins")
    }

    pub fn list_file(&self) -> PathBuf {
        self.dir.path().join("dynamic_plugins.json")
    }

    /// Write an executable script into the discovery directory
    pub fn install(&self, identifier: &str, script: &str) -> &Self {
        let path = self.plugins_dir().join(identifier);
        std::fs::write(&path, script).expect("write tool script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("make tool executable");
        self
    }

    pub fn uninstall(&self, identifier: &str) {
        std::fs::remove_file(self.plugins_dir().join(identifier)).expect("remove tool script");
    }

    /// Write the identifier list
    pub fn list(&self, identifiers: &[&str]) -> &Self {
        let json = serde_json::to_string(identifiers).expect("serialize identifiers");
        std::fs::write(self.list_file(), json).expect("write identifier list");
        self
    }

    pub fn config(&self, plugins: &[&str], dynamic: bool) -> DispatchConfig {
        DispatchConfig {
            plugins: plugins.iter().map(|s| s.to_string()).collect(),
            dynamic_plugins: dynamic,
            dynamic_plugins_file: self.list_file(),
            dynamic_plugins_dir: self.plugins_dir(),
            external_timeout_secs: 10,
            workspace_root: Some(self.dir.path().to_path_buf()),
        }
    }

    /// Write `config` as TOML and return its path
    pub fn write_config(&self, config: &DispatchConfig) -> PathBuf {
        let path = self.dir.path().join("tool-dispatch.toml");
        let raw = toml::to_string(config).expect("serialize config");
        std::fs::write(&path, raw).expect("write config");
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
