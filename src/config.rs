use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

const DEFAULT_COMMAND_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_CLIPBOARD_TIMEOUT_SECONDS: u64 = 5;

/// Default bridge config file name.
pub const CONFIG_FILE_NAME: &str = "bwbridge.toml";

/// Raw TOML shape for one `bwbridge.toml` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfigFile {
    /// Plugin installation directory holding the bundled vault binary.
    pub plugin_dir: Option<String>,
    /// Vault-client command timeout in seconds.
    pub command_timeout_seconds: Option<u64>,
    /// Clipboard tool timeout in seconds.
    pub clipboard_timeout_seconds: Option<u64>,
    /// Optional audit log path.
    pub audit_log: Option<String>,
}

/// Effective and validated bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Plugin installation directory.
    pub plugin_dir: PathBuf,
    /// Budget for one vault-client invocation.
    pub command_timeout: Duration,
    /// Budget for one clipboard tool invocation.
    pub clipboard_timeout: Duration,
    /// Audit log destination, when auditing is enabled.
    pub audit_log: Option<PathBuf>,
}

impl BridgeConfig {
    /// Creates a config with default timeouts for a plugin directory.
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECONDS),
            clipboard_timeout: Duration::from_secs(DEFAULT_CLIPBOARD_TIMEOUT_SECONDS),
            audit_log: None,
        }
    }

    /// Loads and validates a config file from disk.
    ///
    /// Relative paths in the file resolve against the file's directory.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BridgeError::InvalidInput(format!(
                "config file does not exist: {}",
                path.display()
            )));
        }
        let raw = fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        Self::parse_from_str(&raw, base_dir)
    }

    /// Parses and validates config from TOML text.
    pub fn parse_from_str(raw: &str, base_dir: impl AsRef<Path>) -> Result<Self> {
        let parsed = toml::from_str::<BridgeConfigFile>(raw)
            .map_err(|error| BridgeError::InvalidInput(format!("invalid config TOML: {error}")))?;
        build_config(parsed, base_dir.as_ref())
    }
}

fn build_config(raw: BridgeConfigFile, base_dir: &Path) -> Result<BridgeConfig> {
    let plugin_dir = raw
        .plugin_dir
        .as_deref()
        .ok_or_else(|| BridgeError::InvalidInput("plugin_dir is required".to_owned()))?;
    if plugin_dir.trim().is_empty() {
        return Err(BridgeError::InvalidInput(
            "plugin_dir cannot be empty".to_owned(),
        ));
    }

    let command_timeout_seconds = raw
        .command_timeout_seconds
        .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECONDS);
    if command_timeout_seconds == 0 {
        return Err(BridgeError::InvalidInput(
            "command_timeout_seconds must be greater than zero".to_owned(),
        ));
    }

    let clipboard_timeout_seconds = raw
        .clipboard_timeout_seconds
        .unwrap_or(DEFAULT_CLIPBOARD_TIMEOUT_SECONDS);
    if clipboard_timeout_seconds == 0 {
        return Err(BridgeError::InvalidInput(
            "clipboard_timeout_seconds must be greater than zero".to_owned(),
        ));
    }

    Ok(BridgeConfig {
        plugin_dir: resolve_path(plugin_dir, base_dir),
        command_timeout: Duration::from_secs(command_timeout_seconds),
        clipboard_timeout: Duration::from_secs(clipboard_timeout_seconds),
        audit_log: raw
            .audit_log
            .as_deref()
            .map(|value| resolve_path(value, base_dir)),
    })
}

fn resolve_path(value: &str, base_dir: &Path) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}
