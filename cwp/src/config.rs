//! User configuration for provider selection
//!
//! Lives at `<config dir>/config.json`:
//!
//! ```json
//! { "default": "walletconnect", "disabled": ["legacy"], "priority": ["ledger"] }
//! ```
//!
//! The file is optional. Absence or malformed content yields an empty
//! configuration and never fails a command.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Env var overriding the configuration directory.
pub const WALLET_CONFIG_DIR: &str = "WALLET_CONFIG_DIR";

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const SESSIONS_DIR_NAME: &str = "sessions";

/// `$WALLET_CONFIG_DIR`, else `<home>/.config/wallet`.
pub fn default_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(WALLET_CONFIG_DIR).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("wallet")
}

pub fn config_file(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

pub fn sessions_dir(config_dir: &Path) -> PathBuf {
    config_dir.join(SESSIONS_DIR_NAME)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Provider short name preferred by `Registry::get_default`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Provider short names never probed
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Provider short names listed first, in this order
    #[serde(default)]
    pub priority: Vec<String>,
}

impl WalletConfig {
    /// Load from a file path; any failure yields the empty config.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no wallet config, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed wallet config");
                Self::default()
            }
        }
    }

    pub fn load_from_dir(config_dir: &Path) -> Self {
        Self::load(&config_file(config_dir))
    }

    pub fn is_disabled(&self, short_name: &str) -> bool {
        self.disabled.iter().any(|d| d == short_name)
    }

    pub fn priority_index(&self, short_name: &str) -> Option<usize> {
        self.priority.iter().position(|p| p == short_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_empty_config() {
        let dir = tempdir().unwrap();
        assert_eq!(WalletConfig::load_from_dir(dir.path()), WalletConfig::default());
    }

    #[test]
    fn malformed_file_is_empty_config() {
        let dir = tempdir().unwrap();
        std::fs::write(config_file(dir.path()), "{ not json").unwrap();
        assert_eq!(WalletConfig::load_from_dir(dir.path()), WalletConfig::default());

        std::fs::write(config_file(dir.path()), r#"{"disabled": 5}"#).unwrap();
        assert_eq!(WalletConfig::load_from_dir(dir.path()), WalletConfig::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(
            config_file(dir.path()),
            r#"{"priority": ["ledger", "walletconnect"]}"#,
        )
        .unwrap();
        let config = WalletConfig::load_from_dir(dir.path());
        assert_eq!(config.default, None);
        assert!(config.disabled.is_empty());
        assert_eq!(config.priority_index("walletconnect"), Some(1));
        assert_eq!(config.priority_index("other"), None);
        assert!(!config.is_disabled("ledger"));
    }
}
