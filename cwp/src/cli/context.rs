//! CLI context - shared state and services for all commands

use crate::config::{default_config_dir, WalletConfig};
use crate::registry::Registry;
use crate::scanner::Scanner;
use crate::session::SessionStore;
use std::path::PathBuf;

/// Shared context for CLI commands
pub struct CliContext {
    /// Configuration directory (config.json, sessions/)
    pub config_dir: PathBuf,
    /// Loaded wallet configuration
    pub config: WalletConfig,
    /// Output format preference
    pub output_format: super::OutputFormat,
    /// Quiet mode (suppress status messages)
    pub quiet: bool,
    /// Verbose mode (extra debug output)
    pub verbose: bool,
}

impl CliContext {
    /// Create a new CLI context rooted at a configuration directory
    pub fn new(config_dir: PathBuf) -> Self {
        let config = WalletConfig::load_from_dir(&config_dir);
        Self {
            config_dir,
            config,
            output_format: super::OutputFormat::Json,
            quiet: false,
            verbose: false,
        }
    }

    /// Create context with the default configuration directory
    pub fn with_defaults() -> Self {
        Self::new(default_config_dir())
    }

    /// Registry over the process search path
    pub fn registry(&self) -> Registry {
        Registry::new(Scanner::from_env(), self.config.clone())
    }

    pub fn session_store(&self) -> SessionStore {
        SessionStore::from_config_dir(&self.config_dir)
    }

    /// Print status message (respects quiet mode)
    pub fn status(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }

    /// Print verbose message (only in verbose mode)
    pub fn debug(&self, message: &str) {
        if self.verbose {
            eprintln!("[DEBUG] {}", message);
        }
    }
}
