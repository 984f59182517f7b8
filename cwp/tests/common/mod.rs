//! Shared helpers: throwaway search-path directories populated with
//! shell-script wallet providers.

#![allow(dead_code)]

use cwp::config::WalletConfig;
use cwp::registry::Registry;
use cwp::scanner::Scanner;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub struct ProviderDir {
    dir: TempDir,
}

impl ProviderDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write an executable `/bin/sh` script; `body` follows the shebang.
    pub fn script(&self, file_name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(file_name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write script");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("chmod script");
        }
        path
    }

    /// A `wallet-<short>` provider answering `info` with `info` and each
    /// `(operation, shell)` pair with the given shell snippet. Anything else
    /// exits 2.
    pub fn provider(&self, short: &str, info: &Value, operations: &[(&str, &str)]) -> PathBuf {
        let mut body = String::from("case \"$1\" in\n");
        body.push_str(&format!("  info)\n    cat <<'JSON'\n{}\nJSON\n    ;;\n", info));
        for (operation, shell) in operations {
            body.push_str(&format!("  {})\n    {}\n    ;;\n", operation, shell));
        }
        body.push_str("  *)\n    exit 2\n    ;;\nesac");
        self.script(&format!("wallet-{}", short), &body)
    }

    pub fn scanner(&self) -> Scanner {
        Scanner::new(vec![self.path().to_path_buf()])
    }

    pub fn registry(&self, config: WalletConfig) -> Registry {
        Registry::new(self.scanner(), config).with_probe_timeout(Duration::from_millis(1_000))
    }
}

pub fn info(name: &str, capabilities: &[&str], chains: &[&str]) -> Value {
    json!({
        "name": name,
        "version": "1.0.0",
        "capabilities": capabilities,
        "chains": chains,
    })
}

/// Shell snippet: swallow stdin, print `payload`.
pub fn respond(payload: &Value) -> String {
    format!("cat >/dev/null; echo '{}'", payload)
}
