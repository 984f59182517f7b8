//! Provider scanning
//!
//! Walks the search path looking for `wallet-<name>` executables. The first
//! directory that holds a given name wins, like shell command lookup.
//! Directories that cannot be listed are skipped silently.

use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Naming convention for provider executables.
pub const PROVIDER_PREFIX: &str = "wallet-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCandidate {
    /// Executable name, e.g. `wallet-walletconnect`
    pub binary: String,
    /// Name without the prefix, e.g. `walletconnect`
    pub short_name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct Scanner {
    search_path: Vec<PathBuf>,
}

impl Scanner {
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    /// Scanner over the process `PATH`.
    pub fn from_env() -> Self {
        Self::from_path_var(std::env::var_os("PATH"))
    }

    pub fn from_path_var(path_var: Option<OsString>) -> Self {
        let search_path = path_var
            .map(|p| {
                std::env::split_paths(&p)
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self { search_path }
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    pub fn find_candidates(&self) -> Vec<ProviderCandidate> {
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        for dir in &self.search_path {
            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "skipping search path entry");
                    continue;
                }
            };

            let mut names: Vec<String> = entries
                .flatten()
                .filter_map(|entry| entry.file_name().into_string().ok())
                .filter(|name| name.len() > PROVIDER_PREFIX.len() && name.starts_with(PROVIDER_PREFIX))
                .collect();
            names.sort();

            for name in names {
                if seen.contains(&name) {
                    continue;
                }
                let path = dir.join(&name);
                if !is_accessible_executable(&path) {
                    continue;
                }
                let short_name = name[PROVIDER_PREFIX.len()..].to_string();
                seen.insert(name.clone());
                results.push(ProviderCandidate {
                    binary: name,
                    short_name,
                    path,
                });
            }
        }

        debug!(count = results.len(), "provider candidates found");
        results
    }
}

/// Regular file that the current user may both read and execute.
#[cfg(unix)]
fn is_accessible_executable(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    if !std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false) {
        return false;
    }
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: c_path is a valid NUL-terminated string that outlives the call.
    unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::X_OK) == 0 }
}

#[cfg(not(unix))]
fn is_accessible_executable(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}
