//! Provider registry
//!
//! Combines the scanner with `info` probes and the user's configuration:
//!
//! 1. Scan the search path for `wallet-*` executables
//! 2. Drop providers disabled in config
//! 3. Call `<provider> info` on every candidate in parallel (3s each)
//! 4. Sort: config priority first, then alphabetical by short name
//!
//! A probe that fails or times out is recorded on that provider's `error`
//! and never fails discovery as a whole.

use crate::config::WalletConfig;
use crate::exec::wallet_exec;
use crate::protocol::{InfoResponse, Operation};
use crate::scanner::{ProviderCandidate, Scanner};
use futures::future::join_all;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(3_000);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub binary: String,
    pub short_name: String,
    pub path: PathBuf,
    /// Answer to `info`; `None` when the probe failed.
    pub info: Option<InfoResponse>,
    /// Probe failure; set exactly when `info` is `None`.
    pub error: Option<String>,
}

impl ProviderInfo {
    fn probed(candidate: ProviderCandidate, outcome: Result<InfoResponse, String>) -> Self {
        let (info, error) = match outcome {
            Ok(info) => (Some(info), None),
            Err(error) => (None, Some(error)),
        };
        Self {
            binary: candidate.binary,
            short_name: candidate.short_name,
            path: candidate.path,
            info,
            error,
        }
    }

    pub fn is_available(&self) -> bool {
        self.info.is_some()
    }

    /// Advertised name, falling back to the short name.
    pub fn display_name(&self) -> &str {
        self.info
            .as_ref()
            .map(|i| i.name.as_str())
            .unwrap_or(&self.short_name)
    }

    pub fn supports(&self, capability: &str) -> bool {
        self.info.as_ref().map_or(false, |i| i.supports(capability))
    }

    pub fn supports_chain(&self, chain: &str) -> bool {
        self.info.as_ref().map_or(false, |i| i.supports_chain(chain))
    }

    pub fn capabilities(&self) -> &[String] {
        self.info.as_ref().map(|i| i.capabilities.as_slice()).unwrap_or(&[])
    }

    pub fn chains(&self) -> &[String] {
        self.info.as_ref().map(|i| i.chains.as_slice()).unwrap_or(&[])
    }
}

pub struct Registry {
    scanner: Scanner,
    config: WalletConfig,
    probe_timeout: Duration,
}

impl Registry {
    pub fn new(scanner: Scanner, config: WalletConfig) -> Self {
        Self {
            scanner,
            config,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// Probe every enabled candidate; completes when every probe has
    /// answered or timed out.
    pub async fn discover(&self) -> Vec<ProviderInfo> {
        let candidates: Vec<ProviderCandidate> = self
            .scanner
            .find_candidates()
            .into_iter()
            .filter(|c| {
                let disabled = self.config.is_disabled(&c.short_name);
                if disabled {
                    debug!(provider = %c.short_name, "provider disabled in config");
                }
                !disabled
            })
            .collect();

        // join_all keeps candidate order, so the sort below is deterministic.
        let mut providers = join_all(candidates.into_iter().map(|candidate| async move {
            let outcome = probe(&candidate, self.probe_timeout).await;
            ProviderInfo::probed(candidate, outcome)
        }))
        .await;

        sort_providers(&mut providers, &self.config);
        providers
    }

    /// Configured default if it answered, else the first provider that did.
    pub async fn get_default(&self) -> Option<ProviderInfo> {
        let providers = self.discover().await;
        pick_default(&providers, &self.config).cloned()
    }

    pub async fn get_by_name(&self, name: &str) -> Option<ProviderInfo> {
        self.discover()
            .await
            .into_iter()
            .find(|p| p.short_name == name)
    }
}

async fn probe(candidate: &ProviderCandidate, timeout: Duration) -> Result<InfoResponse, String> {
    let value = wallet_exec(&candidate.path, Operation::Info, None, timeout)
        .await
        .map_err(|e| e.to_string())
        .and_then(|value| {
            serde_json::from_value::<InfoResponse>(value)
                .map_err(|e| format!("Malformed info response from {}: {}", candidate.binary, e))
        })
        .and_then(|info| info.check_protocol().map(|_| info));

    match &value {
        Ok(info) => debug!(provider = %candidate.short_name, name = %info.name, "provider probed"),
        Err(e) => warn!(provider = %candidate.short_name, error = %e, "provider probe failed"),
    }
    value
}

/// Priority entries first in config order, everything else by short name.
pub fn sort_providers(providers: &mut [ProviderInfo], config: &WalletConfig) {
    providers.sort_by(|a, b| {
        let rank = |p: &ProviderInfo| config.priority_index(&p.short_name).unwrap_or(usize::MAX);
        rank(a)
            .cmp(&rank(b))
            .then_with(|| a.short_name.cmp(&b.short_name))
    });
}

pub fn pick_default<'a>(
    providers: &'a [ProviderInfo],
    config: &WalletConfig,
) -> Option<&'a ProviderInfo> {
    config
        .default
        .as_deref()
        .and_then(|name| {
            providers
                .iter()
                .find(|p| p.short_name == name && p.is_available())
        })
        .or_else(|| providers.iter().find(|p| p.is_available()))
}
