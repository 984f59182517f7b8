//! Interactive provider selection.
//!
//! - If `wallet` is set, looks up that provider directly.
//! - Otherwise discovers providers, filters by capability/chain,
//!   auto-selects if only one matches, or prompts the operator.
//!
//! Prompts and diagnostics go to the diagnostic writer (stderr in the CLI)
//! so stdout stays clean for JSON. `None` means nothing matched or the
//! operator cancelled.

use crate::registry::{ProviderInfo, Registry};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectOptions {
    /// Only providers advertising this capability (e.g. "send-transaction")
    pub capability: Option<String>,
    /// Only providers serving this chain (e.g. "eip155:10")
    pub chain: Option<String>,
    /// Skip selection and use this provider by short name
    pub wallet: Option<String>,
}

/// Line source for the selection prompt.
pub type PromptInput<'a> = &'a mut (dyn AsyncBufRead + Unpin + Send);

pub struct Selector<'a> {
    registry: &'a Registry,
}

impl<'a> Selector<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Resolve a provider. With several matches a numbered list is written to
    /// `diag` and one line is read from `input`; without `input` the choice is
    /// cancelled.
    pub async fn select(
        &self,
        options: &SelectOptions,
        input: Option<PromptInput<'_>>,
        diag: &mut dyn Write,
    ) -> Option<ProviderInfo> {
        if let Some(wallet) = options.wallet.as_deref() {
            return match self.registry.get_by_name(wallet).await {
                Some(provider) if provider.is_available() => Some(provider),
                _ => {
                    let _ = writeln!(
                        diag,
                        "Wallet provider \"{}\" not found or not responding.",
                        wallet
                    );
                    None
                }
            };
        }

        let candidates = filter_candidates(self.registry.discover().await, options);

        match candidates.len() {
            0 => {
                let _ = writeln!(diag, "No wallet providers found{}.", describe_filter(options));
                None
            }
            1 => {
                let provider = candidates.into_iter().next()?;
                let _ = writeln!(diag, "Using wallet: {}", provider.display_name());
                Some(provider)
            }
            count => {
                let _ = writeln!(diag, "Select a wallet:");
                for (i, provider) in candidates.iter().enumerate() {
                    let _ = writeln!(
                        diag,
                        "  {}) {} ({})",
                        i + 1,
                        provider.display_name(),
                        provider.chains().join(", ")
                    );
                }

                let Some(input) = input else {
                    let _ = writeln!(
                        diag,
                        "No terminal available for wallet selection; pass --wallet <name>."
                    );
                    return None;
                };

                let _ = write!(diag, "Choice [1-{}]: ", count);
                let _ = diag.flush();

                let mut answer = String::new();
                if let Err(e) = input.read_line(&mut answer).await {
                    debug!(error = %e, "failed to read wallet selection");
                    return None;
                }

                match parse_choice(&answer, count) {
                    Some(index) => candidates.into_iter().nth(index),
                    None => {
                        let _ = writeln!(diag, "Invalid selection.");
                        None
                    }
                }
            }
        }
    }
}

/// Keep providers that answered `info` and satisfy the capability/chain filters.
pub fn filter_candidates(providers: Vec<ProviderInfo>, options: &SelectOptions) -> Vec<ProviderInfo> {
    providers
        .into_iter()
        .filter(|p| p.is_available())
        .filter(|p| options.capability.as_deref().map_or(true, |c| p.supports(c)))
        .filter(|p| options.chain.as_deref().map_or(true, |c| p.supports_chain(c)))
        .collect()
}

/// 1-based operator answer to a 0-based index.
pub fn parse_choice(answer: &str, count: usize) -> Option<usize> {
    let choice: usize = answer.trim().parse().ok()?;
    (1..=count).contains(&choice).then(|| choice - 1)
}

fn describe_filter(options: &SelectOptions) -> String {
    match (options.capability.as_deref(), options.chain.as_deref()) {
        (Some(cap), Some(chain)) => format!(" supporting {} on {}", cap, chain),
        (Some(cap), None) => format!(" supporting {}", cap),
        (None, Some(chain)) => format!(" for {}", chain),
        (None, None) => String::new(),
    }
}
