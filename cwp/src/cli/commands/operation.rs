//! Provider operations: `accounts`, `sign-message`, `sign-typed-data`,
//! `sign-transaction`, `send-transaction`.

use crate::cli::input::{prompt_source, read_stdin_payload};
use crate::cli::{CliContext, OutputFormatter};
use crate::error::{CwpError, CwpResult};
use crate::exec::exec_request;
use crate::protocol::{Operation, Request};
use crate::registry::Registry;
use crate::select::{PromptInput, SelectOptions, Selector};
use crate::session::SessionStore;
use clap::Args;
use serde_json::Value;
use std::io::Write;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Args)]
pub struct OperationArgs {
    /// Use this wallet provider (short name) instead of selecting one
    #[arg(long, value_name = "NAME")]
    pub wallet: Option<String>,

    /// Authorize the call against a granted session
    #[arg(long, value_name = "SESSION_ID")]
    pub session: Option<String>,
}

pub async fn execute(ctx: &CliContext, operation: Operation, args: OperationArgs) -> CwpResult<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let payload = read_stdin_payload().await?;

    let registry = ctx.registry();
    let sessions = ctx.session_store();
    let mut prompt = prompt_source().await;
    let prompt = prompt.as_deref_mut().map(|source| source as PromptInput<'_>);

    ctx.debug(&format!("running {}", operation));
    let invocation = Invocation::new(&registry, &sessions);
    let result = invocation
        .run(operation, &args, payload, prompt, &mut std::io::stderr())
        .await?;

    formatter.json(&result);
    Ok(())
}

/// One operation end to end: parse, authorize, select, execute, account.
pub struct Invocation<'a> {
    registry: &'a Registry,
    sessions: &'a SessionStore,
}

impl<'a> Invocation<'a> {
    pub fn new(registry: &'a Registry, sessions: &'a SessionStore) -> Self {
        Self { registry, sessions }
    }

    pub async fn run(
        &self,
        operation: Operation,
        args: &OperationArgs,
        payload: Option<Value>,
        prompt: Option<PromptInput<'_>>,
        diag: &mut dyn Write,
    ) -> CwpResult<Value> {
        let request = Request::parse(operation, payload)?;
        let usage = request.usage();
        let session_id = args
            .session
            .as_deref()
            .or_else(|| request.session_id())
            .map(str::to_owned);

        if let Some(id) = session_id.as_deref() {
            self.sessions.validate(id, operation.as_str(), usage.as_ref())?;
            debug!(session_id = %id, operation = %operation, "session authorized");
        }

        let options = SelectOptions {
            capability: Some(operation.as_str().to_string()),
            chain: request.chain().map(str::to_owned),
            wallet: args.wallet.clone(),
        };
        let provider = Selector::new(self.registry)
            .select(&options, prompt, diag)
            .await
            .ok_or_else(|| {
                CwpError::Unsupported(format!("No wallet provider available for {}", operation))
            })?;

        if !provider.supports(operation.as_str()) {
            return Err(CwpError::Unsupported(format!(
                "Wallet provider \"{}\" does not support {}. Capabilities: {}",
                provider.short_name,
                operation,
                provider.capabilities().join(", ")
            )));
        }

        let result = exec_request(&provider.path, &request, operation.default_timeout()).await?;

        if let Some(id) = session_id.as_deref() {
            let tracked = if operation.tracks_value() { usage.as_ref() } else { None };
            // A failed accounting write does not discard the provider's result.
            if let Err(e) = self.sessions.record_usage(id, operation.as_str(), tracked) {
                warn!(session_id = %id, error = %e, "failed to record session usage");
                let _ = writeln!(diag, "Warning: session usage not recorded: {}", e);
            }
        }

        Ok(result)
    }
}
