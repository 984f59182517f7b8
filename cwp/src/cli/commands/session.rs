//! `wallet session` - grant, revoke and inspect sessions

use crate::cli::input::read_stdin_payload;
use crate::cli::{CliContext, OutputFormat, OutputFormatter};
use crate::error::{CwpError, CwpResult};
use crate::session::{GrantSessionInput, GrantSessionResponse, SessionState, SessionStore};
use clap::Subcommand;
use serde_json::{json, Value};

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Grant a session (GrantSessionInput JSON on stdin)
    Grant,

    /// Revoke a session
    Revoke {
        /// Session identifier
        session_id: String,
    },

    /// Show a session's stored state
    Show {
        /// Session identifier
        session_id: String,
    },
}

pub async fn execute(ctx: &CliContext, command: SessionCommand) -> CwpResult<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let store = ctx.session_store();

    match command {
        SessionCommand::Grant => {
            let payload = read_stdin_payload().await?;
            let response = grant(&store, payload)?;
            if !ctx.quiet {
                formatter.success(&format!("Granted session {}", response.session_id));
            }
            formatter.json(&response);
        }
        SessionCommand::Revoke { session_id } => {
            formatter.json(&revoke(&store, &session_id)?);
        }
        SessionCommand::Show { session_id } => {
            let session = store.load(&session_id)?;
            match ctx.output_format {
                OutputFormat::Json => formatter.json(&session),
                OutputFormat::Table => show_table(&formatter, &session),
            }
        }
    }

    Ok(())
}

pub fn grant(store: &SessionStore, payload: Option<Value>) -> CwpResult<GrantSessionResponse> {
    let payload = payload.ok_or_else(|| {
        CwpError::InvalidInput("session grant requires a JSON payload on stdin".into())
    })?;
    let input: GrantSessionInput = serde_json::from_value(payload)
        .map_err(|e| CwpError::InvalidInput(format!("Invalid grant input: {}", e)))?;
    let session = store.grant(input)?;
    Ok(GrantSessionResponse::from(&session))
}

pub fn revoke(store: &SessionStore, session_id: &str) -> CwpResult<Value> {
    store.revoke(session_id)?;
    Ok(json!({ "revoked": true }))
}

fn show_table(formatter: &OutputFormatter, session: &SessionState) {
    formatter.kv("Session", &session.session_id);
    formatter.kv("Account", &session.account);
    formatter.kv("Chain", &session.chain);
    let expiry = session
        .expires_at()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| session.expiry.to_string());
    formatter.kv("Expires", &expiry);
    formatter.kv("Revoked", &session.revoked.to_string());
    for permission in &session.permissions {
        formatter.kv(
            &format!("  {}", permission.operation),
            &format!(
                "{} call(s), {} polic(ies)",
                session.call_count(&permission.operation),
                permission.policies.len()
            ),
        );
    }
    for (chain, total) in &session.total_value {
        formatter.kv(&format!("  spent on {}", chain), &total.to_string());
    }
}
