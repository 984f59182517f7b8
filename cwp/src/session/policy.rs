//! Session validation and usage accounting.
//!
//! Validation order is fixed: revoked, expired, permission lookup, then each
//! policy of that permission left to right. The first failure wins.

use super::types::{Policy, SessionState, UNKNOWN_CHAIN};
use crate::error::{CwpError, CwpResult};
use crate::protocol::{Amount, UsageInput};

/// Chain key and value of the transaction in `input`, if it carries one.
fn transfer(input: Option<&UsageInput>) -> CwpResult<Option<(&str, Amount)>> {
    let Some(input) = input else { return Ok(None) };
    let Some(tx) = input.transaction.as_ref() else { return Ok(None) };
    let Some(amount) = tx.amount()? else { return Ok(None) };
    let chain = input
        .chain
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or(UNKNOWN_CHAIN);
    Ok(Some((chain, amount)))
}

impl Policy {
    pub fn evaluate(&self, session: &SessionState, input: Option<&UsageInput>) -> CwpResult<()> {
        match self {
            Policy::ValueLimit { max_value } => {
                let Some((chain, amount)) = transfer(input)? else { return Ok(()) };
                let prior = session.spent(chain);
                match prior.checked_add(amount) {
                    Some(total) if total <= *max_value => Ok(()),
                    Some(total) => Err(CwpError::Session(format!(
                        "Value limit exceeded: {} > {}",
                        total, max_value
                    ))),
                    None => Err(CwpError::Session(format!(
                        "Value limit exceeded: {} + {} > {}",
                        prior, amount, max_value
                    ))),
                }
            }
            Policy::RecipientAllowlist { addresses } => {
                let Some(to) = input
                    .and_then(|i| i.transaction.as_ref())
                    .and_then(|tx| tx.recipient())
                else {
                    return Ok(());
                };
                if addresses.iter().any(|a| a.eq_ignore_ascii_case(to)) {
                    Ok(())
                } else {
                    Err(CwpError::Session(format!("Recipient {} not in allowlist", to)))
                }
            }
            Policy::CallLimit {
                operation,
                max_calls,
            } => {
                let calls = session.call_count(operation);
                if calls >= *max_calls {
                    Err(CwpError::Session(format!(
                        "Call limit reached for {}: {} >= {}",
                        operation, calls, max_calls
                    )))
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl SessionState {
    /// Decide whether `operation` is allowed at `now_ms` without touching disk.
    pub fn check(&self, operation: &str, input: Option<&UsageInput>, now_ms: i64) -> CwpResult<()> {
        if self.revoked {
            return Err(CwpError::Session("Session has been revoked".into()));
        }
        if self.is_expired_at(now_ms) {
            return Err(CwpError::Session("Session has expired".into()));
        }
        let permission = self.permission(operation).ok_or_else(|| {
            CwpError::Session(format!("Session does not permit operation: {}", operation))
        })?;
        for policy in &permission.policies {
            policy.evaluate(self, input)?;
        }
        Ok(())
    }

    /// Count one call of `operation` and add any transaction value to its chain.
    pub fn record(&mut self, operation: &str, input: Option<&UsageInput>) -> CwpResult<()> {
        let transfer = transfer(input)?.map(|(chain, amount)| (chain.to_string(), amount));

        let count = self.call_counts.entry(operation.to_string()).or_insert(0);
        *count = count.saturating_add(1);

        if let Some((chain, amount)) = transfer {
            let total = self.spent(&chain).saturating_add(amount);
            self.total_value.insert(chain, total);
        }
        Ok(())
    }
}
