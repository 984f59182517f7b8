//! Session records as stored on disk.

use crate::error::{CwpError, CwpResult};
use crate::protocol::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chain key used for value accounting when the input names no chain.
pub const UNKNOWN_CHAIN: &str = "unknown";

/// A single rule attached to a permitted operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "kebab-case")]
pub enum Policy {
    /// Cumulative transaction value per chain may not exceed `max_value`.
    #[serde(rename_all = "camelCase")]
    ValueLimit { max_value: Amount },
    /// Transaction recipients must be listed (case-insensitive).
    RecipientAllowlist { addresses: Vec<String> },
    /// `operation` may have been recorded at most `max_calls - 1` times.
    ///
    /// The counted operation may differ from the one being validated.
    #[serde(rename_all = "camelCase")]
    CallLimit { operation: String, max_calls: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub operation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<Policy>,
}

impl Permission {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            policies: Vec::new(),
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policies.push(policy);
        self
    }
}

/// Durable authorization record, one file per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// 128 random bits, lowercase hex
    pub session_id: String,
    pub account: String,
    pub chain: String,
    pub permissions: Vec<Permission>,
    /// Milliseconds since the Unix epoch
    pub expiry: i64,
    pub revoked: bool,
    #[serde(default)]
    pub call_counts: BTreeMap<String, u64>,
    #[serde(default)]
    pub total_value: BTreeMap<String, Amount>,
}

impl SessionState {
    pub fn permission(&self, operation: &str) -> Option<&Permission> {
        self.permissions.iter().find(|p| p.operation == operation)
    }

    pub fn call_count(&self, operation: &str) -> u64 {
        self.call_counts.get(operation).copied().unwrap_or(0)
    }

    /// Value recorded so far on `chain`.
    pub fn spent(&self, chain: &str) -> Amount {
        self.total_value.get(chain).copied().unwrap_or(Amount::ZERO)
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.expiry
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expiry)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantSessionInput {
    pub account: String,
    pub chain: String,
    pub permissions: Vec<Permission>,
    pub expiry: i64,
}

impl GrantSessionInput {
    pub fn validate(&self) -> CwpResult<()> {
        if self.account.is_empty()
            || self.chain.is_empty()
            || self.permissions.is_empty()
            || self.expiry <= 0
        {
            return Err(CwpError::InvalidInput(
                "Missing account, chain, permissions, or expiry".into(),
            ));
        }
        if self.permissions.iter().any(|p| p.operation.is_empty()) {
            return Err(CwpError::InvalidInput(
                "Every permission must name an operation".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantSessionResponse {
    pub session_id: String,
    pub permissions: Vec<Permission>,
    pub expiry: i64,
}

impl From<&SessionState> for GrantSessionResponse {
    fn from(session: &SessionState) -> Self {
        Self {
            session_id: session.session_id.clone(),
            permissions: session.permissions.clone(),
            expiry: session.expiry,
        }
    }
}
