//! CWP message schema
//!
//! A provider is invoked as `<path> <operation>`, receives at most one JSON
//! request on stdin and answers with exactly one JSON payload on stdout.
//! This module pins every operation to a strict request and response type so
//! malformed payloads are rejected before a process is spawned, and malformed
//! answers are rejected before they reach the caller.

use crate::error::{CwpError, CwpResult};
use alloy_primitives::U256;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Major protocol version spoken by this runtime.
pub const PROTOCOL_VERSION: &str = "1";

/// Operations the runtime can dispatch to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Info,
    Accounts,
    SignMessage,
    SignTypedData,
    SignTransaction,
    SendTransaction,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Info,
        Operation::Accounts,
        Operation::SignMessage,
        Operation::SignTypedData,
        Operation::SignTransaction,
        Operation::SendTransaction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Info => "info",
            Operation::Accounts => "accounts",
            Operation::SignMessage => "sign-message",
            Operation::SignTypedData => "sign-typed-data",
            Operation::SignTransaction => "sign-transaction",
            Operation::SendTransaction => "send-transaction",
        }
    }

    /// How long a provider may take before it is killed.
    ///
    /// Signing operations usually wait on a human, so they get minutes.
    pub fn default_timeout(self) -> Duration {
        match self {
            Operation::Info => Duration::from_millis(3_000),
            Operation::Accounts => Duration::from_millis(10_000),
            Operation::SignMessage | Operation::SignTypedData | Operation::SignTransaction => {
                Duration::from_millis(120_000)
            }
            Operation::SendTransaction => Duration::from_millis(180_000),
        }
    }

    /// Whether a successful call moves value and must be accounted in sessions.
    pub fn tracks_value(self) -> bool {
        matches!(self, Operation::SendTransaction)
    }
}

impl FromStr for Operation {
    type Err = CwpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| CwpError::Unsupported(format!("Unsupported operation: {}", s)))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unsigned 256-bit amount (wei-style integer).
///
/// Accepted as a decimal string, a `0x` hex string or a JSON integer;
/// always written back as a decimal string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(pub U256);

impl Amount {
    pub const ZERO: Amount = Amount(U256::ZERO);

    pub fn parse(text: &str) -> CwpResult<Self> {
        U256::from_str(text.trim())
            .map(Amount)
            .map_err(|e| CwpError::InvalidInput(format!("Invalid amount '{}': {}", text, e)))
    }

    pub fn from_json(value: &Value) -> CwpResult<Self> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => n.as_u64().map(|v| Amount(U256::from(v))).ok_or_else(|| {
                CwpError::InvalidInput(format!("Invalid amount '{}': not an unsigned integer", n))
            }),
            other => Err(CwpError::InvalidInput(format!(
                "Invalid amount '{}': expected a string or integer",
                other
            ))),
        }
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Amount::from_json(&raw).map_err(serde::de::Error::custom)
    }
}

/// Transaction object as passed through to the provider.
///
/// Only `to` and `value` are interpreted here; every other field is carried
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Transaction {
    pub fn recipient(&self) -> Option<&str> {
        self.to.as_deref().filter(|to| !to.is_empty())
    }

    /// Parsed `value`, or `None` when the transaction carries no value.
    pub fn amount(&self) -> CwpResult<Option<Amount>> {
        match &self.value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(v) => Amount::from_json(v).map(Some),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignMessageInput {
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    pub domain: Map<String, Value>,
    pub types: Map<String, Value>,
    pub primary_type: String,
    pub message: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignTypedDataInput {
    #[serde(default)]
    pub account: String,
    pub typed_data: TypedData,
    #[serde(default, skip_serializing)]
    pub session_id: Option<String>,
}

/// Input shared by `sign-transaction` and `send-transaction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    #[serde(default)]
    pub account: String,
    pub transaction: Transaction,
    #[serde(default)]
    pub chain: String,
    #[serde(default, skip_serializing)]
    pub session_id: Option<String>,
}

/// The subset of a request that session policies look at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageInput {
    #[serde(default)]
    pub chain: Option<String>,
    #[serde(default)]
    pub transaction: Option<Transaction>,
}

/// A validated request, one variant per operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Info,
    Accounts,
    SignMessage(SignMessageInput),
    SignTypedData(SignTypedDataInput),
    SignTransaction(TransactionInput),
    SendTransaction(TransactionInput),
}

impl Request {
    /// Validate a raw stdin payload against the operation's input type.
    pub fn parse(operation: Operation, payload: Option<Value>) -> CwpResult<Self> {
        match operation {
            Operation::Info => Ok(Request::Info),
            Operation::Accounts => Ok(Request::Accounts),
            Operation::SignMessage => {
                let input: SignMessageInput = decode(operation, payload)?;
                if input.account.is_empty() || input.message.is_empty() {
                    return Err(CwpError::InvalidInput("Missing account or message".into()));
                }
                Ok(Request::SignMessage(input))
            }
            Operation::SignTypedData => {
                let input: SignTypedDataInput = decode(operation, payload)?;
                if input.account.is_empty() {
                    return Err(CwpError::InvalidInput("Missing account or typedData".into()));
                }
                Ok(Request::SignTypedData(input))
            }
            Operation::SignTransaction | Operation::SendTransaction => {
                let input: TransactionInput = decode(operation, payload)?;
                if input.account.is_empty() || input.chain.is_empty() {
                    return Err(CwpError::InvalidInput(
                        "Missing account, transaction, or chain".into(),
                    ));
                }
                // Reject unparseable values here rather than inside the provider.
                input.transaction.amount()?;
                if operation == Operation::SignTransaction {
                    Ok(Request::SignTransaction(input))
                } else {
                    Ok(Request::SendTransaction(input))
                }
            }
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Request::Info => Operation::Info,
            Request::Accounts => Operation::Accounts,
            Request::SignMessage(_) => Operation::SignMessage,
            Request::SignTypedData(_) => Operation::SignTypedData,
            Request::SignTransaction(_) => Operation::SignTransaction,
            Request::SendTransaction(_) => Operation::SendTransaction,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            Request::Info | Request::Accounts => None,
            Request::SignMessage(input) => input.session_id.as_deref(),
            Request::SignTypedData(input) => input.session_id.as_deref(),
            Request::SignTransaction(input) | Request::SendTransaction(input) => {
                input.session_id.as_deref()
            }
        }
    }

    pub fn chain(&self) -> Option<&str> {
        match self {
            Request::SignTransaction(input) | Request::SendTransaction(input) => {
                Some(input.chain.as_str())
            }
            _ => None,
        }
    }

    pub fn usage(&self) -> Option<UsageInput> {
        match self {
            Request::SignTransaction(input) | Request::SendTransaction(input) => Some(UsageInput {
                chain: Some(input.chain.clone()),
                transaction: Some(input.transaction.clone()),
            }),
            _ => None,
        }
    }

    /// JSON written to the provider's stdin, if any.
    pub fn payload(&self) -> CwpResult<Option<Value>> {
        let value = match self {
            Request::Info | Request::Accounts => return Ok(None),
            Request::SignMessage(input) => serde_json::to_value(input)?,
            Request::SignTypedData(input) => serde_json::to_value(input)?,
            Request::SignTransaction(input) | Request::SendTransaction(input) => {
                serde_json::to_value(input)?
            }
        };
        Ok(Some(value))
    }
}

fn decode<T: DeserializeOwned>(operation: Operation, payload: Option<Value>) -> CwpResult<T> {
    let payload = payload.ok_or_else(|| {
        CwpError::InvalidInput(format!("{} requires a JSON payload on stdin", operation))
    })?;
    serde_json::from_value(payload)
        .map_err(|e| CwpError::InvalidInput(format!("Invalid {} input: {}", operation, e)))
}

/// Capability advertisement returned by `info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdns: Option<String>,
    pub capabilities: Vec<String>,
    pub chains: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
}

impl InfoResponse {
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// Exact CAIP-2 match, or a bare namespace covering it (`eip155` covers `eip155:10`).
    pub fn supports_chain(&self, chain: &str) -> bool {
        let namespace = chain.split(':').next().unwrap_or(chain);
        self.chains.iter().any(|c| c == chain || c == namespace)
    }

    /// Providers that omit the version speak version 1.
    pub fn check_protocol(&self) -> Result<(), String> {
        match self.protocol_version.as_deref() {
            None => Ok(()),
            Some(version) => {
                let major = version.split('.').next().unwrap_or(version);
                if major == PROTOCOL_VERSION {
                    Ok(())
                } else {
                    Err(format!("unsupported protocol version {}", version))
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub chain: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsResponse {
    pub accounts: Vec<AccountEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureResponse {
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransactionResponse {
    pub signed_transaction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHashResponse {
    pub transaction_hash: String,
}

/// A validated provider answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Info(InfoResponse),
    Accounts(AccountsResponse),
    Signature(SignatureResponse),
    SignedTransaction(SignedTransactionResponse),
    TransactionHash(TransactionHashResponse),
}

impl Response {
    pub fn parse(operation: Operation, value: &Value) -> Result<Self, serde_json::Error> {
        let value = value.clone();
        Ok(match operation {
            Operation::Info => Response::Info(serde_json::from_value(value)?),
            Operation::Accounts => Response::Accounts(serde_json::from_value(value)?),
            Operation::SignMessage | Operation::SignTypedData => {
                Response::Signature(serde_json::from_value(value)?)
            }
            Operation::SignTransaction => {
                Response::SignedTransaction(serde_json::from_value(value)?)
            }
            Operation::SendTransaction => {
                Response::TransactionHash(serde_json::from_value(value)?)
            }
        })
    }
}
