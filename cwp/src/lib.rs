//! CWP - CLI Wallet Protocol runtime
//!
//! Discovers `wallet-<name>` provider executables on the search path,
//! invokes them through a JSON-over-stdio contract, and authorizes repeated
//! invocations through persisted, policy-governed sessions.
//!
//! Components, leaves first:
//!
//! - [`exec`] - spawn a provider for one operation, enforce a timeout, classify the outcome
//! - [`scanner`] - enumerate candidate executables from the search path
//! - [`registry`] - probe every candidate with `info` and rank them using [`config`]
//! - [`select`] - filter by capability/chain and pick one, interactively if needed
//! - [`session`] - durable grants, policy evaluation and usage accounting
//!
//! The `cli` feature adds the command layer used by the `wallet` binary.

pub mod config;
pub mod error;
pub mod exec;
pub mod protocol;
pub mod registry;
pub mod scanner;
pub mod select;
pub mod session;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::WalletConfig;
pub use error::{CwpError, CwpResult, ErrorCode, ErrorResponse, ExitCode};
pub use exec::{exec_request, wallet_exec};
pub use protocol::{Operation, Request, Response, PROTOCOL_VERSION};
pub use registry::{ProviderInfo, Registry};
pub use scanner::{ProviderCandidate, Scanner, PROVIDER_PREFIX};
pub use select::{SelectOptions, Selector};
pub use session::{SessionState, SessionStore};
