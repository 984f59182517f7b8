//! Wallet CLI module
//!
//! Command layer behind the `wallet` binary.
//!
//! # Commands
//!
//! - `list` - Discover wallet providers on PATH
//! - `accounts`, `sign-message`, `sign-typed-data`, `sign-transaction`,
//!   `send-transaction` - Resolve a provider and run the operation
//! - `session` - Session grants (grant, revoke, show)
//!
//! Exactly one JSON payload is written to stdout per invocation; everything
//! else goes to stderr.

pub mod commands;
pub mod context;
pub mod input;
pub mod output;

pub use context::CliContext;
pub use output::{OutputFormat, OutputFormatter};
