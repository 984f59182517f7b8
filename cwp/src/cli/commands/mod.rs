//! CLI commands module

pub mod list;
pub mod operation;
pub mod session;
