//! Session authorization
//!
//! A session is a durable, time-boxed grant naming the operations a caller
//! may request and the policies each must satisfy. Callers validate before
//! running an operation and record usage after it succeeds; the two calls are
//! separate and not atomic with the provider call in between.

pub mod policy;
pub mod store;
pub mod types;

pub use store::{is_session_id, SessionStore};
pub use types::{
    GrantSessionInput, GrantSessionResponse, Permission, Policy, SessionState, UNKNOWN_CHAIN,
};
