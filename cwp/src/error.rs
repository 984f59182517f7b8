//! Error taxonomy shared by the executor, session store and command layer.
//!
//! Every failure carries a human message, a wire [`ErrorCode`] and a process
//! exit status. The command layer converts a [`CwpError`] straight into the
//! final `{error, code}` payload and exit code.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard CWP exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitCode {
    Success,
    GeneralError,
    Unsupported,
    Rejected,
    Timeout,
    NotConnected,
    SessionError,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::GeneralError => 1,
            ExitCode::Unsupported => 2,
            ExitCode::Rejected => 3,
            ExitCode::Timeout => 4,
            ExitCode::NotConnected => 5,
            ExitCode::SessionError => 6,
        }
    }

    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(ExitCode::Success),
            1 => Some(ExitCode::GeneralError),
            2 => Some(ExitCode::Unsupported),
            3 => Some(ExitCode::Rejected),
            4 => Some(ExitCode::Timeout),
            5 => Some(ExitCode::NotConnected),
            6 => Some(ExitCode::SessionError),
            _ => None,
        }
    }

    /// Message used when a provider exits with this code and no error body.
    ///
    /// Codes 0 and 1 have no fixed text; the caller formats
    /// `"<binary> exited with code <n>"` for anything not listed here.
    pub fn default_message(self) -> Option<&'static str> {
        match self {
            ExitCode::Unsupported => Some("Operation not supported"),
            ExitCode::Rejected => Some("User rejected the request"),
            ExitCode::Timeout => Some("Operation timed out"),
            ExitCode::NotConnected => Some("No wallet connection active"),
            _ => None,
        }
    }
}

/// Wire error code carried in `{"error": ..., "code": ...}` payloads.
///
/// Codes a provider reports that are not part of the standard set are kept
/// verbatim in [`ErrorCode::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    InvalidInput,
    UnsupportedOperation,
    UserRejected,
    Timeout,
    NotConnected,
    AccountNotFound,
    SessionError,
    InternalError,
    Other(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            ErrorCode::UserRejected => "USER_REJECTED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::NotConnected => "NOT_CONNECTED",
            ErrorCode::AccountNotFound => "ACCOUNT_NOT_FOUND",
            ErrorCode::SessionError => "SESSION_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::Other(code) => code,
        }
    }

    /// Code implied by a provider exit status when the provider gave none.
    pub fn for_exit_code(code: i32) -> Self {
        match ExitCode::from_i32(code) {
            Some(ExitCode::Unsupported) => ErrorCode::UnsupportedOperation,
            Some(ExitCode::Rejected) => ErrorCode::UserRejected,
            Some(ExitCode::Timeout) => ErrorCode::Timeout,
            Some(ExitCode::NotConnected) => ErrorCode::NotConnected,
            Some(ExitCode::SessionError) => ErrorCode::SessionError,
            _ => ErrorCode::InternalError,
        }
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "INVALID_INPUT" => ErrorCode::InvalidInput,
            "UNSUPPORTED_OPERATION" => ErrorCode::UnsupportedOperation,
            "USER_REJECTED" => ErrorCode::UserRejected,
            "TIMEOUT" => ErrorCode::Timeout,
            "NOT_CONNECTED" => ErrorCode::NotConnected,
            "ACCOUNT_NOT_FOUND" => ErrorCode::AccountNotFound,
            "SESSION_ERROR" => ErrorCode::SessionError,
            "INTERNAL_ERROR" => ErrorCode::InternalError,
            _ => ErrorCode::Other(code),
        }
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single failure payload written to stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: ErrorCode,
}

#[derive(Debug, Error)]
pub enum CwpError {
    /// A provider invocation failed, as classified by the executor.
    #[error("{message}")]
    Exec {
        message: String,
        exit_code: i32,
        code: ErrorCode,
    },
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Unsupported(String),
    /// Revoked, expired, unpermitted or policy violation.
    #[error("{0}")]
    Session(String),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type CwpResult<T> = Result<T, CwpError>;

impl CwpError {
    pub(crate) fn exec(message: impl Into<String>, exit_code: ExitCode, code: ErrorCode) -> Self {
        CwpError::Exec {
            message: message.into(),
            exit_code: exit_code.as_i32(),
            code,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            CwpError::Exec { code, .. } => code.clone(),
            CwpError::InvalidInput(_) => ErrorCode::InvalidInput,
            CwpError::Unsupported(_) => ErrorCode::UnsupportedOperation,
            CwpError::Session(_) | CwpError::SessionNotFound(_) => ErrorCode::SessionError,
            CwpError::Io(_) | CwpError::Serde(_) => ErrorCode::InternalError,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CwpError::Exec { exit_code, .. } => *exit_code,
            CwpError::Unsupported(_) => ExitCode::Unsupported.as_i32(),
            CwpError::Session(_) | CwpError::SessionNotFound(_) => {
                ExitCode::SessionError.as_i32()
            }
            CwpError::InvalidInput(_) | CwpError::Io(_) | CwpError::Serde(_) => {
                ExitCode::GeneralError.as_i32()
            }
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            code: self.code(),
        }
    }
}
