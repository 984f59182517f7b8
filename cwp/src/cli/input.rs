//! Stdin payloads and the selection prompt source

use crate::error::{CwpError, CwpResult};
use serde_json::Value;
use std::io::IsTerminal;
use tokio::io::{AsyncBufRead, AsyncReadExt, BufReader};
use tracing::debug;

/// Read the request payload from stdin. A terminal on stdin means no payload.
pub async fn read_stdin_payload() -> CwpResult<Option<Value>> {
    if std::io::stdin().is_terminal() {
        return Ok(None);
    }
    let mut raw = String::new();
    tokio::io::stdin().read_to_string(&mut raw).await?;
    parse_payload(&raw)
}

pub fn parse_payload(raw: &str) -> CwpResult<Option<Value>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(raw)
        .map(Some)
        .map_err(|_| CwpError::InvalidInput("Invalid JSON on stdin".into()))
}

/// Where the wallet choice is read from: stdin when it is a terminal,
/// otherwise the controlling terminal, since piped stdin carries the payload.
pub async fn prompt_source() -> Option<Box<dyn AsyncBufRead + Unpin + Send>> {
    if std::io::stdin().is_terminal() {
        return Some(Box::new(BufReader::new(tokio::io::stdin())));
    }
    match tokio::fs::File::open("/dev/tty").await {
        Ok(tty) => Some(Box::new(BufReader::new(tty))),
        Err(e) => {
            debug!(error = %e, "no controlling terminal for wallet selection");
            None
        }
    }
}
