//! Provider execution
//!
//! One call spawns `<path> <operation>`, writes the optional JSON request to
//! stdin and closes it, collects stdout, drains stderr, and classifies the
//! outcome by exit code. There are no retries: each call delivers the
//! request to the provider at most once.

use crate::error::{CwpError, CwpResult, ErrorCode, ExitCode};
use crate::protocol::{Operation, Request, Response};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, trace, warn};

/// Raw output longer than this is cut in error messages.
const RAW_OUTPUT_PREVIEW: usize = 200;

/// Stderr is read and discarded in chunks of this size.
const STDERR_CHUNK: usize = 8 * 1024;

/// Error body a provider may print on a nonzero exit.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Run one provider operation and return its JSON answer.
pub async fn wallet_exec(
    path: &Path,
    operation: Operation,
    input: Option<&Value>,
    timeout: Duration,
) -> CwpResult<Value> {
    let binary = path.display().to_string();
    let payload = input.map(serde_json::to_vec).transpose()?;

    debug!(
        binary = %binary,
        operation = %operation,
        timeout_ms = timeout.as_millis() as u64,
        "spawning wallet provider"
    );

    let mut child = Command::new(path)
        .arg(operation.as_str())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| launch_error(&binary, e))?;

    // Stdin is closed right after the payload (or immediately) so providers
    // never wait for input that is not coming.
    let stdin = child.stdin.take();
    let writer = tokio::spawn(async move {
        let Some(mut stdin) = stdin else { return };
        if let Some(bytes) = payload {
            if let Err(e) = stdin.write_all(&bytes).await {
                debug!(error = %e, "provider closed stdin early");
                return;
            }
        }
        let _ = stdin.shutdown().await;
    });

    let stderr = child.stderr.take();
    let stderr_binary = binary.clone();
    let drain = tokio::spawn(async move {
        if let Some(stderr) = stderr {
            drain_stderr(stderr, &stderr_binary).await;
        }
    });

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => {
            // Dropping the wait future kills the child (kill_on_drop).
            writer.abort();
            drain.abort();
            warn!(binary = %binary, operation = %operation, "wallet provider timed out");
            return Err(CwpError::exec(
                format!("{} timed out after {}ms", binary, timeout.as_millis()),
                ExitCode::Timeout,
                ErrorCode::Timeout,
            ));
        }
    };
    writer.abort();
    drain.abort();

    debug!(binary = %binary, status = ?output.status.code(), "wallet provider exited");
    classify(&binary, output.status.code(), &output.stdout)
}

/// Run a validated request and check the answer against the operation's
/// response shape. The provider's JSON is returned as received.
pub async fn exec_request(path: &Path, request: &Request, timeout: Duration) -> CwpResult<Value> {
    let operation = request.operation();
    let payload = request.payload()?;
    let value = wallet_exec(path, operation, payload.as_ref(), timeout).await?;

    Response::parse(operation, &value).map_err(|e| {
        CwpError::exec(
            format!("Malformed {} response from {}: {}", operation, path.display(), e),
            ExitCode::GeneralError,
            ErrorCode::InternalError,
        )
    })?;
    Ok(value)
}

/// Read `stderr` to EOF in fixed-size chunks, tracing and discarding each.
/// Memory stays bounded whether or not the provider writes newlines.
async fn drain_stderr<R: AsyncRead + Unpin>(mut stderr: R, binary: &str) -> u64 {
    let mut chunk = vec![0u8; STDERR_CHUNK];
    let mut total = 0u64;
    loop {
        match stderr.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                total += n as u64;
                trace!(binary = %binary, "{}", String::from_utf8_lossy(&chunk[..n]).trim_end());
            }
        }
    }
    total
}

fn launch_error(binary: &str, e: std::io::Error) -> CwpError {
    let message = if e.kind() == std::io::ErrorKind::NotFound {
        format!("Wallet provider not found: {}", binary)
    } else {
        format!("Failed to launch {}: {}", binary, e)
    };
    CwpError::exec(message, ExitCode::GeneralError, ErrorCode::InternalError)
}

/// Map an exit status and captured stdout onto a result.
fn classify(binary: &str, status: Option<i32>, stdout: &[u8]) -> CwpResult<Value> {
    let raw = String::from_utf8_lossy(stdout);
    let text = raw.trim();

    if status == Some(0) {
        return serde_json::from_str(text).map_err(|_| {
            CwpError::exec(
                format!("Invalid JSON from {}: {}", binary, preview(text)),
                ExitCode::GeneralError,
                ErrorCode::InternalError,
            )
        });
    }

    let exit_code = status.unwrap_or(ExitCode::GeneralError.as_i32());
    let mut message = match status {
        None => format!("{} terminated by signal", binary),
        Some(code) => ExitCode::from_i32(code)
            .and_then(ExitCode::default_message)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} exited with code {}", binary, code)),
    };
    let mut code = ErrorCode::for_exit_code(exit_code);

    if let Ok(body) = serde_json::from_str::<ErrorBody>(text) {
        if let Some(error) = body.error.filter(|e| !e.is_empty()) {
            message = error;
        }
        if let Some(provider_code) = body.code.filter(|c| !c.is_empty()) {
            code = ErrorCode::from(provider_code);
        }
    }

    Err(CwpError::Exec {
        message,
        exit_code,
        code,
    })
}

fn preview(text: &str) -> String {
    text.chars().take(RAW_OUTPUT_PREVIEW).collect()
}
