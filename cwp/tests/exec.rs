mod common;

use common::ProviderDir;
use cwp::error::{CwpError, ErrorCode};
use cwp::exec::{exec_request, wallet_exec};
use cwp::protocol::{Operation, Request};
use pretty_assertions::assert_eq;
use serde_json::json;
use serial_test::serial;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn exec_parts(err: CwpError) -> (String, i32, ErrorCode) {
    match err {
        CwpError::Exec {
            message,
            exit_code,
            code,
        } => (message, exit_code, code),
        other => panic!("expected exec error, got {:?}", other),
    }
}

#[tokio::test]
#[serial]
async fn success_returns_parsed_stdout() {
    let dir = ProviderDir::new();
    let path = dir.script("wallet-ok", "echo '{\"accounts\":[]}'");

    let value = wallet_exec(&path, Operation::Accounts, None, TIMEOUT).await.unwrap();
    assert_eq!(value, json!({ "accounts": [] }));
}

#[tokio::test]
#[serial]
async fn operation_is_first_argument_and_payload_is_stdin() {
    let dir = ProviderDir::new();
    let path = dir.script(
        "wallet-echo",
        "input=$(cat); printf '{\"op\":\"%s\",\"input\":%s}' \"$1\" \"$input\"",
    );

    let value = wallet_exec(
        &path,
        Operation::SignMessage,
        Some(&json!({ "account": "0xabc", "message": "hi" })),
        TIMEOUT,
    )
    .await
    .unwrap();

    assert_eq!(
        value,
        json!({ "op": "sign-message", "input": { "account": "0xabc", "message": "hi" } })
    );
}

#[tokio::test]
#[serial]
async fn zero_exit_with_non_json_is_internal_error() {
    let dir = ProviderDir::new();
    let path = dir.script("wallet-chatty", "echo hello");

    let err = wallet_exec(&path, Operation::Info, None, TIMEOUT).await.unwrap_err();
    let (message, exit_code, code) = exec_parts(err);

    assert_eq!(message, format!("Invalid JSON from {}: hello", path.display()));
    assert_eq!(exit_code, 1);
    assert_eq!(code, ErrorCode::InternalError);
}

#[tokio::test]
#[serial]
async fn rejection_without_body_uses_table_message() {
    let dir = ProviderDir::new();
    let path = dir.script("wallet-no", "exit 3");

    let err = wallet_exec(&path, Operation::SignMessage, None, TIMEOUT).await.unwrap_err();
    let (message, exit_code, code) = exec_parts(err);

    assert_eq!(message, "User rejected the request");
    assert_eq!(exit_code, 3);
    assert_eq!(code, ErrorCode::UserRejected);
}

#[tokio::test]
#[serial]
async fn provider_error_body_overrides_defaults() {
    let dir = ProviderDir::new();
    let path = dir.script(
        "wallet-locked",
        "echo '{\"error\":\"Vault is locked\",\"code\":\"VAULT_LOCKED\"}'; exit 5",
    );

    let err = wallet_exec(&path, Operation::Accounts, None, TIMEOUT).await.unwrap_err();
    let response = err.to_response();

    assert_eq!(response.error, "Vault is locked");
    assert_eq!(response.code, ErrorCode::Other("VAULT_LOCKED".into()));
    assert_eq!(err.exit_code(), 5);
}

#[tokio::test]
#[serial]
async fn unlisted_exit_code_names_the_binary() {
    let dir = ProviderDir::new();
    let path = dir.script("wallet-odd", "exit 9");

    let err = wallet_exec(&path, Operation::Accounts, None, TIMEOUT).await.unwrap_err();
    let (message, exit_code, code) = exec_parts(err);

    assert_eq!(message, format!("{} exited with code 9", path.display()));
    assert_eq!(exit_code, 9);
    assert_eq!(code, ErrorCode::InternalError);
}

#[tokio::test]
#[serial]
async fn slow_provider_is_killed_at_timeout() {
    let dir = ProviderDir::new();
    let path = dir.script("wallet-slow", "exec sleep 10");

    let started = std::time::Instant::now();
    let err = wallet_exec(&path, Operation::Info, None, Duration::from_millis(200))
        .await
        .unwrap_err();
    let (message, exit_code, code) = exec_parts(err);

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(message, format!("{} timed out after 200ms", path.display()));
    assert_eq!(exit_code, 4);
    assert_eq!(code, ErrorCode::Timeout);
}

#[tokio::test]
#[serial]
async fn malformed_response_shape_is_rejected() {
    let dir = ProviderDir::new();
    let path = dir.script("wallet-shape", "cat >/dev/null; echo '{\"sig\":\"0x1\"}'");
    let request = Request::parse(
        Operation::SignMessage,
        Some(json!({ "account": "0xabc", "message": "hi" })),
    )
    .unwrap();

    let err = exec_request(&path, &request, TIMEOUT).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InternalError);
    assert!(err.to_string().starts_with("Malformed sign-message response from"));
}

#[tokio::test]
#[serial]
async fn session_id_is_not_forwarded() {
    let dir = ProviderDir::new();
    let path = dir.script(
        "wallet-sig",
        "input=$(cat); case \"$input\" in *sessionId*) exit 7;; esac; echo '{\"signature\":\"0xsig\"}'",
    );
    let request = Request::parse(
        Operation::SignMessage,
        Some(json!({ "account": "0xabc", "message": "hi", "sessionId": "ab".repeat(16) })),
    )
    .unwrap();

    let value = exec_request(&path, &request, TIMEOUT).await.unwrap();
    assert_eq!(value, json!({ "signature": "0xsig" }));
}

#[tokio::test]
#[serial]
async fn no_input_closes_stdin_immediately() {
    let dir = ProviderDir::new();
    let path = dir.script("wallet-reader", "cat >/dev/null; echo '{\"ok\":true}'");

    let value = wallet_exec(&path, Operation::Accounts, None, Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(value, json!({ "ok": true }));
}

#[tokio::test]
#[serial]
async fn heavy_stderr_does_not_block_the_answer() {
    let dir = ProviderDir::new();
    // ~2 MB of stderr written before stdin is consumed and the answer printed.
    let path = dir.script(
        "wallet-noisy",
        "head -c 2000000 /dev/zero | tr '\\0' 'e' >&2; cat >/dev/null; echo '{\"ok\":1}'",
    );
    let payload = json!({ "account": "0xabc", "message": "m".repeat(500_000) });

    let value = wallet_exec(&path, Operation::SignMessage, Some(&payload), Duration::from_secs(20))
        .await
        .unwrap();
    assert_eq!(value, json!({ "ok": 1 }));
}
