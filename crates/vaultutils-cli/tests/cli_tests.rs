//! Integration tests for the `vaultutils` CLI binary.
//!
//! These run the binary as a subprocess and check exit codes and output.
//! Tests that need a server start a Vault-shaped axum app over
//! `MemoryStore` on a loopback port.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::{Path, PathBuf};
use std::process::Command;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use vaultutils_store::{MemoryStore, SecretData, SecretStore};

const TOKEN: &str = "s.cli-test";

/// Helper: locate the `vaultutils` binary built by `cargo test`.
fn vaultutils_bin() -> String {
    let path = env!("CARGO_BIN_EXE_vaultutils");
    assert!(
        Path::new(path).exists(),
        "vaultutils binary not found at {path}"
    );
    path.to_owned()
}

/// Helper: a command with every setting the CLI reads from the
/// environment cleared.
fn command() -> Command {
    let mut cmd = Command::new(vaultutils_bin());
    for var in [
        "VAULT_ADDR",
        "VAULT_TOKEN",
        "VAULT_CAPATH",
        "DEBUG",
        "RUST_LOG",
        "VAULTUTILS_LOG_JSON",
        "KUBE_SECRET_DIR",
        "KUBE_NAMESPACE",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Helper: run a prepared command and return (`exit_code`, stdout, stderr).
fn output_of(mut cmd: Command) -> (i32, String, String) {
    let output = cmd.output().expect("failed to execute vaultutils");
    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

/// Helper: run vaultutils with args and a clean environment.
fn run(args: &[&str]) -> (i32, String, String) {
    let mut cmd = command();
    cmd.args(args);
    output_of(cmd)
}

/// Helper: run a prepared command off the async runtime, so a fake Vault
/// spawned on the same runtime keeps serving.
async fn output_of_async(cmd: Command) -> (i32, String, String) {
    tokio::task::spawn_blocking(move || output_of(cmd))
        .await
        .unwrap()
}

/// Helper: write a freshly generated self-signed CA certificate.
fn write_ca(dir: &Path) -> PathBuf {
    let rcgen::CertifiedKey { cert, .. } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_owned()]).unwrap();
    let path = dir.join("ca.pem");
    std::fs::write(&path, cert.pem()).unwrap();
    path
}

/// Helper: a command pointed at `addr` with a valid token and CA file.
fn configured(addr: &str, ca: &Path) -> Command {
    let mut cmd = command();
    cmd.env("VAULT_ADDR", addr)
        .env("VAULT_TOKEN", TOKEN)
        .env("VAULT_CAPATH", ca);
    cmd
}

// ── Fake Vault ───────────────────────────────────────────────────────

async fn fake_vault(
    State(store): State<MemoryStore>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if headers.get("X-Vault-Token").and_then(|v| v.to_str().ok()) != Some(TOKEN) {
        let body = json!({ "errors": ["permission denied"] });
        return (StatusCode::FORBIDDEN, Json(body)).into_response();
    }
    let raw = uri.path().strip_prefix("/v1/").unwrap_or_default();
    let path = urlencoding::decode(raw).unwrap().into_owned();
    let listing = uri.query().is_some_and(|q| q.contains("list=true"));

    match (method, path.as_str()) {
        (Method::GET, "auth/token/lookup-self") => {
            Json(json!({ "data": { "id": TOKEN } })).into_response()
        }
        (Method::GET, p) if listing => match store.list(p).await.unwrap() {
            Some(keys) => Json(json!({ "data": { "keys": keys } })).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        (Method::POST, p) => {
            let data: SecretData = serde_json::from_slice(&body).unwrap();
            store.write(p, &data).await.unwrap();
            StatusCode::NO_CONTENT.into_response()
        }
        (Method::DELETE, p) => {
            store.delete(p).await.unwrap();
            StatusCode::NO_CONTENT.into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn spawn_fake_vault(store: MemoryStore) -> String {
    let app = Router::new().fallback(fake_vault).with_state(store);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

// ── Version & help ───────────────────────────────────────────────────

#[test]
fn test_version_flag() {
    let (code, stdout, _) = run(&["--version"]);
    assert_eq!(code, 0, "vaultutils --version should exit 0");
    assert!(
        stdout.contains("vaultutils"),
        "version output should contain 'vaultutils': {stdout}"
    );
}

#[test]
fn test_help_lists_subcommands() {
    let (code, stdout, _) = run(&["--help"]);
    assert_eq!(code, 0, "vaultutils --help should exit 0");
    for sub in ["delete", "copy", "token"] {
        assert!(stdout.contains(sub), "help should list '{sub}': {stdout}");
    }
    assert!(
        stdout.contains("VAULT_CAPATH"),
        "help should document VAULT_CAPATH"
    );
}

#[test]
fn test_subcommand_help() {
    for sub in ["delete", "copy", "token"] {
        let (code, stdout, _) = run(&[sub, "--help"]);
        assert_eq!(code, 0, "vaultutils {sub} --help should exit 0");
        assert!(
            stdout.contains("Usage"),
            "{sub} --help should print usage: {stdout}"
        );
    }
}

#[test]
fn test_delete_requires_path_argument() {
    let (code, _, stderr) = run(&["delete"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("<PATH>"), "stderr: {stderr}");
}

// ── Configuration ────────────────────────────────────────────────────

#[test]
fn test_missing_url_is_reported() {
    let (code, stdout, stderr) = run(&["delete", "secret/app"]);
    assert_eq!(code, 1);
    assert!(stdout.is_empty(), "nothing should reach stdout: {stdout}");
    assert!(stderr.contains("VAULT_ADDR"), "stderr: {stderr}");
}

#[test]
fn test_missing_token_is_reported() {
    let mut cmd = command();
    cmd.args(["delete", "secret/app"])
        .env("VAULT_ADDR", "http://127.0.0.1:19999");
    let (code, _, stderr) = output_of(cmd);
    assert_eq!(code, 1);
    assert!(stderr.contains("VAULT_TOKEN"), "stderr: {stderr}");
}

#[test]
fn test_missing_ca_path_is_reported() {
    let (code, _, stderr) = run(&[
        "--url",
        "http://127.0.0.1:19999",
        "--token",
        "s.test",
        "delete",
        "secret/app",
    ]);
    assert_eq!(code, 1);
    assert!(stderr.contains("VAULT_CAPATH"), "stderr: {stderr}");
}

#[test]
fn test_empty_token_counts_as_missing() {
    let mut cmd = command();
    cmd.args(["delete", "secret/app"])
        .env("VAULT_ADDR", "http://127.0.0.1:19999")
        .env("VAULT_TOKEN", "   ");
    let (code, _, stderr) = output_of(cmd);
    assert_eq!(code, 1);
    assert!(stderr.contains("VAULT_TOKEN"), "stderr: {stderr}");
}

#[test]
fn test_unreadable_ca_file_is_named() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-ca.pem");

    let mut cmd = command();
    cmd.args(["delete", "secret/app"])
        .env("VAULT_ADDR", "http://127.0.0.1:19999")
        .env("VAULT_TOKEN", "s.test")
        .env("VAULT_CAPATH", &missing);
    let (code, _, stderr) = output_of(cmd);
    assert_eq!(code, 1);
    assert!(stderr.contains("no-such-ca.pem"), "stderr: {stderr}");
}

#[test]
fn test_unreachable_server_fails() {
    let dir = tempfile::tempdir().unwrap();
    let ca = write_ca(dir.path());

    let mut cmd = configured("http://127.0.0.1:19999", &ca);
    cmd.args(["delete", "app"]);
    let (code, stdout, stderr) = output_of(cmd);
    assert_eq!(code, 1);
    assert!(!stdout.contains("Removed"), "stdout: {stdout}");
    assert!(
        stderr.contains("error sending request"),
        "stderr should report the transport failure: {stderr}"
    );
    assert_eq!(
        stderr.matches("error sending request").count(),
        1,
        "store failure should be reported once: {stderr}"
    );
}

// ── Against a fake Vault ─────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_prepends_mount_and_exits_zero() {
    let store = MemoryStore::new();
    store.insert("secret/app/db/password", [("value", "1")]).await;
    store.insert("secret/app/token", [("value", "2")]).await;
    store.insert("secret/other", [("value", "3")]).await;
    let addr = spawn_fake_vault(store.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let ca = write_ca(dir.path());

    let mut cmd = configured(&addr, &ca);
    cmd.args(["delete", "app"]);
    let (code, stdout, stderr) = output_of_async(cmd).await;

    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.contains("secret/app"), "stdout: {stdout}");
    assert_eq!(store.paths().await, vec!["secret/other".to_owned()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_with_bad_token_exits_nonzero() {
    let store = MemoryStore::new();
    store.insert("secret/app/token", [("value", "1")]).await;
    let addr = spawn_fake_vault(store.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let ca = write_ca(dir.path());

    let mut cmd = configured(&addr, &ca);
    cmd.args(["delete", "secret/app"]).env("VAULT_TOKEN", "s.wrong");
    let (code, _, stderr) = output_of_async(cmd).await;

    assert_eq!(code, 1);
    assert!(
        stderr.contains("rejected the configured credentials"),
        "stderr: {stderr}"
    );
    assert_eq!(store.paths().await, vec!["secret/app/token".to_owned()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_copy_writes_one_entry_per_key() {
    let store = MemoryStore::new();
    let addr = spawn_fake_vault(store.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let ca = write_ca(dir.path());
    let manifest = json!({
        "kind": "Secret",
        "metadata": { "name": "db-creds" },
        "data": { "username": "YWRtaW4=" },
        "stringData": { "password": "hunter2" },
    });
    std::fs::write(dir.path().join("db-creds.json"), manifest.to_string()).unwrap();

    let mut cmd = configured(&addr, &ca);
    cmd.args(["copy", "db-creds", "secret/app/db"])
        .env("KUBE_SECRET_DIR", dir.path());
    let (code, stdout, stderr) = output_of_async(cmd).await;

    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.contains("db-creds"), "stdout: {stdout}");
    assert_eq!(
        store.read("secret/app/db/username").await.unwrap(),
        Some(SecretData::from([("value".to_owned(), "admin".to_owned())]))
    );
    assert_eq!(
        store.read("secret/app/db/password").await.unwrap(),
        Some(SecretData::from([("value".to_owned(), "hunter2".to_owned())]))
    );
}

// ── Flags from the environment ───────────────────────────────────────

#[test]
fn test_debug_env_enables_debug_logging() {
    let mut cmd = command();
    cmd.args(["delete", "secret/app"]).env("DEBUG", "1");
    let (code, _, stderr) = output_of(cmd);
    assert_eq!(code, 1, "DEBUG=1 should parse; stderr: {stderr}");
    assert!(
        stderr.contains("debug logging started"),
        "stderr: {stderr}"
    );
    assert!(stderr.contains("VAULT_ADDR"), "stderr: {stderr}");
}

#[test]
fn test_debug_logging_is_off_by_default() {
    let (_, _, stderr) = run(&["delete", "secret/app"]);
    assert!(
        !stderr.contains("debug logging started"),
        "stderr: {stderr}"
    );
}

// ── Token verbs ──────────────────────────────────────────────────────

#[test]
fn test_invalid_token_verb_is_rejected_before_connecting() {
    let (code, _, stderr) = run(&["token", "destroy", "secret/app"]);
    assert_eq!(code, 1);
    assert!(
        stderr.contains("'create' or 'revoke'"),
        "stderr: {stderr}"
    );
    assert!(
        !stderr.contains("VAULT_ADDR"),
        "verb should be checked before settings: {stderr}"
    );
}

#[test]
fn test_valid_token_verb_proceeds_to_settings() {
    let (code, _, stderr) = run(&["token", "CREATE", "secret/app"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("VAULT_ADDR"), "stderr: {stderr}");
}

#[test]
fn test_copy_requires_both_arguments() {
    let (code, _, stderr) = run(&["copy", "db-creds"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("VAULT_SECRET_PATH"), "stderr: {stderr}");
}
