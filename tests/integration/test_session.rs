#[path = "common.rs"]
mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::{find_method, Reply, Script, StubServer};
use predicates::prelude::*;
use serde_json::json;
use std::path::Path;
use std::process;
use std::time::Duration;

/// Run the binary against `port` with fast timings and a fixed workspace root.
fn session_cmd(port: u16, root: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("lsp-probe");
    cmd.arg("--port")
        .arg(port.to_string())
        .arg("--root")
        .arg(root)
        .arg("--settle-ms")
        .arg("0")
        .arg("--poll-ms")
        .arg("50")
        .env("NO_COLOR", "1")
        .env_remove("FORCE_COLOR")
        .env_remove("LSP_PROBE_LOG")
        .timeout(Duration::from_secs(60));
    cmd
}

#[test]
fn test_full_sequence_succeeds() {
    let root = tempfile::tempdir().expect("tempdir");
    let stub = StubServer::start(Script::happy());

    let output = session_cmd(stub.port, root.path()).output().expect("failed to run lsp-probe");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "command failed: {stdout}\n{stderr}");

    assert!(stdout.contains(r#"initialize result: {"capabilities":{"hoverProvider":true}}"#));
    assert!(stdout.contains("handshake result:"));
    assert!(stdout.contains("session-1"));
    assert!(stdout.contains("didChange result: null"));
    assert_eq!(stdout.matches("waitReq Done...").count(), 1, "{stdout}");
    assert!(stdout.trim_end().ends_with("cancel done, exiting"), "{stdout}");

    // Steps must appear in order.
    let init = stdout.find("initialize result:").unwrap();
    let handshake = stdout.find("handshake result:").unwrap();
    let change = stdout.find("didChange result:").unwrap();
    assert!(init < handshake && handshake < change);

    stub.received();
}

#[test]
fn test_wire_payloads() {
    let root = tempfile::tempdir().expect("tempdir");
    let stub = StubServer::start(Script::happy());

    session_cmd(stub.port, root.path()).assert().success();
    let received = stub.received();

    let methods: Vec<&str> = received.iter().filter_map(|m| m["method"].as_str()).collect();
    assert_eq!(methods, ["initialize", "gopls/handshake", "textDocument/didChange"]);

    let init = find_method(&received, "initialize").unwrap();
    assert_eq!(init["jsonrpc"], "2.0");
    assert_eq!(init["params"]["rootPath"], &*root.path().to_string_lossy());
    let root_uri = init["params"]["rootUri"].as_str().unwrap();
    assert!(root_uri.starts_with("file://"), "{root_uri}");

    let handshake = find_method(&received, "gopls/handshake").unwrap();
    assert_eq!(handshake["params"], json!({}));

    let change = find_method(&received, "textDocument/didChange").unwrap();
    assert!(change.get("id").is_some(), "didChange is issued as a call");
    assert_eq!(change["params"]["textDocument"]["version"], 2);
    assert_eq!(change["params"]["textDocument"]["uri"], "dammyURI");
    assert_eq!(change["params"]["contentChanges"], json!([]));
}

#[test]
fn test_handshake_error_exits_with_status_1() {
    let root = tempfile::tempdir().expect("tempdir");
    let script = Script::happy().reply(
        "gopls/handshake",
        Reply::Error { code: -32000, message: "handshake refused" },
    );
    let stub = StubServer::start(script);

    session_cmd(stub.port, root.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("initialize result:"))
        .stdout(predicate::str::contains("handshake result:").not())
        .stderr(predicate::str::contains("gopls/handshake"))
        .stderr(predicate::str::contains("handshake refused"));

    let received = stub.received();
    assert!(find_method(&received, "textDocument/didChange").is_none());
}

#[test]
fn test_null_handshake_result_continues_to_did_change() {
    let root = tempfile::tempdir().expect("tempdir");
    let script = Script::happy().reply("gopls/handshake", Reply::Result(serde_json::Value::Null));
    let stub = StubServer::start(script);

    session_cmd(stub.port, root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"handshake result: {"sessionID":null"#))
        .stdout(predicate::str::contains("didChange result: null"))
        .stdout(predicate::str::contains("cancel done, exiting"));

    let received = stub.received();
    assert!(find_method(&received, "textDocument/didChange").is_some());
}

#[test]
fn test_did_change_error_exits_with_status_1() {
    let root = tempfile::tempdir().expect("tempdir");
    let script = Script::happy().reply(
        "textDocument/didChange",
        Reply::Error { code: -32602, message: "no such document" },
    );
    let stub = StubServer::start(script);

    session_cmd(stub.port, root.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("handshake result:"))
        .stdout(predicate::str::contains("didChange result:").not())
        .stderr(predicate::str::contains("textDocument/didChange"))
        .stderr(predicate::str::contains("no such document"));

    stub.received();
}

#[test]
fn test_initialize_error_exits_with_status_1() {
    let root = tempfile::tempdir().expect("tempdir");
    let script =
        Script::happy().reply("initialize", Reply::Error { code: -32002, message: "not ready" });
    let stub = StubServer::start(script);

    session_cmd(stub.port, root.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("initialize result:").not())
        .stderr(predicate::str::contains("initialize"))
        .stderr(predicate::str::contains("not ready"));

    stub.received();
}

#[test]
fn test_inbound_highlight_notification_is_printed_without_error() {
    let root = tempfile::tempdir().expect("tempdir");
    let highlight = json!({
        "jsonrpc": "2.0",
        "method": "textDocument/documentHighlight",
        "params": {
            "uri": "file:///tmp/main.go",
            "diagnostics": [{
                "range": {
                    "start": {"line": 2, "character": 1},
                    "end": {"line": 2, "character": 8}
                },
                "severity": 1,
                "message": "undeclared name: fmt"
            }]
        }
    });
    let server_request = json!({
        "jsonrpc": "2.0",
        "id": "srv-1",
        "method": "workspace/configuration",
        "params": {"items": []}
    });
    let script = Script::happy()
        .push_before("gopls/handshake", highlight)
        .push_before("textDocument/didChange", server_request);
    let stub = StubServer::start(script);

    let output = session_cmd(stub.port, root.path()).output().expect("failed to run lsp-probe");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "command failed: {stdout}\n{stderr}");

    assert!(stdout.contains("inbound notification:"), "{stdout}");
    assert!(stdout.contains("textDocument/documentHighlight"));
    assert!(stdout.contains("undeclared name: fmt"));
    assert!(stdout.contains("inbound request:"), "{stdout}");
    assert!(stdout.contains("workspace/configuration"));
    assert!(stderr.is_empty(), "unexpected stderr: {stderr}");

    // The server's request is never answered.
    let received = stub.received();
    assert!(received.iter().all(|m| m.get("id") != Some(&json!("srv-1"))));
}

#[test]
fn test_malformed_highlight_body_is_swallowed() {
    let root = tempfile::tempdir().expect("tempdir");
    let broken = json!({
        "jsonrpc": "2.0",
        "method": "textDocument/documentHighlight",
        "params": {"uri": 7, "diagnostics": "nope"}
    });
    let stub = StubServer::start(Script::happy().push_before("initialize", broken));

    session_cmd(stub.port, root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("inbound notification:"))
        .stdout(predicate::str::contains("cancel done, exiting"))
        .stderr(predicate::str::is_empty());

    stub.received();
}

#[test]
fn test_malformed_highlight_body_logs_nothing_when_verbose() {
    let root = tempfile::tempdir().expect("tempdir");
    let broken = json!({
        "jsonrpc": "2.0",
        "method": "textDocument/documentHighlight",
        "params": {"uri": 7, "diagnostics": "nope"}
    });
    let stub = StubServer::start(Script::happy().push_before("initialize", broken));

    session_cmd(stub.port, root.path())
        .arg("--verbose")
        .assert()
        .success()
        .stderr(predicate::str::contains("Inbound LSP message: textDocument/documentHighlight"))
        .stderr(predicate::str::contains("Decoded").not())
        .stderr(predicate::str::contains("invalid type").not());

    stub.received();
}

#[test]
fn test_connection_refused_exits_with_status_1() {
    let root = tempfile::tempdir().expect("tempdir");
    let port = common::closed_port();

    session_cmd(port, root.path())
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(format!("connecting to 127.0.0.1:{port}")));
}

#[test]
fn test_silent_server_times_out_when_timeout_set() {
    let root = tempfile::tempdir().expect("tempdir");
    let stub = StubServer::start(Script::happy().reply("initialize", Reply::Silent));

    session_cmd(stub.port, root.path())
        .arg("--timeout")
        .arg("1")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("initialize"))
        .stderr(predicate::str::contains("no response within"));

    stub.received();
}

/// Without `--timeout` a server that never answers `initialize` stalls the
/// session indefinitely.
#[test]
fn test_silent_server_hangs_without_timeout() {
    let root = tempfile::tempdir().expect("tempdir");
    let stub = StubServer::start(Script::happy().reply("initialize", Reply::Silent));

    let bin_path = assert_cmd::cargo::cargo_bin!("lsp-probe");
    let mut child = process::Command::new(bin_path)
        .arg("--port")
        .arg(stub.port.to_string())
        .arg("--root")
        .arg(root.path())
        .arg("--settle-ms")
        .arg("0")
        .stdout(process::Stdio::null())
        .stderr(process::Stdio::null())
        .spawn()
        .expect("failed to spawn lsp-probe");

    std::thread::sleep(Duration::from_secs(2));
    let still_running = child.try_wait().expect("try_wait").is_none();

    let _ = child.kill();
    let _ = child.wait();
    stub.received();

    assert!(still_running, "lsp-probe exited although initialize was never answered");
}
