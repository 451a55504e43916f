//! CLI arg handling tests for observatory (viewer)
use std::process::Command;

#[test]
fn help_mentions_once_flag_and_default_url() {
    let output = Command::new(env!("CARGO_BIN_EXE_observatory"))
        .arg("--help")
        .output()
        .expect("run observatory --help");
    assert!(output.status.success());
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(
        text.contains("Usage:") && text.contains("--once") && text.contains("ws://127.0.0.1:8000/ws"),
        "help text missing expected content\n{text}"
    );
}

#[test]
fn rejects_non_websocket_url() {
    let output = Command::new(env!("CARGO_BIN_EXE_observatory"))
        .args(["--once", "http://127.0.0.1:1/"])
        .output()
        .expect("run observatory");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unsupported scheme"));
}

#[test]
fn once_fails_cleanly_without_an_agent() {
    // Port 1 on loopback is essentially never listening.
    let output = Command::new(env!("CARGO_BIN_EXE_observatory"))
        .args(["--once", "ws://127.0.0.1:1/ws"])
        .output()
        .expect("run observatory");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("connecting to"));
}
