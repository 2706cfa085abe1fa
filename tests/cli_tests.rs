mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use support::{MockServer, Reply};
use tempfile::TempDir;

fn social_agent(home: &TempDir, server: &MockServer) -> Command {
    let mut cmd = Command::cargo_bin("social-agent").unwrap();
    cmd.env("SOCIAL_AGENT_HOME", home.path())
        .env_remove("SOCIAL_AGENT_API_BASE")
        .env_remove("RUST_LOG")
        .args(["--api-base", &server.base_url]);
    cmd
}

fn queue_backend() -> MockServer {
    MockServer::start(|req| match (req.method.as_str(), req.path()) {
        ("GET", "/review/queue") => Reply::ok(json!({
            "items": [
                {"id": 11, "proposed_text": "pay yourself first", "risk_score": 20},
                {"id": 12, "proposed_text": "not advice", "risk_score": 80}
            ],
            "pending_count": 2,
            "avg_wait_min": 3.0,
            "sla_breaches": 1
        })),
        ("GET", "/dashboard/overview") => Reply::ok(json!({"total_engagements": 1200, "platform_summaries": []})),
        ("POST", "/review/11/decide") => Reply::ok(json!({"status": "ok"})),
        _ => Reply::json(404, json!({"detail": "Not Found"})),
    })
}

#[test]
fn queue_json_lists_items() {
    let home = tempfile::tempdir().unwrap();
    let server = queue_backend();
    let output = social_agent(&home, &server)
        .args(["queue", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let items: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(items.as_array().map(Vec::len), Some(2));
    assert_eq!(items[0]["id"], "11");
}

#[test]
fn status_prints_queue_summary() {
    let home = tempfile::tempdir().unwrap();
    let server = queue_backend();
    social_agent(&home, &server)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending:      2"))
        .stdout(predicate::str::contains("SLA breaches: 1"));
}

#[test]
fn login_token_is_used_for_later_calls() {
    let home = tempfile::tempdir().unwrap();
    let server = queue_backend();
    social_agent(&home, &server)
        .args(["login", "operator-token"])
        .assert()
        .success();
    social_agent(&home, &server)
        .args(["approve", "11", "--text", "start small"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Approved 11"));

    let decide = &server.calls("POST", "/review/11/decide")[0];
    assert_eq!(decide.header("Authorization"), Some("Bearer operator-token"));
    assert_eq!(
        decide.json(),
        json!({"decision": "approve", "edited_text": "start small"})
    );

    social_agent(&home, &server)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Token removed"));
}

#[test]
fn backend_error_exits_one() {
    let home = tempfile::tempdir().unwrap();
    let server = queue_backend();
    social_agent(&home, &server)
        .args(["reject", "99", "--reason", "off brand"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("API error 404: Not Found"));
}
