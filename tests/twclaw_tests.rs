mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use support::{MockServer, Reply};

fn twclaw(server: &MockServer) -> Command {
    let mut cmd = Command::cargo_bin("twclaw").unwrap();
    cmd.env("TWITTER_BEARER_TOKEN", "test-bearer")
        .env("TWITTER_API_BASE", &server.base_url)
        .env_remove("RUST_LOG");
    cmd
}

fn search_body() -> Value {
    json!({
        "data": [
            {"id": "1001", "text": "rent is due again", "author_id": "u1",
             "created_at": "2026-10-01T12:00:00.000Z",
             "public_metrics": {"like_count": 5, "retweet_count": 1, "reply_count": 2,
                                "quote_count": 0, "bookmark_count": 1, "impression_count": 300}},
            {"id": "1002", "text": "how do index funds work", "author_id": "u2",
             "public_metrics": {"like_count": 9}},
            {"id": "1003", "text": "third", "author_id": "u1"}
        ],
        "includes": {"users": [
            {"id": "u1", "username": "broke_student", "name": "Sam", "verified": false,
             "public_metrics": {"followers_count": 120}},
            {"id": "u2", "username": "curious_saver", "name": "Alex", "verified": true,
             "public_metrics": {"followers_count": 5400}}
        ]}
    })
}

#[test]
fn missing_token_exits_with_error() {
    let server = MockServer::start(|_| Reply::ok(json!({})));
    twclaw(&server)
        .env_remove("TWITTER_BEARER_TOKEN")
        .args(["search", "budget"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "TWITTER_BEARER_TOKEN environment variable not set",
        ));
    assert!(server.requests().is_empty());
}

#[test]
fn search_json_has_documented_fields() {
    let server = MockServer::start(|_| Reply::ok(search_body()));
    let output = twclaw(&server)
        .args(["search", "budget tips", "-n", "2", "--json", "--recent"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let results: Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 2);

    let first = results[0].as_object().unwrap();
    for field in [
        "id",
        "text",
        "author_username",
        "author_name",
        "author_verified",
        "author_followers",
        "likes",
        "retweets",
        "replies",
        "quotes",
        "bookmarks",
        "impressions",
        "created_at",
        "url",
    ] {
        assert!(first.contains_key(field), "missing {field}");
    }
    assert_eq!(first["author_username"], "broke_student");
    assert_eq!(first["url"], "https://twitter.com/broke_student/status/1001");
    assert_eq!(results[1]["author_followers"], 5400);

    let request = &server.requests()[0];
    assert_eq!(request.path(), "/tweets/search/recent");
    assert_eq!(request.header("Authorization"), Some("Bearer test-bearer"));
    assert!(request.query().contains("max_results=10"));
    assert!(request.query().contains("sort_order=recency"));
}

#[test]
fn search_text_prints_one_block_per_result() {
    let server = MockServer::start(|_| Reply::ok(search_body()));
    let output = twclaw(&server)
        .args(["search", "budget"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.matches("🔗 https://twitter.com/").count(), 3);
    assert!(stdout.contains("Sam (@broke_student)"));
    assert!(stdout.contains("Alex (@curious_saver)"));
}

#[test]
fn read_accepts_status_urls() {
    let server = MockServer::start(|_| {
        Reply::ok(json!({
            "data": {"id": "1001", "text": "rent is due again", "author_id": "u1",
                     "public_metrics": {"bookmark_count": 4}},
            "includes": {"users": [{"id": "u1", "username": "broke_student", "name": "Sam"}]}
        }))
    });
    twclaw(&server)
        .args(["read", "https://x.com/broke_student/status/1001?s=20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("💾 4"));
    assert_eq!(server.requests()[0].path(), "/tweets/1001");
}

#[test]
fn upstream_failure_exits_one_with_body() {
    let server = MockServer::start(|_| {
        Reply::json(429, json!({"title": "Too Many Requests", "status": 429}))
    });
    twclaw(&server)
        .args(["search", "budget", "--json"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Too Many Requests"));
}

#[test]
fn failed_post_prints_write_scope_hint() {
    let server = MockServer::start(|_| {
        Reply::json(403, json!({"detail": "Unsupported Authentication"}))
    });
    twclaw(&server)
        .args(["reply", "1001", "felt that"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unsupported Authentication"))
        .stderr(predicate::str::contains(
            "Posting requires OAuth 2.0 with write scope",
        ));

    let request = &server.requests()[0];
    assert_eq!(request.method, "POST");
    assert_eq!(
        request.json(),
        json!({"text": "felt that", "reply": {"in_reply_to_tweet_id": "1001"}})
    );
}

#[test]
fn tweet_json_returns_posted_record() {
    let server = MockServer::start(|_| Reply::json(201, json!({"data": {"id": "2002", "text": "gm"}})));
    let output = twclaw(&server).args(["tweet", "gm", "--json"]).output().unwrap();
    assert!(output.status.success());
    let posted: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        posted,
        json!({"id": "2002", "text": "gm", "url": "https://twitter.com/i/status/2002"})
    );
}

#[test]
fn auth_check_reports_username() {
    let server = MockServer::start(|_| Reply::ok(json!({"data": {"id": "u1", "username": "cashkitty"}})));
    twclaw(&server)
        .arg("auth-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Authenticated as: @cashkitty"));
    assert_eq!(server.requests()[0].path(), "/users/me");
}

#[test]
fn auth_check_failure_exits_one() {
    let server = MockServer::start(|_| Reply::json(401, json!({"title": "Unauthorized"})));
    twclaw(&server)
        .arg("auth-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Authentication failed"));
}

#[test]
fn zero_count_is_rejected_before_any_request() {
    let server = MockServer::start(|_| Reply::ok(search_body()));
    twclaw(&server)
        .args(["search", "budget", "-n", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("0"));
    assert!(server.requests().is_empty());
}
