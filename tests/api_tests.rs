mod support;

use serde_json::json;
use social_agent::api::ApiError;
use social_agent::model::{CommentFilter, DecisionRequest, PostFilter};
use social_agent::{Platform, Timeframe};
use support::{MockServer, Reply};

#[test]
fn bearer_token_is_sent_when_stored() {
    let server = MockServer::start(|_| Reply::ok(json!({"items": []})));
    server
        .client_with_token(Some("tok-123"))
        .review_queue()
        .unwrap();
    server.client().review_queue().unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].header("Authorization"), Some("Bearer tok-123"));
    assert_eq!(requests[1].header("Authorization"), None);
}

#[test]
fn non_2xx_carries_status_and_detail() {
    let server = MockServer::start(|_| Reply::json(409, json!({"detail": "Already reviewed"})));
    let err = server
        .client()
        .decide("7", &DecisionRequest::approve())
        .unwrap_err();
    match &err {
        ApiError::Status { status, detail } => {
            assert_eq!(*status, 409);
            assert_eq!(detail, "Already reviewed");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert_eq!(err.to_string(), "API error 409: Already reviewed");
    assert_eq!(server.calls("POST", "/review/7/decide").len(), 1);
}

#[test]
fn status_errors_are_not_retried() {
    let server = MockServer::start(|_| Reply::json(500, json!({"detail": "boom"})));
    let err = server.client().feedback_stats().unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn dropped_connection_is_retried_once() {
    let server = MockServer::start_flaky(1, |_| {
        Reply::ok(json!({"total_engagements": 12, "platform_summaries": null}))
    });
    let overview = server.client().overview(Timeframe::Week).unwrap();
    assert_eq!(overview.total_engagements, 12);
    assert!(overview.platform_summaries.is_empty());

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path(), "/dashboard/overview");
    assert_eq!(requests[0].query(), "timeframe=7d");
}

#[test]
fn second_network_failure_surfaces() {
    let server = MockServer::start_flaky(2, |_| Reply::ok(json!({})));
    let err = server.client().execution_status().unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
}

#[test]
fn malformed_json_is_a_decode_error() {
    let server = MockServer::start(|_| Reply {
        status: 200,
        body: "<html>gateway</html>".to_string(),
    });
    let err = server.client().personas().unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
}

#[test]
fn comment_filter_travels_as_query() {
    let server = MockServer::start(|_| {
        Reply::ok(json!({"items": [{"id": 1, "text": "DM us"}], "total": 1, "page": 2, "limit": 20}))
    });
    let filter = CommentFilter {
        category: Some("Support".to_string()),
        search: None,
        page: 2,
        limit: 20,
    };
    let page = server.client().comments(&filter).unwrap();
    assert_eq!(page.items.len(), 1);

    let request = &server.requests()[0];
    assert_eq!(request.path(), "/comments");
    assert!(request.query().contains("category=Support"));
    assert!(request.query().contains("page=2"));
    assert!(!request.query().contains("search"));
}

#[test]
fn review_posts_filter_and_envelope() {
    let server = MockServer::start(|_| {
        Reply::ok(json!({"posts": [
            {"id": 5, "author": "broke_student", "text": "rent is due", "status": "pending"},
            {"id": "6", "author": "saver", "text": "401k?", "status": "draft", "draft_comment": "start small"}
        ]}))
    });
    let posts = server.client().review_posts(PostFilter::All).unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, "5");
    assert_eq!(posts[1].draft_comment.as_deref(), Some("start small"));
    assert_eq!(server.requests()[0].query(), "status=all");
}

#[test]
fn connect_posts_method_and_returns_auth_url() {
    let server = MockServer::start(|_| {
        Reply::ok(json!({"status": "pending", "auth_url": "https://x.com/i/oauth2/authorize?x=1"}))
    });
    let response = server.client().connect(Platform::X, "oauth").unwrap();
    assert_eq!(
        response.auth_url.as_deref(),
        Some("https://x.com/i/oauth2/authorize?x=1")
    );

    let request = &server.calls("POST", "/connections/x/connect")[0];
    assert_eq!(request.json()["auth_method"], "oauth");
    assert_eq!(request.json()["platform"], "x");
}

#[test]
fn upload_sends_raw_bytes_with_filename() {
    let server = MockServer::start(|_| Reply::ok(json!({"id": 3, "filename": "guide.md", "size": 5})));
    let file = server
        .client()
        .upload_settings_file("knowledge", "guide.md", b"hello")
        .unwrap();
    assert_eq!(file.id, "3");

    let request = &server.requests()[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path(), "/settings/knowledge/files");
    assert_eq!(request.query(), "filename=guide.md");
    assert_eq!(request.header("Content-Type"), Some("application/octet-stream"));
    assert_eq!(request.body, "hello");
}

#[test]
fn kill_switch_body_omits_missing_reason() {
    let server = MockServer::start(|_| {
        Reply::ok(json!({"status": "ok", "kill_switch": {"active": false}}))
    });
    let ack = server.client().set_kill_switch(false, None).unwrap();
    assert!(!ack.kill_switch.active);
    assert_eq!(
        server.calls("POST", "/execution/kill-switch")[0].json(),
        json!({"active": false})
    );
}
