//! Blocking client for the dashboard REST backend.
//!
//! Every request carries the bearer token when one is set, decodes JSON
//! responses, and maps non-2xx statuses to [`ApiError::Status`] with the
//! backend's `detail` string. A network-level failure is retried once.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ApiSettings;
use crate::model::{
    AccuracyTrend, CommentFilter, CommentPage, ConnectRequest, ConnectResponse, Connection,
    ConnectionTest, DecisionAck, DecisionRequest, ExecutionStatus, FeedbackExamples,
    FeedbackStats, GeneratePersonaRequest, GeneratedPersona, HubStats, KillSwitchAck,
    KillSwitchRequest, OAuthCallbackRequest, Overview, Persona, PostCommentRequest, PostFilter,
    ReviewPost, ReviewPostList, ReviewQueue, SettingsFile, SettingsFileList, VoiceConfig,
    VoiceTestRequest, VoiceTestResponse,
};
use crate::{Platform, Timeframe};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors returned by the backend client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API error {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

enum Body<'a> {
    Empty,
    Json(serde_json::Value),
    Bytes(&'a [u8]),
}

/// REST client bound to one backend base URL.
#[derive(Clone)]
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings, token: Option<String>) -> Self {
        let timeout = Duration::from_secs(settings.timeout_secs.max(1));
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();
        Self {
            agent,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token.filter(|t| !t.trim().is_empty());
    }

    // --- Dashboard & hubs ---

    pub fn overview(&self, timeframe: Timeframe) -> Result<Overview> {
        self.get_query("/dashboard/overview", &[("timeframe", timeframe.as_str().to_string())])
    }

    pub fn hub_stats(&self, platform: Platform) -> Result<HubStats> {
        self.get(&format!("/hubs/{}/stats", platform.slug()))
    }

    // --- Review queue ---

    pub fn review_queue(&self) -> Result<ReviewQueue> {
        self.get("/review/queue")
    }

    pub fn decide(&self, id: &str, request: &DecisionRequest) -> Result<DecisionAck> {
        self.post(&format!("/review/{}/decide", segment(id)), request)
    }

    pub fn review_posts(&self, filter: PostFilter) -> Result<Vec<ReviewPost>> {
        let list: ReviewPostList =
            self.get_query("/jen/review-posts", &[("status", filter.as_str().to_string())])?;
        Ok(list.posts)
    }

    pub fn save_post_draft(&self, id: &str, comment: &str) -> Result<serde_json::Value> {
        self.put(
            &format!("/jen/review-posts/{}/draft", segment(id)),
            &PostCommentRequest {
                comment: comment.to_string(),
            },
        )
    }

    pub fn approve_post(&self, id: &str, comment: &str) -> Result<serde_json::Value> {
        self.post(
            &format!("/jen/review-posts/{}/approve", segment(id)),
            &PostCommentRequest {
                comment: comment.to_string(),
            },
        )
    }

    pub fn remove_post(&self, id: &str) -> Result<serde_json::Value> {
        self.delete(&format!("/jen/review-posts/{}", segment(id)))
    }

    // --- Personas ---

    pub fn personas(&self) -> Result<Vec<Persona>> {
        self.get("/personas")
    }

    pub fn create_persona(&self, persona: &Persona) -> Result<Persona> {
        self.post("/personas", persona)
    }

    /// Save an existing persona; personas without an id are created instead.
    pub fn update_persona(&self, persona: &Persona) -> Result<Persona> {
        match persona.id.as_deref() {
            Some(id) => self.put(&format!("/personas/{}", segment(id)), persona),
            None => self.create_persona(persona),
        }
    }

    pub fn generate_persona(&self, document_context: &str) -> Result<GeneratedPersona> {
        self.post(
            "/personas/generate",
            &GeneratePersonaRequest {
                document_context: document_context.to_string(),
            },
        )
    }

    // --- Connections ---

    pub fn connections(&self) -> Result<Vec<Connection>> {
        self.get("/connections")
    }

    pub fn connect(&self, platform: Platform, auth_method: &str) -> Result<ConnectResponse> {
        let request = ConnectRequest {
            platform: platform.slug().to_string(),
            auth_method: auth_method.to_string(),
            credentials: Default::default(),
        };
        self.post(&format!("/connections/{}/connect", platform.slug()), &request)
    }

    pub fn disconnect(&self, platform: Platform) -> Result<serde_json::Value> {
        self.post_empty(&format!("/connections/{}/disconnect", platform.slug()))
    }

    pub fn test_connection(&self, platform: Platform) -> Result<ConnectionTest> {
        self.post_empty(&format!("/connections/{}/test", platform.slug()))
    }

    pub fn oauth_callback(
        &self,
        platform: Platform,
        code: &str,
        state: Option<&str>,
    ) -> Result<serde_json::Value> {
        self.post(
            &format!("/connections/{}/callback", platform.slug()),
            &OAuthCallbackRequest {
                code: code.to_string(),
                state: state.map(str::to_string),
            },
        )
    }

    // --- Settings ---

    pub fn voice_config(&self) -> Result<VoiceConfig> {
        self.get("/settings/voice")
    }

    pub fn test_voice(&self, video_context: &str) -> Result<VoiceTestResponse> {
        self.post(
            "/settings/voice/test",
            &VoiceTestRequest {
                video_context: video_context.to_string(),
            },
        )
    }

    pub fn settings_files(&self, section: &str) -> Result<Vec<SettingsFile>> {
        let list: SettingsFileList = self.get(&format!("/settings/{}/files", segment(section)))?;
        Ok(list.into_files())
    }

    /// Upload a document as a raw request body; the name travels as a query param.
    pub fn upload_settings_file(
        &self,
        section: &str,
        filename: &str,
        contents: &[u8],
    ) -> Result<SettingsFile> {
        self.execute(
            "POST",
            &format!("/settings/{}/files", segment(section)),
            &[("filename", filename.to_string())],
            Body::Bytes(contents),
        )
    }

    // --- Comment library ---

    pub fn comments(&self, filter: &CommentFilter) -> Result<CommentPage> {
        self.get_query("/comments", &filter.to_query())
    }

    // --- AI learning ---

    pub fn feedback_stats(&self) -> Result<FeedbackStats> {
        self.get("/feedback/stats")
    }

    pub fn accuracy_trend(&self) -> Result<AccuracyTrend> {
        self.get("/feedback/accuracy-trend")
    }

    pub fn feedback_examples(&self) -> Result<FeedbackExamples> {
        self.get("/feedback/examples")
    }

    // --- Execution ---

    pub fn execution_status(&self) -> Result<ExecutionStatus> {
        self.get("/execution/status")
    }

    pub fn set_kill_switch(&self, active: bool, reason: Option<String>) -> Result<KillSwitchAck> {
        self.post("/execution/kill-switch", &KillSwitchRequest { active, reason })
    }

    // --- Transport ---

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute("GET", path, &[], Body::Empty)
    }

    fn get_query<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        self.execute("GET", path, query, Body::Empty)
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.execute("POST", path, &[], json_body(body)?)
    }

    fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute("POST", path, &[], Body::Json(serde_json::json!({})))
    }

    fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.execute("PUT", path, &[], json_body(body)?)
    }

    fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute("DELETE", path, &[], Body::Empty)
    }

    fn execute<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        query: &[(&str, String)],
        body: Body<'_>,
    ) -> Result<T> {
        let response = match self.send(method, path, query, &body) {
            Err(ApiError::Network(err)) => {
                warn!("{method} {path} failed ({err}); retrying once");
                self.send(method, path, query, &body)?
            }
            other => other?,
        };
        let text = response
            .into_string()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        decode_body(&text)
    }

    fn send(
        &self,
        method: &str,
        path: &str,
        query: &[(&str, String)],
        body: &Body<'_>,
    ) -> Result<ureq::Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{method} {url}");
        let mut request = self
            .agent
            .request(method, &url)
            .set("Accept", "application/json");
        for (key, value) in query {
            request = request.query(key, value);
        }
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {}", token.trim()));
        }

        let result = match body {
            Body::Empty => request.call(),
            Body::Json(value) => request.send_json(value),
            Body::Bytes(bytes) => request
                .set("Content-Type", "application/octet-stream")
                .send_bytes(bytes),
        };

        match result {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(ApiError::Status {
                    status,
                    detail: extract_detail(status, &body),
                })
            }
            Err(ureq::Error::Transport(err)) => Err(ApiError::Network(err.to_string())),
        }
    }
}

fn json_body<B: Serialize>(body: &B) -> Result<Body<'static>> {
    serde_json::to_value(body)
        .map(Body::Json)
        .map_err(|err| ApiError::Decode(format!("could not encode request: {err}")))
}

/// Percent-encode a value used as a single path segment.
fn segment(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Decode a JSON body; an empty body decodes as `null`.
fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T> {
    let trimmed = text.trim();
    let source = if trimmed.is_empty() { "null" } else { trimmed };
    serde_json::from_str(source).map_err(|err| ApiError::Decode(err.to_string()))
}

/// Pull the backend's `detail` message out of an error body.
///
/// FastAPI sends `{"detail": "..."}` or, for validation errors, a list of
/// `{"msg": ...}` objects. Anything else falls back to the raw body.
fn extract_detail(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        match value.get("detail") {
            Some(serde_json::Value::String(detail)) => return detail.clone(),
            Some(serde_json::Value::Array(entries)) => {
                let messages: Vec<&str> = entries
                    .iter()
                    .filter_map(|entry| entry.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if !messages.is_empty() {
                    return messages.join("; ");
                }
            }
            _ => {}
        }
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed.to_string()
    }
}
