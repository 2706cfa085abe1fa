//! Wire types for the dashboard backend.
//!
//! Everything here is owned by the backend; the client only holds transient
//! copies. Decoding is lenient: missing fields fall back to defaults and ids
//! may arrive as JSON numbers or strings.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Risk score at or below which the backend auto-approves.
pub const AUTO_APPROVE_MAX: u32 = 30;
/// Risk score at or below which an item still goes to human review.
pub const REVIEW_MAX: u32 = 65;

/// Snippet categories offered by the comment library filter.
pub const SNIPPET_CATEGORIES: [&str; 5] = ["Support", "Education", "Engagement", "Lead Gen", "Crisis"];

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Int(i64),
    Float(f64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Str(s) => s,
            RawId::Int(n) => n.to_string(),
            RawId::Float(f) => f.to_string(),
        }
    }
}

fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

fn de_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Render a free-form JSON value for display (strings unquoted, null as `-`).
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

// --- Overview ---

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PlatformSummary {
    pub platform: String,
    #[serde(default)]
    pub comments_posted: u64,
    #[serde(default)]
    pub avg_likes: f64,
    #[serde(default)]
    pub sentiment_score: f64,
    #[serde(default = "default_trending")]
    pub trending_status: String,
}

fn default_trending() -> String {
    "green".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Overview {
    #[serde(default)]
    pub total_engagements: u64,
    #[serde(default)]
    pub avg_engagement_rate: f64,
    #[serde(default)]
    pub approval_rate: f64,
    #[serde(default)]
    pub active_platforms: u32,
    #[serde(default, deserialize_with = "de_null_default")]
    pub platform_summaries: Vec<PlatformSummary>,
}

// --- Hubs ---

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct KeywordMatch {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub action: String,
    #[serde(default, rename = "match")]
    pub matched: String,
    #[serde(default)]
    pub volume: Value,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Reel {
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub likes: Value,
    #[serde(default, deserialize_with = "de_null_default")]
    pub hashtags: Vec<String>,
}

/// Pending draft reply shown on a hub; the id is a review-queue id.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct HubDraft {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub draft: String,
    #[serde(default)]
    pub risk_score: u32,
    #[serde(default)]
    pub tweet_url: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FeedEntry {
    #[serde(default)]
    pub user: String,
    #[serde(default, alias = "matchedRule", alias = "type")]
    pub label: String,
    #[serde(default, alias = "msg")]
    pub post: String,
    #[serde(default)]
    pub reply: String,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct HubStats {
    #[serde(default, deserialize_with = "de_null_default")]
    pub stats: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub keywords: Vec<KeywordMatch>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub reels: Vec<Reel>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub drafts: Vec<HubDraft>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub feed: Vec<FeedEntry>,
}

// --- Review queue ---

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct VideoContext {
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ReviewItem {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub comment_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub video_id: Option<String>,
    #[serde(default)]
    pub proposed_text: String,
    #[serde(default)]
    pub risk_score: u32,
    #[serde(default)]
    pub risk_reasoning: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub queued_at: Option<String>,
    #[serde(default)]
    pub video_context: Option<VideoContext>,
}

impl ReviewItem {
    pub fn risk_label(&self) -> &'static str {
        risk_label(self.risk_score)
    }

    /// Text of the post the draft replies to, used as drafting context.
    pub fn post_context(&self) -> String {
        self.video_context
            .as_ref()
            .and_then(|ctx| ctx.description.clone())
            .unwrap_or_default()
    }

    pub fn author(&self) -> &str {
        self.video_context
            .as_ref()
            .and_then(|ctx| ctx.creator.as_deref())
            .unwrap_or("unknown")
    }
}

pub fn risk_label(score: u32) -> &'static str {
    if score <= AUTO_APPROVE_MAX {
        "Low Risk"
    } else if score <= REVIEW_MAX {
        "Medium Risk"
    } else {
        "High Risk"
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ReviewQueue {
    #[serde(default, deserialize_with = "de_null_default")]
    pub items: Vec<ReviewItem>,
    #[serde(default)]
    pub pending_count: Option<usize>,
    #[serde(default)]
    pub avg_wait_min: f64,
    #[serde(default)]
    pub sla_breaches: usize,
}

impl ReviewQueue {
    /// Badge count: the backend's `pending_count`, else the number of items.
    pub fn pending(&self) -> usize {
        self.pending_count.unwrap_or(self.items.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRequest {
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_text: Option<String>,
}

impl DecisionRequest {
    pub fn approve() -> Self {
        Self {
            decision: Decision::Approve,
            reason: None,
            edited_text: None,
        }
    }

    pub fn approve_edited(text: impl Into<String>) -> Self {
        Self {
            decision: Decision::Approve,
            reason: None,
            edited_text: Some(text.into()),
        }
    }

    pub fn reject(reason: Option<String>) -> Self {
        Self {
            decision: Decision::Reject,
            reason,
            edited_text: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DecisionAck {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub decision: Option<String>,
}

// --- Review posts ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Pending,
    Draft,
    Approved,
    /// Posting to the platform failed after approval.
    Failed,
    #[serde(other)]
    Unknown,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Pending => "pending",
            PostStatus::Draft => "draft",
            PostStatus::Approved => "approved",
            PostStatus::Failed => "failed",
            PostStatus::Unknown => "unknown",
        }
    }
}

/// Status filter for the review-posts panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostFilter {
    All,
    #[default]
    Pending,
    Draft,
    Approved,
}

impl PostFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            PostFilter::All => "all",
            PostFilter::Pending => "pending",
            PostFilter::Draft => "draft",
            PostFilter::Approved => "approved",
        }
    }

    pub fn next(self) -> Self {
        match self {
            PostFilter::All => PostFilter::Pending,
            PostFilter::Pending => PostFilter::Draft,
            PostFilter::Draft => PostFilter::Approved,
            PostFilter::Approved => PostFilter::All,
        }
    }

    pub fn matches(self, status: PostStatus) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::Pending => status == PostStatus::Pending,
            PostFilter::Draft => status == PostStatus::Draft,
            PostFilter::Approved => status == PostStatus::Approved,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ReviewPost {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub post_id: Option<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub retweets: u64,
    #[serde(default)]
    pub replies: u64,
    #[serde(default)]
    pub quotes: Option<u64>,
    #[serde(default)]
    pub bookmarks: Option<u64>,
    #[serde(default)]
    pub impressions: Option<u64>,
    #[serde(default)]
    pub relevance_score: f64,
    #[serde(default)]
    pub engagement_potential: f64,
    #[serde(default)]
    pub persona_recommendation: String,
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub angle_summary: String,
    #[serde(default)]
    pub recommendation_score: f64,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub draft_comment: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ReviewPostList {
    #[serde(default, deserialize_with = "de_null_default")]
    pub posts: Vec<ReviewPost>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostCommentRequest {
    pub comment: String,
}

// --- Personas ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    #[serde(
        default,
        deserialize_with = "de_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub core_identity: String,
    #[serde(default)]
    pub tone_modifiers: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub rules: Vec<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_temperature() -> f64 {
    0.7
}

impl Persona {
    /// Persona seeded from a generation call; not yet saved.
    pub fn from_generated(name: impl Into<String>, generated: GeneratedPersona) -> Self {
        Self {
            id: None,
            name: name.into(),
            kind: "Generated".to_string(),
            active: false,
            core_identity: generated.core_identity,
            tone_modifiers: generated.tone_modifiers,
            rules: Vec::new(),
            temperature: default_temperature(),
        }
    }

    /// Shift temperature by `delta`, clamped to [0, 1] and rounded to 0.1.
    pub fn adjust_temperature(&mut self, delta: f64) {
        let next = (self.temperature + delta).clamp(0.0, 1.0);
        self.temperature = (next * 10.0).round() / 10.0;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPersona {
    #[serde(default)]
    pub core_identity: String,
    #[serde(default)]
    pub tone_modifiers: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratePersonaRequest {
    pub document_context: String,
}

// --- Connections ---

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Connection {
    pub platform: String,
    #[serde(default = "default_connection_status")]
    pub status: String,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub auth_method: Option<String>,
    #[serde(default)]
    pub account_info: Option<Value>,
    #[serde(default)]
    pub session_health: Option<String>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub workers_status: BTreeMap<String, Value>,
    #[serde(default)]
    pub connected_at: Option<String>,
}

fn default_connection_status() -> String {
    "disconnected".to_string()
}

impl Connection {
    pub fn worker_count(&self) -> usize {
        self.workers_status.len()
    }

    pub fn token_status(&self) -> &str {
        self.session_health.as_deref().unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectRequest {
    pub platform: String,
    pub auth_method: String,
    pub credentials: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ConnectResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "authorization_url")]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OAuthCallbackRequest {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ConnectionTest {
    #[serde(default)]
    pub healthy: bool,
    #[serde(default)]
    pub details: Option<String>,
}

// --- Settings ---

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct VoiceConfig {
    #[serde(default)]
    pub voice_guide_md: Option<String>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub positive_examples: Vec<Value>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub negative_examples: Vec<Value>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub platform_adapters: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceTestRequest {
    pub video_context: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct VoiceTestCandidate {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub approach: String,
    #[serde(default)]
    pub char_count: usize,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct VoiceTestResponse {
    #[serde(default, alias = "results", deserialize_with = "de_null_default")]
    pub candidates: Vec<VoiceTestCandidate>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SettingsFile {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, alias = "name")]
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

/// The files endpoint answers with a bare array or `{ "files": [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SettingsFileList {
    Bare(Vec<SettingsFile>),
    Wrapped {
        #[serde(default)]
        files: Vec<SettingsFile>,
    },
}

impl SettingsFileList {
    pub fn into_files(self) -> Vec<SettingsFile> {
        match self {
            SettingsFileList::Bare(files) | SettingsFileList::Wrapped { files } => files,
        }
    }
}

// --- Comment library ---

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CommentSnippet {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, alias = "comment_text")]
    pub text: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub uses: u64,
    #[serde(default, alias = "avgLikes", alias = "likes")]
    pub avg_likes: f64,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CommentPage {
    #[serde(default, deserialize_with = "de_null_default")]
    pub items: Vec<CommentSnippet>,
    #[serde(default)]
    pub total: usize,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

impl CommentPage {
    pub fn page_count(&self) -> u32 {
        if self.limit == 0 {
            return 1;
        }
        (self.total as u32).div_ceil(self.limit).max(1)
    }
}

/// Query for `GET /comments`.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl Default for CommentFilter {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl CommentFilter {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(category) = &self.category {
            query.push(("category", category.clone()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            query.push(("search", search.to_string()));
        }
        query.push(("page", self.page.to_string()));
        query.push(("limit", self.limit.to_string()));
        query
    }
}

// --- AI learning ---

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FeedbackStats {
    #[serde(default)]
    pub total_decisions: u64,
    #[serde(default)]
    pub approved_count: u64,
    #[serde(default)]
    pub denied_count: u64,
    #[serde(default)]
    pub approval_rate: f64,
    #[serde(default)]
    pub recent_approval_rate: f64,
    #[serde(default)]
    pub improvement: f64,
    #[serde(default)]
    pub active_approved_examples: u64,
    #[serde(default)]
    pub active_denied_examples: u64,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TrendPoint {
    pub date: String,
    #[serde(default)]
    pub approval_rate: f64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub approved: u64,
    #[serde(default)]
    pub denied: u64,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AccuracyTrend {
    #[serde(default, deserialize_with = "de_null_default")]
    pub trend: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FeedbackExample {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub comment_text: String,
    #[serde(default)]
    pub original_post_text: Option<String>,
    #[serde(default)]
    pub original_post_author: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub approach: Option<String>,
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub decision_reason: Option<String>,
    #[serde(default)]
    pub decided_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FeedbackExamples {
    #[serde(default, deserialize_with = "de_null_default")]
    pub approved: Vec<FeedbackExample>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub denied: Vec<FeedbackExample>,
}

// --- Execution ---

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct KillSwitch {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub activated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PlatformWorkers {
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub workers: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ExecutionStatus {
    #[serde(default)]
    pub kill_switch: KillSwitch,
    #[serde(default, deserialize_with = "de_null_default")]
    pub platforms: BTreeMap<String, PlatformWorkers>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KillSwitchRequest {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct KillSwitchAck {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub kill_switch: KillSwitch,
}
