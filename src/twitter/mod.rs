//! X/Twitter v2 client used by `twclaw`.
//!
//! Plain request/response wrappers: no rate-limit handling, pagination or
//! retries. Responses are reshaped into flat records for printing.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com/2";
pub const TOKEN_ENV: &str = "TWITTER_BEARER_TOKEN";
pub const BASE_URL_ENV: &str = "TWITTER_API_BASE";

/// Printed after a failed post; app-only bearer tokens are read-only.
pub const WRITE_SCOPE_HINT: &str =
    "Note: Posting requires OAuth 2.0 with write scope, not just bearer token.";

const SEARCH_QUERY_SUFFIX: &str = " -is:retweet lang:en";
const TWEET_FIELDS: &str = "created_at,public_metrics,author_id,conversation_id,text";
const READ_TWEET_FIELDS: &str =
    "created_at,public_metrics,author_id,conversation_id,text,referenced_tweets";
const USER_FIELDS: &str = "username,name,public_metrics,verified";
/// The recent-search endpoint only accepts `max_results` in this window.
const MIN_RESULTS: u32 = 10;
const MAX_RESULTS: u32 = 100;

static STATUS_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"status/(\d+)").unwrap_or_else(|_| unreachable!("static pattern is valid"))
});

#[derive(Debug, Error)]
pub enum TwitterError {
    #[error("TWITTER_BEARER_TOKEN environment variable not set")]
    MissingToken,
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("{0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, TwitterError>;

/// Extract the numeric id from a status URL, or return the input unchanged.
pub fn tweet_id(input: &str) -> &str {
    STATUS_ID
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(input)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchOrder {
    #[default]
    Default,
    Recent,
    Popular,
}

impl SearchOrder {
    fn sort_order(self) -> Option<&'static str> {
        match self {
            SearchOrder::Default => None,
            SearchOrder::Recent => Some("recency"),
            SearchOrder::Popular => Some("relevancy"),
        }
    }
}

// --- Wire types ---

#[derive(Debug, Default, Deserialize)]
struct TweetMetrics {
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    retweet_count: u64,
    #[serde(default)]
    reply_count: u64,
    #[serde(default)]
    quote_count: u64,
    #[serde(default)]
    bookmark_count: u64,
    #[serde(default)]
    impression_count: u64,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetrics {
    #[serde(default)]
    followers_count: u64,
}

#[derive(Debug, Deserialize)]
struct WireTweet {
    id: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    author_id: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    public_metrics: TweetMetrics,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    verified: bool,
    #[serde(default)]
    public_metrics: UserMetrics,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<WireUser>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<WireTweet>,
    #[serde(default)]
    includes: Includes,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: WireTweet,
    #[serde(default)]
    includes: Includes,
}

#[derive(Debug, Deserialize)]
struct PostedData {
    id: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    data: PostedData,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    data: WireUser,
}

#[derive(Debug, Serialize)]
struct ReplyTarget<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Debug, Serialize)]
struct PostBody<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<ReplyTarget<'a>>,
}

// --- Output records ---

/// One search hit, flattened with its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub text: String,
    pub author_username: String,
    pub author_name: String,
    pub author_verified: bool,
    pub author_followers: u64,
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
    pub quotes: u64,
    pub bookmarks: u64,
    pub impressions: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub url: String,
}

/// A single tweet as printed by `read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweetDetail {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub author_verified: bool,
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
    pub quotes: u64,
    pub bookmarks: u64,
    pub impressions: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostedTweet {
    pub id: String,
    pub text: String,
    pub url: String,
}

fn status_url(username: Option<&str>, id: &str) -> String {
    format!("https://twitter.com/{}/status/{}", username.unwrap_or("i"), id)
}

fn shape_search(response: SearchResponse) -> Vec<SearchResult> {
    let users: HashMap<&str, &WireUser> = response
        .includes
        .users
        .iter()
        .map(|u| (u.id.as_str(), u))
        .collect();

    response
        .data
        .iter()
        .map(|tweet| {
            let author = tweet
                .author_id
                .as_deref()
                .and_then(|id| users.get(id).copied());
            let username = author
                .and_then(|a| a.username.clone())
                .unwrap_or_else(|| "unknown".to_string());
            let m = &tweet.public_metrics;
            SearchResult {
                id: tweet.id.clone(),
                text: tweet.text.clone(),
                url: status_url(Some(&username), &tweet.id),
                author_username: username,
                author_name: author
                    .and_then(|a| a.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                author_verified: author.map(|a| a.verified).unwrap_or(false),
                author_followers: author.map(|a| a.public_metrics.followers_count).unwrap_or(0),
                likes: m.like_count,
                retweets: m.retweet_count,
                replies: m.reply_count,
                quotes: m.quote_count,
                bookmarks: m.bookmark_count,
                impressions: m.impression_count,
                created_at: tweet.created_at.clone(),
            }
        })
        .collect()
}

fn shape_detail(response: TweetResponse) -> TweetDetail {
    let author = response.includes.users.first();
    let username = author.and_then(|a| a.username.clone());
    let tweet = response.data;
    let m = tweet.public_metrics;
    TweetDetail {
        url: status_url(username.as_deref(), &tweet.id),
        id: tweet.id,
        text: tweet.text,
        author_username: username,
        author_name: author.and_then(|a| a.name.clone()),
        author_verified: author.map(|a| a.verified).unwrap_or(false),
        likes: m.like_count,
        retweets: m.retweet_count,
        replies: m.reply_count,
        quotes: m.quote_count,
        bookmarks: m.bookmark_count,
        impressions: m.impression_count,
        created_at: tweet.created_at,
    }
}

fn shape_posted(response: PostResponse) -> PostedTweet {
    PostedTweet {
        url: status_url(None, &response.data.id),
        id: response.data.id,
        text: response.data.text,
    }
}

/// Human-readable block for one search hit.
pub fn format_search_result(r: &SearchResult) -> String {
    format!(
        "\n{} (@{})\n{}\n💬 {} 🔁 {} ❤️ {} 📊 {}\n🔗 {}",
        r.author_name, r.author_username, r.text, r.replies, r.retweets, r.likes, r.impressions, r.url
    )
}

/// Human-readable block for `read`.
pub fn format_tweet_detail(t: &TweetDetail) -> String {
    format!(
        "\n{} (@{})\n{}\n💬 {} 🔁 {} ❤️ {}\n💾 {} 💬 {} 📊 {}\n🔗 {}",
        t.author_name.as_deref().unwrap_or("Unknown"),
        t.author_username.as_deref().unwrap_or("unknown"),
        t.text,
        t.replies,
        t.retweets,
        t.likes,
        t.bookmarks,
        t.quotes,
        t.impressions,
        t.url
    )
}

/// Bearer-token client for the v2 API.
pub struct TwitterClient {
    agent: ureq::Agent,
    base_url: String,
    bearer: String,
}

impl TwitterClient {
    pub fn new(base_url: &str, bearer: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(Duration::from_secs(30))
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer: bearer.trim().to_string(),
        }
    }

    /// Build a client from `TWITTER_BEARER_TOKEN` (and optional `TWITTER_API_BASE`).
    pub fn from_env() -> Result<Self> {
        let bearer = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or(TwitterError::MissingToken)?;
        let base = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self::new(&base, &bearer))
    }

    /// Recent search, excluding retweets and non-English posts.
    pub fn search(&self, query: &str, count: u32, order: SearchOrder) -> Result<Vec<SearchResult>> {
        let mut params = vec![
            ("query", format!("{query}{SEARCH_QUERY_SUFFIX}")),
            (
                "max_results",
                count.clamp(MIN_RESULTS, MAX_RESULTS).to_string(),
            ),
            ("tweet.fields", TWEET_FIELDS.to_string()),
            ("expansions", "author_id".to_string()),
            ("user.fields", USER_FIELDS.to_string()),
        ];
        if let Some(sort) = order.sort_order() {
            params.push(("sort_order", sort.to_string()));
        }
        let response: SearchResponse = self.get("/tweets/search/recent", &params)?;
        let mut results = shape_search(response);
        results.truncate(count as usize);
        Ok(results)
    }

    pub fn read(&self, tweet: &str) -> Result<TweetDetail> {
        let params = [
            ("tweet.fields", READ_TWEET_FIELDS.to_string()),
            ("expansions", "author_id".to_string()),
            ("user.fields", USER_FIELDS.to_string()),
        ];
        let response: TweetResponse = self.get(&format!("/tweets/{}", tweet_id(tweet)), &params)?;
        Ok(shape_detail(response))
    }

    pub fn reply(&self, tweet: &str, text: &str) -> Result<PostedTweet> {
        let body = PostBody {
            text,
            reply: Some(ReplyTarget {
                in_reply_to_tweet_id: tweet_id(tweet),
            }),
        };
        self.post_tweet(&body)
    }

    pub fn tweet(&self, text: &str) -> Result<PostedTweet> {
        self.post_tweet(&PostBody { text, reply: None })
    }

    /// Username of the account behind the token.
    pub fn auth_check(&self) -> Result<String> {
        let me: MeResponse = self.get("/users/me", &[])?;
        Ok(me.data.username.unwrap_or_else(|| me.data.id))
    }

    fn post_tweet(&self, body: &PostBody<'_>) -> Result<PostedTweet> {
        let url = format!("{}/tweets", self.base_url);
        debug!("POST {url}");
        let result = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.bearer))
            .send_json(body);
        let response: PostResponse = decode(result)?;
        Ok(shape_posted(response))
    }

    fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {url}");
        let mut request = self
            .agent
            .get(&url)
            .set("Authorization", &format!("Bearer {}", self.bearer));
        for (key, value) in params {
            request = request.query(key, value);
        }
        decode(request.call())
    }
}

fn decode<T: DeserializeOwned>(
    result: std::result::Result<ureq::Response, ureq::Error>,
) -> Result<T> {
    match result {
        Ok(response) => {
            let text = response
                .into_string()
                .map_err(|err| TwitterError::Transport(err.to_string()))?;
            serde_json::from_str(&text).map_err(|err| TwitterError::Decode(err.to_string()))
        }
        Err(ureq::Error::Status(status, response)) => Err(TwitterError::Http {
            status,
            body: response.into_string().unwrap_or_default(),
        }),
        Err(ureq::Error::Transport(err)) => Err(TwitterError::Transport(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tweet_id_from_status_url() {
        assert_eq!(
            tweet_id("https://twitter.com/someone/status/1790000000000000001?s=20"),
            "1790000000000000001"
        );
        assert_eq!(tweet_id("https://x.com/i/status/42"), "42");
    }

    #[test]
    fn tweet_id_passes_through_plain_ids() {
        assert_eq!(tweet_id("1790000000000000001"), "1790000000000000001");
        assert_eq!(tweet_id("not-a-url"), "not-a-url");
    }

    #[test]
    fn search_joins_authors_and_defaults_metrics() {
        let json = r#"{
            "data": [
                {"id": "1", "text": "rent is due", "author_id": "u1", "created_at": "2026-10-01T00:00:00Z",
                 "public_metrics": {"like_count": 5, "retweet_count": 1, "reply_count": 2, "quote_count": 0}},
                {"id": "2", "text": "orphan", "author_id": "missing"}
            ],
            "includes": {"users": [
                {"id": "u1", "username": "broke_student", "name": "Sam", "verified": true,
                 "public_metrics": {"followers_count": 900}}
            ]}
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let results = shape_search(response);
        assert_eq!(results.len(), 2);

        let first = &results[0];
        assert_eq!(first.author_username, "broke_student");
        assert_eq!(first.author_followers, 900);
        assert!(first.author_verified);
        assert_eq!(first.likes, 5);
        assert_eq!(first.bookmarks, 0);
        assert_eq!(first.url, "https://twitter.com/broke_student/status/1");

        let orphan = &results[1];
        assert_eq!(orphan.author_username, "unknown");
        assert_eq!(orphan.author_name, "Unknown");
        assert_eq!(orphan.impressions, 0);
        assert_eq!(orphan.created_at, None);
    }

    #[test]
    fn search_without_data_is_empty() {
        let response: SearchResponse = serde_json::from_str(r#"{"meta": {"result_count": 0}}"#).unwrap();
        assert!(shape_search(response).is_empty());
    }

    #[test]
    fn detail_uses_first_included_user() {
        let json = r#"{
            "data": {"id": "77", "text": "hello", "author_id": "u9", "public_metrics": {"bookmark_count": 3}},
            "includes": {"users": [{"id": "u9", "username": "cashkitty", "name": "Cash Kitty"}]}
        }"#;
        let detail = shape_detail(serde_json::from_str(json).unwrap());
        assert_eq!(detail.author_username.as_deref(), Some("cashkitty"));
        assert_eq!(detail.bookmarks, 3);
        assert_eq!(detail.url, "https://twitter.com/cashkitty/status/77");
    }

    #[test]
    fn posted_tweet_links_via_i_path() {
        let posted = shape_posted(
            serde_json::from_str(r#"{"data": {"id": "99", "text": "gm"}}"#).unwrap(),
        );
        assert_eq!(posted.url, "https://twitter.com/i/status/99");
    }

    #[test]
    fn reply_body_nests_target() {
        let body = PostBody {
            text: "felt that",
            reply: Some(ReplyTarget {
                in_reply_to_tweet_id: "123",
            }),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"text": "felt that", "reply": {"in_reply_to_tweet_id": "123"}})
        );
        let plain = PostBody { text: "gm", reply: None };
        assert_eq!(serde_json::to_value(&plain).unwrap(), serde_json::json!({"text": "gm"}));
    }

    #[test]
    fn search_block_has_one_line_per_field_group() {
        let result = SearchResult {
            id: "1".into(),
            text: "rent is due".into(),
            author_username: "sam".into(),
            author_name: "Sam".into(),
            author_verified: false,
            author_followers: 0,
            likes: 5,
            retweets: 1,
            replies: 2,
            quotes: 0,
            bookmarks: 0,
            impressions: 10,
            created_at: None,
            url: "https://twitter.com/sam/status/1".into(),
        };
        let block = format_search_result(&result);
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[1], "Sam (@sam)");
        assert_eq!(lines[2], "rent is due");
        assert!(lines[4].ends_with("https://twitter.com/sam/status/1"));
    }
}
