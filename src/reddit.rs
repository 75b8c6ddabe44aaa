use crate::config::BotConfig;
use crate::platform::PlatformClient;
use crate::types::{BotError, Comment, Result, TargetSpec, ThreadHandle};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const WWW_BASE: &str = "https://www.reddit.com";
const OAUTH_BASE: &str = "https://oauth.reddit.com";
const REQUEST_TIMEOUT_SECS: u64 = 30;
/// How many of the newest listed threads a search target scans.
const LISTING_LIMIT: usize = 10;
/// Refresh the token this long before it actually expires.
const TOKEN_SLACK_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct BearerToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl BearerToken {
    fn is_fresh(&self) -> bool {
        self.expires_at - ChronoDuration::seconds(TOKEN_SLACK_SECS) > Utc::now()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Reddit implementation of [`PlatformClient`] over the OAuth JSON API.
///
/// Authenticates with the password grant and caches the bearer token until
/// shortly before expiry. All reads go through `oauth.reddit.com` with
/// `raw_json=1` so bodies come back unescaped.
pub struct RedditClient {
    http: Client,
    username: String,
    password: String,
    client_id: String,
    client_secret: String,
    token: RwLock<Option<BearerToken>>,
}

impl RedditClient {
    pub fn new(config: &BotConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .gzip(true)
            .build()?;
        Ok(Self {
            http,
            username: config.username.clone(),
            password: config.password.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token: RwLock::new(None),
        })
    }

    async fn bearer_token(&self) -> Result<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_fresh() {
                return Ok(token.access_token.clone());
            }
        }

        let mut guard = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = guard.as_ref() {
            if token.is_fresh() {
                return Ok(token.access_token.clone());
            }
        }

        debug!("requesting fresh access token");
        let params = [
            ("grant_type", "password"),
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];
        let response = self
            .http
            .post(format!("{}/api/v1/access_token", WWW_BASE))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&params)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BotError::Api(format!(
                "token request failed with HTTP {}",
                status
            )));
        }
        let parsed: TokenResponse = response.json().await?;
        let token = BearerToken {
            access_token: parsed.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(parsed.expires_in),
        };
        let access = token.access_token.clone();
        *guard = Some(token);
        Ok(access)
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let token = self.bearer_token().await?;
        let url = url::Url::parse_with_params(&format!("{}{}", OAUTH_BASE, path), query)?;
        debug!(url = %url, "GET");
        let response = self.http.get(url).bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BotError::Api(format!("HTTP {} from {}", status, path)));
        }
        Ok(response.json().await?)
    }

    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<Value> {
        let token = self.bearer_token().await?;
        debug!(path, "POST");
        let response = self
            .http
            .post(format!("{}{}", OAUTH_BASE, path))
            .bearer_auth(token)
            .form(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BotError::Api(format!("HTTP {} from {}", status, path)));
        }
        let value: Value = response.json().await?;
        if let Some(errors) = value.pointer("/json/errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                return Err(BotError::Api(format!("{} returned {:?}", path, errors)));
            }
        }
        Ok(value)
    }

    /// Resolves a thread by its id via the comments endpoint.
    async fn thread_by_id(&self, id: &str) -> Result<ThreadHandle> {
        let value = self
            .get_json(
                &format!("/comments/{}", id),
                &[("limit", "1"), ("depth", "1"), ("raw_json", "1")],
            )
            .await?;
        let data = value
            .pointer("/0/data/children/0/data")
            .ok_or_else(|| BotError::NotFound(format!("thread {} not found", id)))?;
        parse_thread(data)
    }

    /// Scans the newest listed threads of a subreddit for a pinned one
    /// whose title matches the pattern at its start.
    async fn thread_by_search(&self, subreddit: &str, pattern: &str) -> Result<ThreadHandle> {
        let regex = Regex::new(pattern)?;
        let limit = LISTING_LIMIT.to_string();
        let value = self
            .get_json(
                &format!("/r/{}/new", subreddit),
                &[("limit", limit.as_str()), ("raw_json", "1")],
            )
            .await?;
        let children = value
            .pointer("/data/children")
            .and_then(Value::as_array)
            .ok_or_else(|| BotError::Api(format!("unexpected listing shape for r/{}", subreddit)))?;
        for child in children {
            let Some(data) = child.get("data") else {
                continue;
            };
            let pinned = data
                .get("stickied")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let title = data.get("title").and_then(Value::as_str).unwrap_or("");
            let title_matches = regex.find(title).map(|m| m.start() == 0).unwrap_or(false);
            if pinned && title_matches {
                return parse_thread(data);
            }
        }
        Err(BotError::NotFound(format!(
            "no pinned thread matching `{}` among the {} newest in r/{}",
            pattern, LISTING_LIMIT, subreddit
        )))
    }

    /// Expands "load more comments" stubs at the top level of the tree.
    async fn expand_more(&self, thread: &ThreadHandle, ids: &[String]) -> Result<Vec<Comment>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        info!(thread = %thread.id, stubs = ids.len(), "expanding collapsed top-level comments");
        let mut expanded = Vec::new();
        // The endpoint caps how many ids one call may carry.
        for chunk in ids.chunks(100) {
            let children = chunk.join(",");
            let value = self
                .get_json(
                    "/api/morechildren",
                    &[
                        ("api_type", "json"),
                        ("link_id", thread.fullname.as_str()),
                        ("children", children.as_str()),
                        ("raw_json", "1"),
                    ],
                )
                .await?;
            let things = value
                .pointer("/json/data/things")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            for thing in things {
                if thing.get("kind").and_then(Value::as_str) != Some("t1") {
                    continue;
                }
                let Some(data) = thing.get("data") else {
                    continue;
                };
                // Only direct children of the thread are top-level
                // questions; nested replies are re-read per question later.
                if data.get("parent_id").and_then(Value::as_str) == Some(thread.fullname.as_str())
                {
                    if let Some(comment) = parse_comment(data) {
                        expanded.push(comment);
                    }
                }
            }
        }
        Ok(expanded)
    }
}

#[async_trait]
impl PlatformClient for RedditClient {
    async fn find_thread(&self, target: &TargetSpec) -> Result<ThreadHandle> {
        if let Some(id) = &target.post_id {
            return self.thread_by_id(id).await;
        }
        match (&target.subreddit, &target.post_regex) {
            (Some(subreddit), Some(pattern)) => self.thread_by_search(subreddit, pattern).await,
            _ => Err(BotError::Configuration(format!(
                "target must set `post_id`, or `subreddit` and `post_regex`: {:?}",
                target
            ))),
        }
    }

    async fn top_level_comments(&self, thread: &ThreadHandle) -> Result<Vec<Comment>> {
        let value = self
            .get_json(
                &format!("/comments/{}", thread.id),
                &[
                    ("limit", "500"),
                    ("depth", "2"),
                    ("sort", "old"),
                    ("raw_json", "1"),
                ],
            )
            .await?;
        let children = value
            .pointer("/1/data/children")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut comments = Vec::new();
        let mut more_ids = Vec::new();
        for child in &children {
            let kind = child.get("kind").and_then(Value::as_str);
            let Some(data) = child.get("data") else {
                continue;
            };
            match kind {
                Some("t1") => {
                    if let Some(comment) = parse_comment(data) {
                        comments.push(comment);
                    }
                }
                Some("more") => {
                    if let Some(ids) = data.get("children").and_then(Value::as_array) {
                        more_ids.extend(
                            ids.iter()
                                .filter_map(Value::as_str)
                                .map(|s| s.to_string()),
                        );
                    }
                }
                _ => {}
            }
        }
        comments.extend(self.expand_more(thread, &more_ids).await?);
        debug!(thread = %thread.id, count = comments.len(), "fetched top-level comments");
        Ok(comments)
    }

    async fn replies(&self, thread: &ThreadHandle, comment: &Comment) -> Result<Vec<Comment>> {
        let value = self
            .get_json(
                &format!("/comments/{}/_/{}", thread.id, comment.id),
                &[("limit", "500"), ("depth", "1"), ("raw_json", "1")],
            )
            .await?;
        let focal = value.pointer("/1/data/children/0/data");
        let Some(focal) = focal else {
            warn!(comment = %comment.id, "comment vanished between passes");
            return Ok(Vec::new());
        };
        Ok(parse_reply_listing(focal.get("replies")))
    }

    async fn create_comment(&self, thread: &ThreadHandle, body: &str) -> Result<Comment> {
        let value = self
            .post_form(
                "/api/comment",
                &[
                    ("api_type", "json"),
                    ("thing_id", thread.fullname.as_str()),
                    ("text", body),
                ],
            )
            .await?;
        let data = value
            .pointer("/json/data/things/0/data")
            .ok_or_else(|| BotError::Api("comment creation returned no comment".to_string()))?;
        parse_comment(data)
            .ok_or_else(|| BotError::Api("comment creation returned malformed comment".to_string()))
    }

    async fn edit_comment(&self, comment: &Comment, body: &str) -> Result<()> {
        self.post_form(
            "/api/editusertext",
            &[
                ("api_type", "json"),
                ("thing_id", comment.fullname.as_str()),
                ("text", body),
            ],
        )
        .await?;
        Ok(())
    }

    async fn delete_comment(&self, comment: &Comment) -> Result<()> {
        self.post_form("/api/del", &[("id", comment.fullname.as_str())])
            .await?;
        Ok(())
    }
}

fn parse_thread(data: &Value) -> Result<ThreadHandle> {
    Ok(ThreadHandle {
        id: required_str(data, "id")?,
        fullname: required_str(data, "name")?,
        title: required_str(data, "title")?,
        permalink: required_str(data, "permalink")?,
    })
}

/// Builds a [`Comment`] from one `t1` payload. Deleted comments keep their
/// place in the tree but lose their author.
fn parse_comment(data: &Value) -> Option<Comment> {
    let id = data.get("id").and_then(Value::as_str)?.to_string();
    let fullname = data.get("name").and_then(Value::as_str)?.to_string();
    let author = data
        .get("author")
        .and_then(Value::as_str)
        .filter(|a| *a != "[deleted]")
        .map(|a| a.to_string());
    let body = data
        .get("body")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let permalink = data
        .get("permalink")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let replies = parse_reply_listing(data.get("replies"));
    Some(Comment {
        id,
        fullname,
        author,
        body,
        permalink,
        replies,
    })
}

/// The `replies` field is an empty string when there are none, otherwise a
/// listing of `t1` children.
fn parse_reply_listing(replies: Option<&Value>) -> Vec<Comment> {
    let Some(children) = replies
        .and_then(|r| r.pointer("/data/children"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };
    children
        .iter()
        .filter(|child| child.get("kind").and_then(Value::as_str) == Some("t1"))
        .filter_map(|child| child.get("data").and_then(parse_comment))
        .collect()
}

fn required_str(data: &Value, key: &str) -> Result<String> {
    data.get(key)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .ok_or_else(|| BotError::Api(format!("missing `{}` in API response", key)))
}
