use serde::{Deserialize, Serialize};

/// Handle to the discussion thread being monitored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadHandle {
    /// Platform identifier of the thread (e.g. the Reddit post id).
    pub id: String,
    /// Fully qualified platform name, used when posting into the thread.
    pub fullname: String,
    pub title: String,
    pub permalink: String,
}

/// A single comment as fetched from the platform.
///
/// `author` is `None` for deleted comments; those are skipped everywhere.
/// `replies` holds the children materialized at fetch time. The aggregator
/// does not trust this snapshot for counting: reply counts change between
/// ticks, so it re-reads replies through the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub fullname: String,
    pub author: Option<String>,
    pub body: String,
    pub permalink: String,
    #[serde(default)]
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn is_by(&self, name: &str) -> bool {
        self.author.as_deref() == Some(name)
    }
}

/// Selects the thread a task targets: either a direct id, or a
/// (subreddit, title-pattern) search over the most recent pinned threads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetSpec {
    pub post_id: Option<String>,
    pub subreddit: Option<String>,
    pub post_regex: Option<String>,
}

impl TargetSpec {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            post_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn by_search(subreddit: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            subreddit: Some(subreddit.into()),
            post_regex: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// Short label used in log lines so concurrent targets can be told apart.
    pub fn describe(&self) -> String {
        if let Some(id) = &self.post_id {
            id.clone()
        } else if let (Some(sub), Some(regex)) = (&self.subreddit, &self.post_regex) {
            format!("r/{}?regex={}", sub, regex)
        } else {
            "<unconfigured>".to_string()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no qualifying thread found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("platform API error: {0}")]
    Api(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid title pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, BotError>;
