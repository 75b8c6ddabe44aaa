use crate::types::{BotError, Result, TargetSpec};
use clap::Parser;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Where the rendered report goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print the report to the console.
    Print,
    /// Post the report into the thread as a comment.
    Post,
}

impl FromStr for Mode {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "print" => Ok(Mode::Print),
            "post" => Ok(Mode::Post),
            other => Err(BotError::Configuration(format!(
                "unsupported mode `{}`, expected `print` or `post`",
                other
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Print => write!(f, "print"),
            Mode::Post => write!(f, "post"),
        }
    }
}

/// How an existing summary comment is handled when posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentMode {
    /// Edit the bot's previous comment in place.
    Edit,
    /// Delete the bot's previous comment(s) and post a new one.
    New,
}

impl FromStr for CommentMode {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "edit" => Ok(CommentMode::Edit),
            "new" => Ok(CommentMode::New),
            other => Err(BotError::Configuration(format!(
                "unsupported comment_mode `{}`, expected `edit` or `new`",
                other
            ))),
        }
    }
}

impl fmt::Display for CommentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentMode::Edit => write!(f, "edit"),
            CommentMode::New => write!(f, "new"),
        }
    }
}

/// Configured scan targets, parsed from the `--posts` JSON string.
#[derive(Debug, Clone)]
pub struct Targets(pub Vec<TargetSpec>);

/// Runtime configuration, loaded once at startup.
///
/// Every flag falls back to the environment variable of the same name, so
/// the bot can run unattended from a plain environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "threadtally", version, about)]
pub struct BotConfig {
    /// The username of the bot's platform account. Comments by this account
    /// are excluded from aggregation.
    #[arg(long, env = "username")]
    pub username: String,

    /// The password for the bot's account.
    #[arg(long, env = "password")]
    pub password: String,

    /// OAuth client id of the bot application.
    #[arg(long, env = "client_id")]
    pub client_id: String,

    /// OAuth client secret of the bot application.
    #[arg(long, env = "client_secret")]
    pub client_secret: String,

    /// User agent sent with every API request.
    #[arg(long, env = "user_agent")]
    pub user_agent: String,

    /// JSON string describing one or more threads to scan. Either a single
    /// object or a list; each object carries `post_id`, or `subreddit` plus
    /// `post_regex`.
    #[arg(long, env = "posts", value_parser = parse_targets)]
    pub posts: Targets,

    /// Minimum number of replies before a question is considered satisfied
    /// and dropped from the under-served section.
    #[arg(long, env = "reply_threshold", default_value_t = 3)]
    pub reply_threshold: u32,

    /// `print` to write results to the console, `post` to publish them as a
    /// comment in the thread.
    #[arg(long, env = "mode", default_value = "print", value_parser = Mode::from_str)]
    pub mode: Mode,

    /// `edit` to update the bot's previous comment, `new` to delete it and
    /// post a fresh one.
    #[arg(long, env = "comment_mode", default_value = "edit", value_parser = CommentMode::from_str)]
    pub comment_mode: CommentMode,

    /// Seconds to wait between scans.
    #[arg(long, env = "interval", default_value_t = 600)]
    pub interval: u64,

    /// Run one scan per target and exit instead of scanning forever.
    #[arg(long)]
    pub once: bool,

    /// Only count questions asked by this user.
    #[arg(long, env = "question_username")]
    pub question_username: Option<String>,

    /// Only count answers given by this user.
    #[arg(long, env = "answer_username")]
    pub answer_username: Option<String>,

    /// Dump every scanned question to the log.
    #[arg(long)]
    pub print_questions: bool,

    /// Dump every scanned answer to the log.
    #[arg(long)]
    pub print_answers: bool,
}

impl BotConfig {
    /// Fails fast on combinations the rest of the pipeline cannot handle.
    pub fn validate(&self) -> Result<()> {
        if self.posts.0.is_empty() {
            return Err(BotError::Configuration(
                "at least one target post is required".to_string(),
            ));
        }
        for target in &self.posts.0 {
            validate_target(target)?;
        }
        if self.interval == 0 {
            return Err(BotError::Configuration(
                "interval must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_target(target: &TargetSpec) -> Result<()> {
    let by_id = target.post_id.is_some();
    let by_search = target.subreddit.is_some() && target.post_regex.is_some();
    if by_id || by_search {
        Ok(())
    } else {
        Err(BotError::Configuration(format!(
            "target must set `post_id`, or `subreddit` and `post_regex`: {:?}",
            target
        )))
    }
}

/// Parses the `--posts` value: a single JSON object or a JSON list of
/// objects, each describing one target thread.
fn parse_targets(raw: &str) -> Result<Targets> {
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        BotError::Configuration(format!("unable to parse posts as JSON ({}): {}", e, raw))
    })?;
    let specs = match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value::<TargetSpec>(item).map_err(BotError::from))
            .collect::<Result<Vec<_>>>()?,
        Value::Object(_) => vec![serde_json::from_value::<TargetSpec>(value)?],
        other => {
            return Err(BotError::Configuration(format!(
                "posts must be a JSON object or list of objects, got: {}",
                other
            )))
        }
    };
    Ok(Targets(specs))
}
