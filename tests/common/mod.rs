use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use threadtally::{BotError, Comment, PlatformClient, Result, TargetSpec, ThreadHandle};

/// Side effects recorded by the mock, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    Create { body: String },
    Edit { comment_id: String, body: String },
    Delete { comment_id: String },
}

/// In-memory platform with one thread, configurable comments, and a log of
/// every mutating call.
pub struct MockPlatform {
    thread: ThreadHandle,
    top_level: Mutex<Vec<Comment>>,
    replies: Mutex<HashMap<String, Vec<Comment>>>,
    pub calls: Mutex<Vec<PlatformCall>>,
    next_id: Mutex<u32>,
}

impl MockPlatform {
    pub fn new(thread_id: &str) -> Self {
        Self {
            thread: ThreadHandle {
                id: thread_id.to_string(),
                fullname: format!("t3_{}", thread_id),
                title: "Daily question thread".to_string(),
                permalink: format!("/r/test/comments/{}/", thread_id),
            },
            top_level: Mutex::new(Vec::new()),
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            next_id: Mutex::new(0),
        }
    }

    pub fn thread(&self) -> ThreadHandle {
        self.thread.clone()
    }

    fn fresh_id(&self) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("c{}", next)
    }

    /// Adds a top-level comment and returns its id. `author: None` models a
    /// deleted comment.
    pub fn add_top_level(&self, author: Option<&str>, body: &str) -> String {
        let id = self.fresh_id();
        self.top_level
            .lock()
            .unwrap()
            .push(self.comment(&id, author, body));
        id
    }

    /// Adds a reply under an existing top-level comment and returns its id.
    pub fn add_reply(&self, question_id: &str, author: Option<&str>, body: &str) -> String {
        let id = self.fresh_id();
        let reply = self.comment(&id, author, body);
        self.replies
            .lock()
            .unwrap()
            .entry(question_id.to_string())
            .or_default()
            .push(reply);
        id
    }

    fn comment(&self, id: &str, author: Option<&str>, body: &str) -> Comment {
        Comment {
            id: id.to_string(),
            fullname: format!("t1_{}", id),
            author: author.map(|a| a.to_string()),
            body: body.to_string(),
            permalink: format!("{}{}/", self.thread.permalink, id),
            replies: Vec::new(),
        }
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformClient for MockPlatform {
    async fn find_thread(&self, target: &TargetSpec) -> Result<ThreadHandle> {
        if let Some(id) = &target.post_id {
            if id != &self.thread.id {
                return Err(BotError::NotFound(format!("thread {} not found", id)));
            }
        }
        Ok(self.thread.clone())
    }

    async fn top_level_comments(&self, _thread: &ThreadHandle) -> Result<Vec<Comment>> {
        Ok(self.top_level.lock().unwrap().clone())
    }

    async fn replies(&self, _thread: &ThreadHandle, comment: &Comment) -> Result<Vec<Comment>> {
        Ok(self
            .replies
            .lock()
            .unwrap()
            .get(&comment.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_comment(&self, _thread: &ThreadHandle, body: &str) -> Result<Comment> {
        self.calls.lock().unwrap().push(PlatformCall::Create {
            body: body.to_string(),
        });
        let id = self.fresh_id();
        Ok(self.comment(&id, Some("tallybot"), body))
    }

    async fn edit_comment(&self, comment: &Comment, body: &str) -> Result<()> {
        self.calls.lock().unwrap().push(PlatformCall::Edit {
            comment_id: comment.id.clone(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn delete_comment(&self, comment: &Comment) -> Result<()> {
        self.calls.lock().unwrap().push(PlatformCall::Delete {
            comment_id: comment.id.clone(),
        });
        Ok(())
    }
}
