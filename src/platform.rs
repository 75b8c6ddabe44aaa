use crate::types::{Comment, Result, TargetSpec, ThreadHandle};
use async_trait::async_trait;

/// Seam between the core pipeline and the social platform.
///
/// The aggregator, publisher, and task loop only ever talk to this trait;
/// `RedditClient` is the production implementation and the integration
/// tests substitute an in-memory one.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Resolves a target to a concrete thread.
    ///
    /// For search targets the thread must be pinned and its title must
    /// match the pattern at the start, scanning only the most recent
    /// listed threads. Fails with `BotError::NotFound` when nothing
    /// qualifies.
    async fn find_thread(&self, target: &TargetSpec) -> Result<ThreadHandle>;

    /// All top-level comments of the thread, with collapsed branches fully
    /// materialized before aggregation begins.
    async fn top_level_comments(&self, thread: &ThreadHandle) -> Result<Vec<Comment>>;

    /// Freshly reads the current replies to one comment. Counts change
    /// between ticks, so callers must not reuse an earlier snapshot.
    async fn replies(&self, thread: &ThreadHandle, comment: &Comment) -> Result<Vec<Comment>>;

    /// Posts a new top-level comment in the thread.
    async fn create_comment(&self, thread: &ThreadHandle, body: &str) -> Result<Comment>;

    /// Replaces the body of an existing comment.
    async fn edit_comment(&self, comment: &Comment, body: &str) -> Result<()>;

    /// Deletes an existing comment.
    async fn delete_comment(&self, comment: &Comment) -> Result<()>;
}
