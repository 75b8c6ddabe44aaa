use crate::config::CommentMode;
use crate::platform::PlatformClient;
use crate::types::{Comment, Result, ThreadHandle};
use tracing::{info, warn};

/// What the publisher did with the thread's summary comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// No prior bot comment existed; a new one was created.
    Created,
    /// The bot's existing comment was edited in place.
    Edited,
    /// Prior bot comment(s) were deleted and one fresh comment created.
    Replaced { deleted: usize },
}

/// Places the rendered report into the thread.
///
/// Scans the existing top-level comments for ones authored by the bot. In
/// edit mode the first match is updated in place; in new mode every match
/// is deleted and a single fresh comment is posted afterwards.
pub async fn publish(
    client: &dyn PlatformClient,
    thread: &ThreadHandle,
    existing_top_level: &[Comment],
    body: &str,
    bot_name: &str,
    mode: CommentMode,
) -> Result<PublishOutcome> {
    let prior: Vec<&Comment> = existing_top_level
        .iter()
        .filter(|c| c.is_by(bot_name))
        .collect();

    if prior.is_empty() {
        let created = client.create_comment(thread, body).await?;
        info!(thread = %thread.id, comment = %created.id, "created summary comment");
        return Ok(PublishOutcome::Created);
    }

    match mode {
        CommentMode::Edit => {
            // First match wins. Extra stale comments would only exist after
            // a run in new mode was interrupted; surface them instead of
            // silently leaving the thread ambiguous.
            if prior.len() > 1 {
                warn!(
                    thread = %thread.id,
                    stale = prior.len() - 1,
                    "multiple bot comments found in edit mode, editing the first and leaving the rest"
                );
            }
            client.edit_comment(prior[0], body).await?;
            info!(thread = %thread.id, comment = %prior[0].id, "edited summary comment");
            Ok(PublishOutcome::Edited)
        }
        CommentMode::New => {
            for stale in &prior {
                client.delete_comment(stale).await?;
            }
            let created = client.create_comment(thread, body).await?;
            info!(
                thread = %thread.id,
                comment = %created.id,
                deleted = prior.len(),
                "replaced summary comment"
            );
            Ok(PublishOutcome::Replaced {
                deleted: prior.len(),
            })
        }
    }
}
