use crate::model::{Question, Reply, UserRegistry};
use crate::platform::PlatformClient;
use crate::types::{Comment, Result, ThreadHandle};
use crate::utils;
use tracing::debug;

/// Filters applied while walking the comment tree.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// The bot's own account, always excluded from both roles.
    pub bot_name: String,
    /// When set, only questions by this user are counted.
    pub question_author: Option<String>,
    /// When set, only answers by this user are counted.
    pub answer_author: Option<String>,
}

impl AggregateOptions {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
            question_author: None,
            answer_author: None,
        }
    }

    fn counts_as_question(&self, author: &str) -> bool {
        if author == self.bot_name {
            return false;
        }
        match &self.question_author {
            Some(only) => author == only,
            None => true,
        }
    }

    fn counts_as_answer(&self, author: &str) -> bool {
        if author == self.bot_name {
            return false;
        }
        match &self.answer_author {
            Some(only) => author == only,
            None => true,
        }
    }
}

/// Walks one thread's comment tree and produces the per-user tally.
///
/// Two passes: top-level comments become questions keyed by asker, then
/// each question's replies are read fresh and attributed to their
/// responders. The two role registries stay independent until the final
/// merge, so a person who both asks and answers ends up as one entry with
/// summed counts.
pub async fn aggregate(
    client: &dyn PlatformClient,
    thread: &ThreadHandle,
    top_level: &[Comment],
    options: &AggregateOptions,
) -> Result<UserRegistry> {
    let mut askers = collect_questions(top_level, options);
    let repliers = collect_replies(client, thread, &mut askers, options).await?;
    Ok(UserRegistry::merge(askers, repliers))
}

/// Question pass: one registry entry per asker, questions in fetch order.
fn collect_questions(top_level: &[Comment], options: &AggregateOptions) -> UserRegistry {
    let mut askers = UserRegistry::new();
    for comment in top_level {
        // Deleted comments have no author to credit.
        let Some(author) = comment.author.as_deref() else {
            continue;
        };
        if !options.counts_as_question(author) {
            continue;
        }
        let asker = askers.get_or_insert(author);
        asker.add_question(Question {
            id: comment.id.clone(),
            author: author.to_string(),
            body: comment.body.clone(),
            permalink: comment.permalink.clone(),
            reply_count: 0,
        });
        debug!(
            asker = author,
            questions = asker.questions.len(),
            "collected question"
        );
    }
    askers
}

/// Reply pass: re-reads each question's replies and builds the replier
/// registry, crediting the asker with every counted reply along the way.
async fn collect_replies(
    client: &dyn PlatformClient,
    thread: &ThreadHandle,
    askers: &mut UserRegistry,
    options: &AggregateOptions,
) -> Result<UserRegistry> {
    // Snapshot (asker, question index, question comment) so the fetches can
    // run without holding a borrow on the registry across await points.
    let pending: Vec<(String, usize, Comment)> = askers
        .iter()
        .flat_map(|user| {
            user.questions.iter().enumerate().map(move |(i, q)| {
                let comment = Comment {
                    id: q.id.clone(),
                    fullname: String::new(),
                    author: Some(q.author.clone()),
                    body: q.body.clone(),
                    permalink: q.permalink.clone(),
                    replies: Vec::new(),
                };
                (user.name.clone(), i, comment)
            })
        })
        .collect();

    let mut repliers = UserRegistry::new();
    for (asker_name, question_index, question) in pending {
        let replies = client.replies(thread, &question).await?;
        let mut counted = 0u32;
        for reply in replies {
            let Some(author) = reply.author.as_deref() else {
                continue;
            };
            if !options.counts_as_answer(author) {
                continue;
            }
            counted += 1;
            let replier = repliers.get_or_insert(author);
            replier.add_reply(Reply {
                id: reply.id.clone(),
                author: author.to_string(),
                body: reply.body.clone(),
                permalink: reply.permalink.clone(),
                question_id: question.id.clone(),
            });
            debug!(
                asker = %asker_name,
                replier = author,
                replies = replier.replies.len(),
                excerpt = %utils::excerpt(&reply.body),
                "collected reply"
            );
        }
        if let Some(asker) = askers.get_mut(&asker_name) {
            asker.replies_received += counted;
            asker.questions[question_index].reply_count = counted;
        }
    }
    Ok(repliers)
}
