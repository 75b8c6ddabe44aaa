use crate::model::{User, UserRegistry};
use crate::utils;
use tracing::debug;

/// One row of the top-contributors section.
#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    pub name: String,
    pub profile_link: String,
    pub reply_count: usize,
}

/// A question still waiting for enough answers.
#[derive(Debug, Clone)]
pub struct UnderservedQuestion {
    pub excerpt: String,
    pub permalink: String,
    pub reply_count: u32,
}

/// A contributor whose own questions are still under-served.
#[derive(Debug, Clone)]
pub struct UnderservedUser {
    pub name: String,
    pub profile_link: String,
    pub questions: Vec<UnderservedQuestion>,
}

/// The ranked, filtered summary for one tick. Rebuilt every tick, never
/// persisted.
#[derive(Debug, Clone)]
pub struct Report {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub underserved: Vec<UnderservedUser>,
    pub reply_threshold: u32,
}

/// Ranks and filters an aggregated registry into a [`Report`].
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    reply_threshold: u32,
    top_n: usize,
}

impl ReportBuilder {
    pub const DEFAULT_TOP_N: usize = 10;

    pub fn new(reply_threshold: u32) -> Self {
        Self {
            reply_threshold,
            top_n: Self::DEFAULT_TOP_N,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn build(&self, registry: &UserRegistry) -> Report {
        // Users who answered at least once, best first. The sort is stable
        // so ties keep the order users entered the registry.
        let mut ranked: Vec<&User> = registry.iter().filter(|u| u.num_replies() > 0).collect();
        ranked.sort_by(|a, b| b.num_replies().cmp(&a.num_replies()));

        let leaderboard = ranked
            .iter()
            .take(self.top_n)
            .map(|user| LeaderboardEntry {
                name: user.name.clone(),
                profile_link: user.profile_link(),
                reply_count: user.num_replies(),
            })
            .collect();

        // The under-served section walks the same ranked list, keeping each
        // contributor's own questions that are still short of the threshold.
        let mut underserved = Vec::new();
        for user in &ranked {
            if underserved.len() == self.top_n {
                break;
            }
            let questions: Vec<UnderservedQuestion> = user
                .questions
                .iter()
                .filter(|q| q.reply_count < self.reply_threshold)
                .map(|q| UnderservedQuestion {
                    excerpt: utils::excerpt(&q.body),
                    permalink: q.permalink.clone(),
                    reply_count: q.reply_count,
                })
                .collect();
            if !questions.is_empty() {
                underserved.push(UnderservedUser {
                    name: user.name.clone(),
                    profile_link: user.profile_link(),
                    questions,
                });
            }
        }

        debug!(
            ranked = ranked.len(),
            underserved = underserved.len(),
            "built report"
        );
        Report {
            leaderboard,
            underserved,
            reply_threshold: self.reply_threshold,
        }
    }
}

impl Report {
    /// Renders the report as the markdown body of the summary comment.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("**Top contributors**\n\n");
        if self.leaderboard.is_empty() {
            out.push_str("Nobody has answered a question yet.\n");
        }
        for (i, entry) in self.leaderboard.iter().enumerate() {
            out.push_str(&format!(
                "{}. {} with {} {}\n",
                i + 1,
                entry.profile_link,
                entry.reply_count,
                plural(entry.reply_count, "reply", "replies"),
            ));
        }
        out.push('\n');
        out.push_str(&format!(
            "**Questions still waiting for answers** (fewer than {} replies)\n\n",
            self.reply_threshold
        ));
        if self.underserved.is_empty() {
            out.push_str("Every question has been answered. Nice work!\n");
        }
        for user in &self.underserved {
            out.push_str(&format!("{}:\n", user.profile_link));
            for question in &user.questions {
                out.push_str(&format!(
                    "- [{}]({}) ({} {})\n",
                    question.excerpt,
                    question.permalink,
                    question.reply_count,
                    plural(question.reply_count as usize, "reply", "replies"),
                ));
            }
            out.push('\n');
        }
        out
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}
