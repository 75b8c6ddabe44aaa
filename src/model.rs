use crate::utils;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// A top-level comment treated as a question.
#[derive(Debug, Clone)]
pub struct Question {
    pub id: String,
    pub author: String,
    pub body: String,
    pub permalink: String,
    /// Number of counted replies observed during the reply pass of the
    /// current tick. Read live, not carried over from earlier ticks.
    pub reply_count: u32,
}

/// A second-level comment treated as an answer to a question.
#[derive(Debug, Clone)]
pub struct Reply {
    pub id: String,
    pub author: String,
    pub body: String,
    pub permalink: String,
    /// Id of the question this reply answers.
    pub question_id: String,
}

/// Per-user contribution tally for one tick.
#[derive(Debug, Clone)]
pub struct User {
    pub name: String,
    pub questions: Vec<Question>,
    pub replies: Vec<Reply>,
    pub replies_received: u32,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            questions: Vec::new(),
            replies: Vec::new(),
            replies_received: 0,
        }
    }

    pub fn add_question(&mut self, question: Question) {
        self.questions.push(question);
    }

    pub fn add_reply(&mut self, reply: Reply) {
        self.replies.push(reply);
    }

    pub fn num_replies(&self) -> usize {
        self.replies.len()
    }

    /// Net-helper score: replies given minus replies received minus
    /// questions asked. Shown in debug output; the published report ranks
    /// by raw reply count instead.
    pub fn relative_contribution(&self) -> i64 {
        self.replies.len() as i64 - self.replies_received as i64 - self.questions.len() as i64
    }

    pub fn profile_link(&self) -> String {
        utils::profile_link(&self.name)
    }

    /// Merges two tallies for the same person into one. Names are expected
    /// to match; a mismatch keeps the first name.
    pub fn combine(a: User, b: User) -> User {
        if a.name != b.name {
            warn!(left = %a.name, right = %b.name, "combining users with different names");
        }
        let mut questions = a.questions;
        questions.extend(b.questions);
        let mut replies = a.replies;
        replies.extend(b.replies);
        User {
            name: a.name,
            questions,
            replies,
            replies_received: a.replies_received + b.replies_received,
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: relative_contribution={}",
            self.name,
            self.relative_contribution()
        )?;
        writeln!(f, "\t+num_replies={}", self.replies.len())?;
        writeln!(f, "\t-num_replies_received={}", self.replies_received)?;
        writeln!(f, "\t-num_questions={}", self.questions.len())?;
        for question in &self.questions {
            writeln!(f, "\t\tQuestion: {}", utils::excerpt(&question.body))?;
        }
        for reply in &self.replies {
            writeln!(f, "\t\tReply: {}", utils::excerpt(&reply.body))?;
        }
        Ok(())
    }
}

/// Insertion-ordered map from user name to tally.
///
/// Iteration order is the order users were first seen (or merged in), which
/// the report builder relies on for stable tie-breaking. Replacing an entry
/// keeps its position.
#[derive(Debug, Default)]
pub struct UserRegistry {
    index: HashMap<String, usize>,
    users: Vec<User>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&User> {
        self.index.get(name).map(|&i| &self.users[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut User> {
        let i = *self.index.get(name)?;
        Some(&mut self.users[i])
    }

    /// Returns the tally for `name`, creating a fresh empty one on first
    /// sighting. Always allocates new empty containers for a new user.
    pub fn get_or_insert(&mut self, name: &str) -> &mut User {
        let i = match self.index.get(name) {
            Some(&i) => i,
            None => {
                self.users.push(User::new(name));
                let i = self.users.len() - 1;
                self.index.insert(name.to_string(), i);
                i
            }
        };
        &mut self.users[i]
    }

    /// Replaces an existing entry in place, or appends if absent.
    pub fn insert(&mut self, user: User) {
        match self.index.get(&user.name) {
            Some(&i) => self.users[i] = user,
            None => {
                self.index.insert(user.name.clone(), self.users.len());
                self.users.push(user);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.iter()
    }

    /// Unions the asker and replier registries built by the aggregation
    /// passes. A name present in both collapses to one combined entry at
    /// the asker's position; repliers unknown as askers are appended in
    /// their discovery order.
    pub fn merge(mut askers: UserRegistry, repliers: UserRegistry) -> UserRegistry {
        for replier in repliers.users {
            match askers.index.get(&replier.name) {
                Some(&i) => {
                    let asker =
                        std::mem::replace(&mut askers.users[i], User::new(replier.name.clone()));
                    askers.users[i] = User::combine(asker, replier);
                }
                None => askers.insert(replier),
            }
        }
        askers
    }
}
