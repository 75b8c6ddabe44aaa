//! Text helpers shared by the debug output and the rendered report.

const EXCERPT_LEN: usize = 20;

/// Returns the first 20 characters of a comment body with runs of
/// whitespace collapsed to single spaces.
pub fn excerpt(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(EXCERPT_LEN).collect()
}

/// Markdown profile link for a user name.
pub fn profile_link(name: &str) -> String {
    format!("[{}](https://reddit.com/user/{}/)", name, name)
}
