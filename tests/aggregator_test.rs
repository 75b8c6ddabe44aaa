mod common;

use common::MockPlatform;
use threadtally::{aggregate, AggregateOptions, PlatformClient, UserRegistry};

const BOT: &str = "tallybot";

async fn aggregate_thread(platform: &MockPlatform, options: &AggregateOptions) -> UserRegistry {
    let thread = platform.thread();
    let top_level = platform.top_level_comments(&thread).await.unwrap();
    aggregate(platform, &thread, &top_level, options)
        .await
        .unwrap()
}

#[tokio::test]
async fn bot_comments_are_excluded_from_both_roles() {
    let platform = MockPlatform::new("abc123");
    let q = platform.add_top_level(Some("alice"), "How do I do the thing?");
    platform.add_top_level(Some(BOT), "**Top contributors** ...");
    platform.add_reply(&q, Some(BOT), "beep boop");
    platform.add_reply(&q, Some("bob"), "Like this.");

    let registry = aggregate_thread(&platform, &AggregateOptions::new(BOT)).await;

    assert!(registry.get(BOT).is_none());
    let alice = registry.get("alice").unwrap();
    assert_eq!(alice.replies_received, 1);
    assert_eq!(alice.questions[0].reply_count, 1);
    assert_eq!(registry.get("bob").unwrap().num_replies(), 1);
}

#[tokio::test]
async fn deleted_comments_are_skipped() {
    let platform = MockPlatform::new("abc123");
    let q = platform.add_top_level(Some("alice"), "Anyone know why this breaks?");
    platform.add_top_level(None, "[deleted]");
    platform.add_reply(&q, None, "[deleted]");
    platform.add_reply(&q, Some("bob"), "Known bug.");

    let registry = aggregate_thread(&platform, &AggregateOptions::new(BOT)).await;

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get("alice").unwrap().replies_received, 1);
}

#[tokio::test]
async fn asker_and_replier_roles_merge_into_one_entry() {
    let platform = MockPlatform::new("abc123");
    let carol_q = platform.add_top_level(Some("carol"), "What is a lifetime?");
    let dave_q = platform.add_top_level(Some("dave"), "Why does this not compile?");
    platform.add_reply(&carol_q, Some("dave"), "Scope of a borrow.");
    platform.add_reply(&carol_q, Some("erin"), "See the book chapter.");
    platform.add_reply(&dave_q, Some("carol"), "Missing semicolon.");

    let registry = aggregate_thread(&platform, &AggregateOptions::new(BOT)).await;

    let carol = registry.get("carol").unwrap();
    assert_eq!(carol.questions.len(), 1);
    assert_eq!(carol.num_replies(), 1);
    assert_eq!(carol.replies_received, 2);
    assert_eq!(carol.relative_contribution(), 1 - 2 - 1);

    let dave = registry.get("dave").unwrap();
    assert_eq!(dave.questions.len(), 1);
    assert_eq!(dave.num_replies(), 1);
    assert_eq!(dave.replies_received, 1);

    // Merged entries appear once: two askers plus the reply-only erin.
    assert_eq!(registry.len(), 3);
}

#[tokio::test]
async fn reply_only_users_have_no_questions() {
    let platform = MockPlatform::new("abc123");
    let q = platform.add_top_level(Some("alice"), "How do I exit vim?");
    platform.add_reply(&q, Some("bob"), ":wq");

    let registry = aggregate_thread(&platform, &AggregateOptions::new(BOT)).await;

    let bob = registry.get("bob").unwrap();
    assert!(bob.questions.is_empty());
    assert_eq!(bob.num_replies(), 1);
    assert_eq!(bob.replies_received, 0);
}

#[tokio::test]
async fn multiple_questions_by_one_asker_accumulate() {
    let platform = MockPlatform::new("abc123");
    let q1 = platform.add_top_level(Some("alice"), "First question");
    let q2 = platform.add_top_level(Some("alice"), "Second question");
    platform.add_reply(&q1, Some("bob"), "First answer");
    platform.add_reply(&q2, Some("bob"), "Second answer");
    platform.add_reply(&q2, Some("carol"), "Another take");

    let registry = aggregate_thread(&platform, &AggregateOptions::new(BOT)).await;

    let alice = registry.get("alice").unwrap();
    assert_eq!(alice.questions.len(), 2);
    assert_eq!(alice.replies_received, 3);
    assert_eq!(alice.questions[0].reply_count, 1);
    assert_eq!(alice.questions[1].reply_count, 2);
}

#[tokio::test]
async fn question_filter_restricts_askers() {
    let platform = MockPlatform::new("abc123");
    let alice_q = platform.add_top_level(Some("alice"), "Alice asks");
    let bob_q = platform.add_top_level(Some("bob"), "Bob asks");
    platform.add_reply(&alice_q, Some("carol"), "For alice");
    platform.add_reply(&bob_q, Some("carol"), "For bob");

    let mut options = AggregateOptions::new(BOT);
    options.question_author = Some("alice".to_string());
    let registry = aggregate_thread(&platform, &options).await;

    assert!(registry.get("bob").is_none());
    assert_eq!(registry.get("alice").unwrap().replies_received, 1);
    // Only the reply under alice's question is counted.
    assert_eq!(registry.get("carol").unwrap().num_replies(), 1);
}

#[tokio::test]
async fn answer_filter_restricts_repliers() {
    let platform = MockPlatform::new("abc123");
    let q = platform.add_top_level(Some("alice"), "Open question");
    platform.add_reply(&q, Some("bob"), "Bob answers");
    platform.add_reply(&q, Some("carol"), "Carol answers");

    let mut options = AggregateOptions::new(BOT);
    options.answer_author = Some("carol".to_string());
    let registry = aggregate_thread(&platform, &options).await;

    assert!(registry.get("bob").is_none());
    assert_eq!(registry.get("carol").unwrap().num_replies(), 1);
    assert_eq!(registry.get("alice").unwrap().replies_received, 1);
    assert_eq!(registry.get("alice").unwrap().questions[0].reply_count, 1);
}

#[tokio::test]
async fn registry_keeps_discovery_order() {
    let platform = MockPlatform::new("abc123");
    let q1 = platform.add_top_level(Some("zed"), "Zed asks first");
    platform.add_top_level(Some("amy"), "Amy asks second");
    platform.add_reply(&q1, Some("bea"), "Bea replies");

    let registry = aggregate_thread(&platform, &AggregateOptions::new(BOT)).await;

    let names: Vec<&str> = registry.iter().map(|u| u.name.as_str()).collect();
    // Askers in fetch order, then repliers in discovery order.
    assert_eq!(names, ["zed", "amy", "bea"]);
}
