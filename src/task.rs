use crate::aggregator::{aggregate, AggregateOptions};
use crate::config::{BotConfig, Mode};
use crate::platform::PlatformClient;
use crate::publisher::{publish, PublishOutcome};
use crate::report::ReportBuilder;
use crate::scheduler::every;
use crate::types::{Result, TargetSpec};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Result of one complete fetch, aggregate, report, publish cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Print mode: the rendered report text.
    Printed(String),
    /// Post mode: what happened to the summary comment.
    Published(PublishOutcome),
}

/// Runs one tick of the pipeline against a single target thread.
pub async fn run_tick(
    client: &dyn PlatformClient,
    target: &TargetSpec,
    config: &BotConfig,
) -> Result<TickOutcome> {
    let thread = client.find_thread(target).await?;
    info!(thread = %thread.id, title = %thread.title, "scanning thread");

    let top_level = client.top_level_comments(&thread).await?;
    let mut options = AggregateOptions::new(&config.username);
    options.question_author = config.question_username.clone();
    options.answer_author = config.answer_username.clone();
    let registry = aggregate(client, &thread, &top_level, &options).await?;
    info!(users = registry.len(), "aggregated thread");

    if config.print_questions {
        for user in registry.iter().filter(|u| !u.questions.is_empty()) {
            println!("{}", user);
        }
    }
    if config.print_answers {
        for user in registry.iter().filter(|u| !u.replies.is_empty()) {
            println!("{}", user);
        }
    }

    let report = ReportBuilder::new(config.reply_threshold).build(&registry);
    let body = report.render();

    match config.mode {
        Mode::Print => {
            println!("{}", body);
            Ok(TickOutcome::Printed(body))
        }
        Mode::Post => {
            let outcome = publish(
                client,
                &thread,
                &top_level,
                &body,
                &config.username,
                config.comment_mode,
            )
            .await?;
            Ok(TickOutcome::Published(outcome))
        }
    }
}

/// One-shot mode: each configured target is scanned once, in order, and
/// the first failure propagates to the caller.
pub async fn run_once(client: &dyn PlatformClient, config: &BotConfig) -> Result<()> {
    for target in &config.posts.0 {
        run_tick(client, target, config).await?;
    }
    Ok(())
}

/// Scans one target forever: an immediate first tick, then the fixed
/// cadence with skip semantics. Tick failures are logged and the loop
/// keeps going.
pub async fn run_target_forever(
    client: Arc<dyn PlatformClient>,
    target: TargetSpec,
    config: Arc<BotConfig>,
) {
    let label = target.describe();
    if let Err(err) = run_tick(client.as_ref(), &target, &config).await {
        error!(target = %label, error = %err, "initial scan failed, continuing on schedule");
    }
    let interval = Duration::from_secs(config.interval);
    every(interval, move || {
        let client = client.clone();
        let target = target.clone();
        let config = config.clone();
        async move {
            run_tick(client.as_ref(), &target, &config)
                .await
                .map(|_| ())
                .map_err(anyhow::Error::from)
        }
    })
    .await;
}

/// Starts one independent scan loop per configured target and supervises
/// them. A worker that panics or aborts is logged without taking its
/// siblings down.
pub async fn run_all(client: Arc<dyn PlatformClient>, config: Arc<BotConfig>) {
    let mut workers = Vec::new();
    for target in config.posts.0.clone() {
        let label = target.describe();
        info!(target = %label, interval = config.interval, "starting scan loop");
        let handle = tokio::spawn(run_target_forever(client.clone(), target, config.clone()));
        workers.push((label, handle));
    }
    for (label, handle) in workers {
        if let Err(err) = handle.await {
            error!(target = %label, error = %err, "scan loop terminated unexpectedly");
        }
    }
}
